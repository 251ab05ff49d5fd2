// Session store: the signed-in user's token and display name.
//
// Backed by a `KeyValueStore` so the session survives restarts. Reads never
// fail: storage errors are logged and treated as "no session".

use std::sync::Arc;

use tracing::{info, warn};

use crate::storage::KeyValueStore;

/// Storage key holding the opaque auth token.
pub const TOKEN_KEY: &str = "authToken";
/// Storage key holding the display name.
pub const USERNAME_KEY: &str = "username";
/// Display name shown when nobody is signed in.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// What `SessionStore::load` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// `None` when nobody is signed in.
    pub token: Option<String>,
    pub display_name: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session {
            token: None,
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

/// Reads and writes the session through an injected storage backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Persist `token` and `display_name`, overwriting whatever was there.
    /// Either both keys are written or neither is.
    pub fn save(&self, token: &str, display_name: &str) -> anyhow::Result<()> {
        self.backend
            .set_many(&[(TOKEN_KEY, token), (USERNAME_KEY, display_name)])?;
        info!("Session saved for {}", display_name);
        Ok(())
    }

    /// Load the stored session, or the signed-out placeholder.
    pub fn load(&self) -> Session {
        let token = match self.backend.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Failed to read session token: {:#}", e);
                None
            }
        };
        let display_name = match self.backend.get(USERNAME_KEY) {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => DEFAULT_DISPLAY_NAME.to_string(),
            Err(e) => {
                warn!("Failed to read session display name: {:#}", e);
                DEFAULT_DISPLAY_NAME.to_string()
            }
        };
        Session {
            token,
            display_name,
        }
    }

    /// Remove both session keys.
    pub fn clear(&self) -> anyhow::Result<()> {
        self.backend.remove(TOKEN_KEY)?;
        self.backend.remove(USERNAME_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
