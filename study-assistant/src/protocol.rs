// Messages exchanged between the TUI, the app orchestrator and spawned
// network tasks.
//
// TUI -> app:          UserCommand
// network task -> app: ApiEvent
// app -> TUI:          UiUpdate

use crate::api::{ApiError, FriendScore};
use crate::auth::{AuthField, AuthForm};
use crate::chat::{ChatReply, ChatState};
use crate::config::Config;
use crate::router::Route;
use crate::scoreboard::Scoreboard;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Text input
// ---------------------------------------------------------------------------

/// One edit to a single-line text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEdit {
    Insert(char),
    Backspace,
    Clear,
}

impl InputEdit {
    pub fn apply(&self, target: &mut String) {
        match self {
            InputEdit::Insert(c) => target.push(*c),
            InputEdit::Backspace => {
                target.pop();
            }
            InputEdit::Clear => target.clear(),
        }
    }
}

// ---------------------------------------------------------------------------
// TUI -> app
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Go to the screen for a path (see `Route::resolve`).
    Navigate(String),
    Logout,

    // Auth screen
    EditAuth(AuthField, InputEdit),
    ToggleAuthMode,
    TogglePasswordVisibility,
    SubmitAuth,

    // Chat screen
    EditChat(InputEdit),
    SendMessage,
    NewQuestion,
    ShiftSubject,
    ToggleHint,

    // Scoreboard screen
    EditScoreboard(InputEdit),
    AddUser,
    IncrementScore(String),
    ResetScores,
    RefreshScoreboard,

    Quit,
}

// ---------------------------------------------------------------------------
// Network task -> app
// ---------------------------------------------------------------------------

/// Completion of a spawned request, tagged with the generation of the
/// screen state that issued it.
#[derive(Debug)]
pub enum ApiEvent {
    Auth {
        generation: u64,
        result: Result<String, ApiError>,
    },
    Chat {
        generation: u64,
        result: Result<ChatReply, ApiError>,
    },
    FriendsLoaded {
        generation: u64,
        result: Result<Vec<FriendScore>, ApiError>,
    },
    FriendAdded {
        generation: u64,
        name: String,
        result: Result<(), ApiError>,
    },
}

// ---------------------------------------------------------------------------
// App -> TUI
// ---------------------------------------------------------------------------

/// Everything the TUI needs to draw a frame.
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    pub route: Route,
    pub session: Session,
    /// Whether a remote API is configured (false means offline tutor).
    pub online: bool,
    pub auth: AuthForm,
    pub chat: ChatState,
    pub scoreboard: Scoreboard,
}

impl AppSnapshot {
    /// Snapshot of a freshly started, signed-out app.
    pub fn initial(config: &Config) -> Self {
        let session = Session::default();
        AppSnapshot {
            route: Route::default(),
            scoreboard: Scoreboard::new(&session.display_name, &config.scoreboard.seed_names),
            session,
            online: config.is_online(),
            auth: AuthForm::new(&config.auth),
            chat: ChatState::new(&config.chat),
        }
    }
}

impl Default for AppSnapshot {
    fn default() -> Self {
        AppSnapshot::initial(&Config::default())
    }
}

#[derive(Debug, Clone)]
pub enum UiUpdate {
    Snapshot(Box<AppSnapshot>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_edits_apply() {
        let mut text = String::from("ab");
        InputEdit::Insert('c').apply(&mut text);
        assert_eq!(text, "abc");
        InputEdit::Backspace.apply(&mut text);
        assert_eq!(text, "ab");
        InputEdit::Clear.apply(&mut text);
        assert!(text.is_empty());
        InputEdit::Backspace.apply(&mut text);
        assert!(text.is_empty());
    }

    #[test]
    fn initial_snapshot_is_signed_out_on_welcome() {
        let snapshot = AppSnapshot::default();
        assert_eq!(snapshot.route, Route::Welcome);
        assert!(!snapshot.session.is_authenticated());
        assert!(!snapshot.online);
        assert_eq!(snapshot.scoreboard.entries().len(), 4);
    }
}
