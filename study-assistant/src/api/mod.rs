// Client interfaces for the study API.
//
// Screens talk to the backend only through `AuthClient`, `QuestionClient`
// and `FriendsClient`, so tests can swap in fakes and the app can run
// against the offline tutor when no API is configured.

pub mod http;
pub mod offline;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Username and password as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Everything the signup endpoint needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub credentials: Credentials,
    pub grade: Option<u8>,
}

/// Result of grading an answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Score out of 100, when the server produced a usable one.
    pub score: Option<f64>,
    /// Free-form explanation shown as the assistant's reply.
    pub explanation: Option<String>,
}

/// One row of the remote friends list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FriendScore {
    pub username: String,
    #[serde(default)]
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// One sentence suitable for showing in the UI.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status, body } => {
                let body = body.trim();
                if !body.is_empty() {
                    body.to_string()
                } else if *status == 401 {
                    "Invalid username or password.".to_string()
                } else {
                    format!("The server returned an error ({status}).")
                }
            }
            ApiError::Timeout => "The server took too long to respond.".to_string(),
            ApiError::Transport(_) | ApiError::InvalidResponse(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Client traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange credentials for a session token.
    async fn login(&self, credentials: &Credentials) -> Result<String, ApiError>;
    /// Create an account and return a session token for it.
    async fn signup(&self, request: &SignupRequest) -> Result<String, ApiError>;
}

#[async_trait]
pub trait QuestionClient: Send + Sync {
    /// Generate one question about `topic`.
    async fn generate_question(&self, topic: &str) -> Result<String, ApiError>;
    /// Grade `answer` against `question`.
    async fn evaluate(&self, question: &str, answer: &str) -> Result<Evaluation, ApiError>;
}

#[async_trait]
pub trait FriendsClient: Send + Sync {
    /// Friends of `user` with their scores.
    async fn list_friends(&self, user: &str) -> Result<Vec<FriendScore>, ApiError>;
    /// Record a friendship between `user` and `friend`.
    async fn add_friend(&self, user: &str, friend: &str) -> Result<(), ApiError>;
}

// ---------------------------------------------------------------------------
// Backend bundle
// ---------------------------------------------------------------------------

/// The set of clients the app uses, either all remote or all offline.
#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthClient>,
    pub questions: Arc<dyn QuestionClient>,
    /// `None` when running offline: the scoreboard stays local.
    pub friends: Option<Arc<dyn FriendsClient>>,
}

impl Backend {
    /// Build the backend from config: HTTP when `api.base_url` is set,
    /// otherwise the offline tutor.
    pub fn from_config(config: &Config, sessions: SessionStore) -> Result<Self, ApiError> {
        if config.is_online() {
            let api = Arc::new(http::HttpApi::new(
                &config.api.base_url,
                Duration::from_secs(config.api.timeout_secs),
                sessions,
            )?);
            Ok(Backend {
                auth: api.clone(),
                questions: api.clone(),
                friends: Some(api),
            })
        } else {
            Ok(Self::offline())
        }
    }

    pub fn offline() -> Self {
        let tutor = Arc::new(offline::OfflineTutor);
        Backend {
            auth: tutor.clone(),
            questions: tutor,
            friends: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.friends.is_some()
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

/// Extract `token` from a `{ "token": "..." }` body.
pub(crate) fn parse_token(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("token")?
        .as_str()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

/// Extract the question text from a `/gen` response.
///
/// The endpoint answers with plain text, but JSON bodies carrying
/// `question_latex` or `question` (or a bare JSON string) are accepted too.
pub(crate) fn parse_question(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ["question_latex", "question"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string),
        Ok(Value::String(s)) => Some(s.trim().to_string()).filter(|q| !q.is_empty()),
        _ => Some(trimmed.to_string()),
    }
}

/// Interpret an `/eval` response.
///
/// Accepts a bare number (`90.5`, optionally quoted) or `{"score": ...}`
/// with an optional `explanation`. Anything else becomes an unscored
/// explanation. Scores outside 0..=100 are dropped.
pub(crate) fn parse_evaluation(body: &str) -> Evaluation {
    let trimmed = body.trim();
    if let Some(score) = parse_score_text(trimmed) {
        return Evaluation {
            score: Some(score),
            explanation: None,
        };
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let score = map.get("score").and_then(|v| match v {
            Value::Number(n) => n.as_f64().filter(|s| (0.0..=100.0).contains(s)),
            Value::String(s) => parse_score_text(s),
            _ => None,
        });
        let explanation = map
            .get("explanation")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        return Evaluation { score, explanation };
    }
    Evaluation {
        score: None,
        explanation: Some(trimmed.to_string()).filter(|e| !e.is_empty()),
    }
}

fn parse_score_text(text: &str) -> Option<f64> {
    text.trim()
        .trim_matches('"')
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && (0.0..=100.0).contains(s))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
