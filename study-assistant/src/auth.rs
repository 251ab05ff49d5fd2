// Login/signup form state machine.
//
// LoggedOut -> Submitting -> LoggedIn | Error
//
// Validation runs locally before any request is issued. Only one request may
// be outstanding; completions carry the generation that issued them so a
// reply arriving after the form was reset is dropped.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, Credentials, SignupRequest};
use crate::config::AuthConfig;
use crate::protocol::InputEdit;

/// Highest grade the signup endpoint accepts.
pub const MAX_GRADE: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedOut,
    Submitting,
    LoggedIn,
    Error(String),
}

/// Editable fields of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Username,
    Password,
    ConfirmPassword,
    Grade,
}

impl AuthField {
    /// Fields shown in `mode`, in focus order.
    pub fn visible(mode: AuthMode) -> &'static [AuthField] {
        match mode {
            AuthMode::Login => &[AuthField::Username, AuthField::Password],
            AuthMode::Signup => &[
                AuthField::Username,
                AuthField::Password,
                AuthField::ConfirmPassword,
                AuthField::Grade,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Username must be at most {max} characters")]
    UsernameTooLong { max: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Grade must be a whole number from 0 to 12")]
    InvalidGrade,
}

/// The request a valid submit produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Login(Credentials),
    Signup(SignupRequest),
}

impl AuthRequest {
    pub fn username(&self) -> &str {
        match self {
            AuthRequest::Login(c) => &c.username,
            AuthRequest::Signup(s) => &s.credentials.username,
        }
    }
}

/// What the app should do with a finished auth request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCompletion {
    /// The reply belongs to an abandoned submit.
    Stale,
    /// Persist the session and move on to the chat screen.
    LoggedIn { token: String, username: String },
    /// The error is already on the form.
    Failed,
}

/// State of the auth screen.
#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub grade: String,
    pub show_password: bool,
    pub status: AuthStatus,
    /// Identifies the latest submit. Bumped on submit and on reset.
    pub generation: u64,
    pending_username: Option<String>,
    min_password_length: usize,
    max_username_length: usize,
}

impl AuthForm {
    pub fn new(config: &AuthConfig) -> Self {
        AuthForm {
            mode: AuthMode::Login,
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            grade: String::new(),
            show_password: false,
            status: AuthStatus::LoggedOut,
            generation: 0,
            pending_username: None,
            min_password_length: config.min_password_length,
            max_username_length: config.max_username_length,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.status == AuthStatus::Submitting
    }

    /// The message currently shown above the form, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            AuthStatus::Error(msg) => Some(msg),
            _ => None,
        }
    }

    /// Apply a keystroke to `field`. Ignored while submitting and for
    /// signup-only fields in login mode.
    pub fn edit(&mut self, field: AuthField, edit: &InputEdit) {
        if self.is_submitting() || !AuthField::visible(self.mode).contains(&field) {
            return;
        }
        let target = match field {
            AuthField::Username => &mut self.username,
            AuthField::Password => &mut self.password,
            AuthField::ConfirmPassword => &mut self.confirm_password,
            AuthField::Grade => &mut self.grade,
        };
        edit.apply(target);
    }

    /// Switch between login and signup. Clears the error and the signup-only
    /// fields; username and password are kept.
    pub fn toggle_mode(&mut self) {
        if self.is_submitting() {
            return;
        }
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Signup,
            AuthMode::Signup => AuthMode::Login,
        };
        self.confirm_password.clear();
        self.grade.clear();
        if matches!(self.status, AuthStatus::Error(_)) {
            self.status = AuthStatus::LoggedOut;
        }
    }

    pub fn toggle_show_password(&mut self) {
        self.show_password = !self.show_password;
    }

    /// Check the form without touching state.
    pub fn validate(&self) -> Result<AuthRequest, AuthValidationError> {
        let username = self.username.trim();
        if username.is_empty() || self.password.is_empty() {
            return Err(AuthValidationError::MissingFields);
        }
        if self.password.chars().count() < self.min_password_length {
            return Err(AuthValidationError::PasswordTooShort {
                min: self.min_password_length,
            });
        }
        if username.chars().count() > self.max_username_length {
            return Err(AuthValidationError::UsernameTooLong {
                max: self.max_username_length,
            });
        }

        let credentials = Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        };

        match self.mode {
            AuthMode::Login => Ok(AuthRequest::Login(credentials)),
            AuthMode::Signup => {
                if self.password != self.confirm_password {
                    return Err(AuthValidationError::PasswordMismatch);
                }
                let grade = parse_grade(&self.grade)?;
                Ok(AuthRequest::Signup(SignupRequest { credentials, grade }))
            }
        }
    }

    /// Validate and, when valid, move to `Submitting`.
    ///
    /// Returns the request to issue together with its generation. Returns
    /// `None` when a request is already outstanding or validation failed (the
    /// validation message is then the form's error).
    pub fn submit(&mut self) -> Option<(u64, AuthRequest)> {
        if self.is_submitting() {
            return None;
        }
        match self.validate() {
            Ok(request) => {
                self.generation += 1;
                self.status = AuthStatus::Submitting;
                self.pending_username = Some(request.username().to_string());
                info!(
                    "Submitting {:?} for {} (gen: {})",
                    self.mode,
                    request.username(),
                    self.generation
                );
                Some((self.generation, request))
            }
            Err(e) => {
                self.status = AuthStatus::Error(e.to_string());
                None
            }
        }
    }

    /// Apply the outcome of the request issued with `generation`.
    pub fn complete(
        &mut self,
        generation: u64,
        result: Result<String, ApiError>,
    ) -> AuthCompletion {
        if generation != self.generation || !self.is_submitting() {
            return AuthCompletion::Stale;
        }
        let username = self.pending_username.take().unwrap_or_default();
        match result {
            Ok(token) => {
                self.status = AuthStatus::LoggedIn;
                self.password.clear();
                self.confirm_password.clear();
                AuthCompletion::LoggedIn { token, username }
            }
            Err(e) => {
                warn!("Auth request failed: {}", e);
                self.status = AuthStatus::Error(e.user_message());
                AuthCompletion::Failed
            }
        }
    }

    /// Put the form back to its initial state and abandon any outstanding
    /// request.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = AuthForm {
            generation,
            ..AuthForm::new(&AuthConfig {
                min_password_length: self.min_password_length,
                max_username_length: self.max_username_length,
            })
        };
    }
}

fn parse_grade(text: &str) -> Result<Option<u8>, AuthValidationError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<u8>() {
        Ok(grade) if grade <= MAX_GRADE => Ok(Some(grade)),
        _ => Err(AuthValidationError::InvalidGrade),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
