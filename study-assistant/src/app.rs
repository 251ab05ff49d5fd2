// Application state and orchestration logic.
//
// The central event loop owns every screen's state. It applies user commands
// from the TUI, spawns network requests, applies their completions and pushes
// a full snapshot to the TUI after each event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::Backend;
use crate::auth::{AuthCompletion, AuthForm, AuthRequest, AuthStatus};
use crate::chat::{ChatReply, ChatRequest, ChatState};
use crate::config::Config;
use crate::protocol::{ApiEvent, AppSnapshot, UiUpdate, UserCommand};
use crate::router::Route;
use crate::scoreboard::Scoreboard;
use crate::session::{Session, SessionStore};

/// Capacity of the channel carrying request completions back to the loop.
pub const API_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub backend: Backend,
    pub route: Route,
    /// Session as read on the last screen mount.
    pub session: Session,
    pub auth: AuthForm,
    pub chat: ChatState,
    pub scoreboard: Scoreboard,
    /// Spawned request tasks report back through clones of this sender.
    pub api_tx: mpsc::Sender<ApiEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        sessions: SessionStore,
        backend: Backend,
        api_tx: mpsc::Sender<ApiEvent>,
    ) -> Self {
        let session = sessions.load();
        let auth = AuthForm::new(&config.auth);
        let chat = ChatState::new(&config.chat);
        let scoreboard = Scoreboard::new(&session.display_name, &config.scoreboard.seed_names);
        AppState {
            config,
            sessions,
            backend,
            route: Route::default(),
            session,
            auth,
            chat,
            scoreboard,
            api_tx,
        }
    }

    /// Build a snapshot of the current state for the TUI.
    pub fn build_snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            route: self.route,
            session: self.session.clone(),
            online: self.backend.is_online(),
            auth: self.auth.clone(),
            chat: self.chat.clone(),
            scoreboard: self.scoreboard.clone(),
        }
    }

    /// Go to the screen for `path`.
    pub fn navigate(&mut self, path: &str) {
        self.enter(Route::resolve(path));
    }

    /// Mount `route`. Screens that need a session check it here and send
    /// signed-out users to the login screen instead. Re-entering the current
    /// screen only re-checks the session.
    pub fn enter(&mut self, route: Route) {
        self.session = self.sessions.load();

        let route = match route {
            Route::Home | Route::Scoreboard if !self.session.is_authenticated() => {
                info!("{:?} requires a session, redirecting to login", route);
                Route::Login
            }
            other => other,
        };

        if route == self.route {
            return;
        }

        self.leave(self.route);
        info!("Navigating {} -> {}", self.route.path(), route.path());
        self.route = route;

        if route == Route::Scoreboard {
            self.scoreboard
                .reset(&self.session.display_name, &self.config.scoreboard.seed_names);
            self.refresh_scoreboard();
        }
    }

    /// Drop the transient state of the screen being left. Outstanding
    /// requests become stale.
    fn leave(&mut self, route: Route) {
        match route {
            Route::Login => self.auth.reset(),
            Route::Home => self.chat.shift_subject(),
            Route::Welcome | Route::Scoreboard => {}
        }
    }

    /// Clear the session and return to the welcome screen.
    pub fn logout(&mut self) {
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear session: {:#}", e);
        }
        self.leave(self.route);
        self.route = Route::Welcome;
        self.session = self.sessions.load();
        info!("Logged out");
    }

    // -----------------------------------------------------------------------
    // Request spawning
    // -----------------------------------------------------------------------

    fn spawn_auth(&self, generation: u64, request: AuthRequest) {
        let client = Arc::clone(&self.backend.auth);
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let result = match &request {
                AuthRequest::Login(credentials) => client.login(credentials).await,
                AuthRequest::Signup(signup) => client.signup(signup).await,
            };
            let _ = tx.send(ApiEvent::Auth { generation, result }).await;
        });
    }

    fn spawn_chat(&self, generation: u64, request: ChatRequest) {
        let client = Arc::clone(&self.backend.questions);
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let result = match request {
                ChatRequest::GenerateQuestion { topic } => client
                    .generate_question(&topic)
                    .await
                    .map(ChatReply::Question),
                ChatRequest::Evaluate { question, answer } => client
                    .evaluate(&question, &answer)
                    .await
                    .map(ChatReply::Evaluation),
            };
            let _ = tx.send(ApiEvent::Chat { generation, result }).await;
        });
    }

    /// Fetch the friends list when online. Skipped while another scoreboard
    /// request is outstanding.
    pub fn refresh_scoreboard(&mut self) {
        let Some(client) = self.backend.friends.clone() else {
            return;
        };
        let Some(generation) = self.scoreboard.begin_request() else {
            debug!("Scoreboard request already in flight");
            return;
        };
        let user = self.session.display_name.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let result = client.list_friends(&user).await;
            let _ = tx.send(ApiEvent::FriendsLoaded { generation, result }).await;
        });
    }

    /// Add the name in the scoreboard input box locally, then record the
    /// friendship remotely when online.
    fn add_user(&mut self) {
        if self.scoreboard.is_busy() {
            self.scoreboard.notice =
                Some("Still syncing with the server, try again in a moment.".into());
            return;
        }
        let Some(name) = self.scoreboard.add_from_input() else {
            return;
        };
        let Some(client) = self.backend.friends.clone() else {
            return;
        };
        let Some(generation) = self.scoreboard.begin_request() else {
            return;
        };
        let user = self.session.display_name.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let result = client.add_friend(&user, &name).await;
            let _ = tx
                .send(ApiEvent::FriendAdded {
                    generation,
                    name,
                    result,
                })
                .await;
        });
    }
}

// ---------------------------------------------------------------------------
// Event handlers
// ---------------------------------------------------------------------------

/// Apply one user command.
pub fn handle_user_command(state: &mut AppState, cmd: UserCommand) {
    match cmd {
        UserCommand::Navigate(path) => state.navigate(&path),
        UserCommand::Logout => state.logout(),

        UserCommand::EditAuth(field, edit) => state.auth.edit(field, &edit),
        UserCommand::ToggleAuthMode => state.auth.toggle_mode(),
        UserCommand::TogglePasswordVisibility => state.auth.toggle_show_password(),
        UserCommand::SubmitAuth => {
            if let Some((generation, request)) = state.auth.submit() {
                state.spawn_auth(generation, request);
            }
        }

        UserCommand::EditChat(edit) => state.chat.edit_input(&edit),
        UserCommand::SendMessage => {
            if let Some((generation, request)) = state.chat.send_input() {
                state.spawn_chat(generation, request);
            }
        }
        UserCommand::NewQuestion => {
            if let Some((generation, request)) = state.chat.request_new_question() {
                state.spawn_chat(generation, request);
            }
        }
        UserCommand::ShiftSubject => state.chat.shift_subject(),
        UserCommand::ToggleHint => {
            if state.chat.hint().is_some() {
                state.chat.hide_hint();
            } else if !state.chat.show_hint() {
                debug!("No question yet, nothing to hint at");
            }
        }

        UserCommand::EditScoreboard(edit) => state.scoreboard.edit_input(&edit),
        UserCommand::AddUser => state.add_user(),
        UserCommand::IncrementScore(name) => {
            if !state.scoreboard.increment_score(&name) {
                debug!("No scoreboard entry named {:?}", name);
            }
        }
        UserCommand::ResetScores => state.scoreboard.reset_scores(),
        UserCommand::RefreshScoreboard => {
            if state.backend.is_online() {
                state.refresh_scoreboard();
            } else {
                state.scoreboard.notice = Some("Offline: scores are kept on this device only.".into());
            }
        }

        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Apply one request completion. Stale completions are dropped.
pub fn handle_api_event(state: &mut AppState, event: ApiEvent) {
    match event {
        ApiEvent::Auth { generation, result } => match state.auth.complete(generation, result) {
            AuthCompletion::LoggedIn { token, username } => {
                if let Err(e) = state.sessions.save(&token, &username) {
                    warn!("Failed to persist session: {:#}", e);
                    state.auth.status =
                        AuthStatus::Error("Could not save your session. Please try again.".into());
                    return;
                }
                info!("{} signed in", username);
                state.enter(Route::Home);
            }
            AuthCompletion::Failed => {}
            AuthCompletion::Stale => {
                debug!("Discarding stale auth completion (gen: {})", generation);
            }
        },

        ApiEvent::Chat { generation, result } => {
            state.chat.apply_reply(generation, result);
        }

        ApiEvent::FriendsLoaded { generation, result } => {
            if !state.scoreboard.finish_request(generation) {
                debug!("Discarding stale friends list (gen: {})", generation);
                return;
            }
            match result {
                Ok(friends) => {
                    state.scoreboard.merge_remote(&friends);
                    state.scoreboard.notice = None;
                }
                Err(e) => {
                    warn!("Failed to load friends: {}", e);
                    state.scoreboard.notice =
                        Some(format!("Could not load scores: {}", e.user_message()));
                }
            }
        }

        ApiEvent::FriendAdded {
            generation,
            name,
            result,
        } => {
            if !state.scoreboard.finish_request(generation) {
                debug!("Discarding stale add-friend reply (gen: {})", generation);
                return;
            }
            match result {
                Ok(()) => info!("Saved {} as a friend", name),
                Err(e) => {
                    warn!("Failed to add friend {}: {}", name, e);
                    state.scoreboard.notice = Some(format!(
                        "{} was added here but not saved: {}",
                        name,
                        e.user_message()
                    ));
                }
            }
        }
    }
}

async fn push_snapshot(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let snapshot = state.build_snapshot();
    let _ = ui_tx.send(UiUpdate::Snapshot(Box::new(snapshot))).await;
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens on two channels using `tokio::select!`:
/// 1. Request completions from spawned network tasks
/// 2. User commands from the TUI
///
/// Pushes a snapshot through `ui_tx` after every handled event.
pub async fn run(
    mut api_rx: mpsc::Receiver<ApiEvent>,
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");
    push_snapshot(&state, &ui_tx).await;

    // When the API channel closes, stop polling it so select! never spins.
    let mut api_open = true;

    loop {
        tokio::select! {
            event = api_rx.recv(), if api_open => {
                match event {
                    Some(event) => handle_api_event(&mut state, event),
                    None => {
                        info!("API channel closed");
                        api_open = false;
                        continue;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => handle_user_command(&mut state, cmd),
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }

        push_snapshot(&state, &ui_tx).await;
    }

    info!("Application event loop exiting");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
