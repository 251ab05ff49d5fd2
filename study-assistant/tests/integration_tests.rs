// Integration tests for the Bons.ai study assistant.
//
// These tests drive the application event loop end-to-end through the
// library crate's public API, the same way the TUI does: user commands go in,
// snapshots come out. The offline tutor stands in for the study API.

use std::sync::Arc;
use std::time::Duration;

use study_assistant::api::offline::{DEMO_PASSWORD, DEMO_USERNAME};
use study_assistant::api::Backend;
use study_assistant::app::{self, AppState};
use study_assistant::auth::{AuthField, AuthMode};
use study_assistant::chat::{ChatPhase, Feedback, Speaker};
use study_assistant::config::{parse_config, Config};
use study_assistant::protocol::{AppSnapshot, InputEdit, UiUpdate, UserCommand};
use study_assistant::router::Route;
use study_assistant::session::{SessionStore, TOKEN_KEY};
use study_assistant::storage::{KeyValueStore, MemoryStore, SqliteStore};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ===========================================================================
// Test helpers
// ===========================================================================

const WAIT: Duration = Duration::from_secs(5);

/// A running application loop with the channels the TUI would hold.
struct Running {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Running {
    fn start(sessions: SessionStore) -> Self {
        let (api_tx, api_rx) = mpsc::channel(app::API_CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (ui_tx, ui_rx) = mpsc::channel(256);
        let state = AppState::new(Config::default(), sessions, Backend::offline(), api_tx);
        let handle = tokio::spawn(app::run(api_rx, cmd_rx, ui_tx, state));
        Running {
            cmd_tx,
            ui_rx,
            handle,
        }
    }

    async fn send(&self, cmd: UserCommand) {
        self.cmd_tx.send(cmd).await.unwrap();
    }

    async fn next_snapshot(&mut self) -> AppSnapshot {
        let update = tokio::time::timeout(WAIT, self.ui_rx.recv())
            .await
            .expect("timed out waiting for a snapshot")
            .expect("UI channel closed");
        let UiUpdate::Snapshot(snapshot) = update;
        *snapshot
    }

    /// Skip snapshots until one satisfies `pred`.
    async fn wait_for(&mut self, pred: impl Fn(&AppSnapshot) -> bool) -> AppSnapshot {
        loop {
            let snapshot = self.next_snapshot().await;
            if pred(&snapshot) {
                return snapshot;
            }
        }
    }

    async fn type_auth(&self, field: AuthField, text: &str) {
        for c in text.chars() {
            self.send(UserCommand::EditAuth(field, InputEdit::Insert(c)))
                .await;
        }
    }

    async fn type_chat(&self, text: &str) {
        for c in text.chars() {
            self.send(UserCommand::EditChat(InputEdit::Insert(c))).await;
        }
    }

    async fn type_scoreboard(&self, text: &str) {
        for c in text.chars() {
            self.send(UserCommand::EditScoreboard(InputEdit::Insert(c)))
                .await;
        }
    }

    async fn quit(self) {
        self.send(UserCommand::Quit).await;
        tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("app loop did not stop")
            .unwrap()
            .unwrap();
    }
}

fn memory_sessions() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStore::new()))
}

fn temp_db(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("bonsai-it-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("storage.db")
}

/// Sign in with the demo account and wait for the home screen.
async fn sign_in(app: &mut Running) -> AppSnapshot {
    app.send(UserCommand::Navigate("/login".into())).await;
    app.type_auth(AuthField::Username, DEMO_USERNAME).await;
    app.type_auth(AuthField::Password, DEMO_PASSWORD).await;
    app.send(UserCommand::SubmitAuth).await;
    app.wait_for(|s| s.route == Route::Home).await
}

// ===========================================================================
// Routing and authentication
// ===========================================================================

#[tokio::test]
async fn signed_out_user_is_sent_to_login() {
    let mut app = Running::start(memory_sessions());
    let first = app.next_snapshot().await;
    assert_eq!(first.route, Route::Welcome);
    assert!(!first.online);

    app.send(UserCommand::Navigate("/home".into())).await;
    let snapshot = app.next_snapshot().await;
    assert_eq!(snapshot.route, Route::Login);

    app.send(UserCommand::Navigate("/scoreboard".into())).await;
    let snapshot = app.next_snapshot().await;
    assert_eq!(snapshot.route, Route::Login);

    app.quit().await;
}

#[tokio::test]
async fn demo_login_reaches_home() {
    let mut app = Running::start(memory_sessions());
    let home = sign_in(&mut app).await;
    assert!(home.session.is_authenticated());
    assert_eq!(home.session.display_name, DEMO_USERNAME);
    assert!(!home.auth.is_submitting());
    app.quit().await;
}

#[tokio::test]
async fn wrong_password_stays_on_login_with_error() {
    let mut app = Running::start(memory_sessions());
    app.send(UserCommand::Navigate("/login".into())).await;
    app.type_auth(AuthField::Username, DEMO_USERNAME).await;
    app.type_auth(AuthField::Password, "not-the-one").await;
    app.send(UserCommand::SubmitAuth).await;

    let snapshot = app.wait_for(|s| s.auth.error().is_some()).await;
    assert_eq!(snapshot.route, Route::Login);
    assert!(snapshot.auth.error().unwrap().contains(DEMO_USERNAME));
    assert!(!snapshot.session.is_authenticated());
    app.quit().await;
}

#[tokio::test]
async fn signup_signs_in_new_user() {
    let mut app = Running::start(memory_sessions());
    app.send(UserCommand::Navigate("/signin".into())).await;
    app.send(UserCommand::ToggleAuthMode).await;
    app.type_auth(AuthField::Username, "newbie").await;
    app.type_auth(AuthField::Password, "password123").await;
    app.type_auth(AuthField::ConfirmPassword, "password123").await;
    app.type_auth(AuthField::Grade, "11").await;

    let form = app
        .wait_for(|s| s.auth.grade == "11" && s.auth.mode == AuthMode::Signup)
        .await;
    assert_eq!(form.route, Route::Login);

    app.send(UserCommand::SubmitAuth).await;
    let home = app.wait_for(|s| s.route == Route::Home).await;
    assert_eq!(home.session.display_name, "newbie");
    app.quit().await;
}

#[tokio::test]
async fn logout_returns_to_welcome_and_locks_home() {
    let mut app = Running::start(memory_sessions());
    sign_in(&mut app).await;

    app.send(UserCommand::Logout).await;
    let snapshot = app.wait_for(|s| s.route == Route::Welcome).await;
    assert!(!snapshot.session.is_authenticated());

    app.send(UserCommand::Navigate("/home".into())).await;
    let snapshot = app.next_snapshot().await;
    assert_eq!(snapshot.route, Route::Login);
    app.quit().await;
}

// ===========================================================================
// Chat
// ===========================================================================

#[tokio::test]
async fn offline_tutor_asks_and_explains() {
    let mut app = Running::start(memory_sessions());
    sign_in(&mut app).await;

    app.type_chat("algebra").await;
    app.send(UserCommand::SendMessage).await;
    let asked = app
        .wait_for(|s| s.chat.phase() == ChatPhase::Answering)
        .await;
    assert_eq!(asked.chat.topic(), Some("algebra"));
    assert!(asked
        .chat
        .current_question()
        .unwrap()
        .starts_with("Here's a question about algebra:"));

    app.send(UserCommand::ToggleHint).await;
    let hinted = app.wait_for(|s| s.chat.hint().is_some()).await;
    assert!(hinted.chat.hint().unwrap().starts_with("Detailed explanation for:"));

    app.type_chat("x = 1").await;
    app.send(UserCommand::SendMessage).await;
    let evaluated = app
        .wait_for(|s| s.chat.phase() == ChatPhase::Evaluated)
        .await;
    assert_eq!(evaluated.chat.feedback(), Some(Feedback::Unscored));
    let transcript = evaluated.chat.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[2].speaker, Speaker::User);
    assert_eq!(transcript[2].text, "x = 1");
    assert!(transcript[3].text.contains("quadratic formula"));
    assert!(evaluated.chat.can_request_new_question());

    app.send(UserCommand::NewQuestion).await;
    let next = app
        .wait_for(|s| s.chat.phase() == ChatPhase::Answering && s.chat.transcript().len() == 5)
        .await;
    assert_eq!(next.chat.feedback(), None);
    app.quit().await;
}

#[tokio::test]
async fn shift_subject_starts_over() {
    let mut app = Running::start(memory_sessions());
    sign_in(&mut app).await;

    app.type_chat("physics").await;
    app.send(UserCommand::SendMessage).await;
    app.wait_for(|s| s.chat.phase() == ChatPhase::Answering)
        .await;

    app.send(UserCommand::ShiftSubject).await;
    let reset = app.next_snapshot().await;
    assert_eq!(reset.chat.phase(), ChatPhase::Idle);
    assert!(reset.chat.transcript().is_empty());
    assert_eq!(reset.chat.topic(), None);
    app.quit().await;
}

// ===========================================================================
// Scoreboard
// ===========================================================================

#[tokio::test]
async fn offline_scoreboard_add_increment_reset() {
    let mut app = Running::start(memory_sessions());
    sign_in(&mut app).await;

    app.send(UserCommand::Navigate("/scoreboard".into())).await;
    let board = app.wait_for(|s| s.route == Route::Scoreboard).await;
    assert!(!board.scoreboard.is_busy());
    assert!(board.scoreboard.is_current_user(DEMO_USERNAME));
    assert_eq!(board.scoreboard.entries().len(), 4);

    app.type_scoreboard("Dana").await;
    app.send(UserCommand::AddUser).await;
    let added = app.wait_for(|s| s.scoreboard.contains("Dana")).await;
    assert!(added.scoreboard.input.is_empty());
    assert_eq!(added.scoreboard.notice, None);

    app.type_scoreboard("BOB").await;
    app.send(UserCommand::AddUser).await;
    let rejected = app.wait_for(|s| s.scoreboard.notice.is_some()).await;
    assert_eq!(
        rejected.scoreboard.notice.as_deref(),
        Some("That username already exists, please try something else!")
    );
    assert_eq!(rejected.scoreboard.entries().len(), 5);

    app.send(UserCommand::IncrementScore("Dana".into())).await;
    app.send(UserCommand::IncrementScore("Dana".into())).await;
    let ranked = app
        .wait_for(|s| s.scoreboard.ranked().first().is_some_and(|e| e.score == 2))
        .await;
    assert_eq!(ranked.scoreboard.ranked()[0].name, "Dana");

    app.send(UserCommand::ResetScores).await;
    let reset = app.next_snapshot().await;
    assert!(reset.scoreboard.entries().iter().all(|e| e.score == 0));

    app.send(UserCommand::RefreshScoreboard).await;
    let refreshed = app.next_snapshot().await;
    assert!(refreshed
        .scoreboard
        .notice
        .as_deref()
        .unwrap()
        .starts_with("Offline"));
    app.quit().await;
}

// ===========================================================================
// Persistence
// ===========================================================================

#[tokio::test]
async fn session_survives_restart_with_sqlite() {
    let path = temp_db("restart");
    let path_str = path.to_string_lossy().to_string();

    {
        let store = SqliteStore::open(&path_str).unwrap();
        let mut app = Running::start(SessionStore::new(Arc::new(store)));
        sign_in(&mut app).await;
        app.quit().await;
    }

    let store = SqliteStore::open(&path_str).unwrap();
    let mut app = Running::start(SessionStore::new(Arc::new(store)));
    let first = app.next_snapshot().await;
    assert!(first.session.is_authenticated());
    assert_eq!(first.session.display_name, DEMO_USERNAME);

    app.send(UserCommand::Navigate("/home".into())).await;
    let home = app.next_snapshot().await;
    assert_eq!(home.route, Route::Home);
    app.quit().await;
}

#[test]
fn cleared_session_is_gone_after_reopen() {
    let path = temp_db("clear");
    let path_str = path.to_string_lossy().to_string();

    let sessions = SessionStore::new(Arc::new(SqliteStore::open(&path_str).unwrap()));
    sessions.save("tok-1", "ann").unwrap();
    sessions.clear().unwrap();

    let store = SqliteStore::open(&path_str).unwrap();
    assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    assert!(!SessionStore::new(Arc::new(store)).load().is_authenticated());
}

// ===========================================================================
// Shipped configuration
// ===========================================================================

#[test]
fn shipped_defaults_parse_and_run_offline() {
    let text = std::fs::read_to_string("defaults/bonsai.toml")
        .expect("defaults/bonsai.toml should exist");
    let config = parse_config(&text).unwrap();
    assert!(!config.is_online());
    assert_eq!(config.auth.min_password_length, 8);
    assert_eq!(config.scoreboard.seed_names, vec!["Alice", "Bob", "Claude"]);
}
