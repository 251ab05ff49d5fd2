// Bons.ai study assistant entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open the local store and read the session
// 4. Build the API backend (remote or offline tutor)
// 5. Create mpsc channels
// 6. Spawn app logic task, optionally opening the path given on the
//    command line
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::sync::Arc;

use study_assistant::api::Backend;
use study_assistant::app;
use study_assistant::config;
use study_assistant::session::SessionStore;
use study_assistant::storage::SqliteStore;
use study_assistant::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Bons.ai starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    if config.is_online() {
        info!("Using study API at {}", config.api.base_url);
    } else {
        info!("No API configured, using the offline tutor");
    }

    // 3. Open the local store
    let storage_path = config.storage_path();
    let store = SqliteStore::open(&storage_path.to_string_lossy())
        .with_context(|| format!("failed to open local storage at {}", storage_path.display()))?;
    info!("Local storage opened at {}", storage_path.display());
    let sessions = SessionStore::new(Arc::new(store));

    // 4. Build the backend
    let backend = Backend::from_config(&config, sessions.clone())
        .context("failed to build API client")?;

    // 5. Create mpsc channels
    let (api_tx, api_rx) = mpsc::channel(app::API_CHANNEL_CAPACITY);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let mut app_state = app::AppState::new(config, sessions, backend, api_tx);
    if app_state.session.is_authenticated() {
        info!("Resuming session for {}", app_state.session.display_name);
    }

    // 6. Spawn app logic task
    if let Some(path) = std::env::args().nth(1) {
        app_state.navigate(&path);
    }
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(api_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocks until the user quits)
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Bons.ai shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("bonsai.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("study_assistant=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
