// Q&A board entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, restore questions and transcript
// 4. Create mpsc channels
// 5. Build the backend client (remote or offline)
// 6. Spawn app logic task
// 7. Run the TUI event loop until the user quits
// 8. Cleanup on exit

use std::sync::Arc;

use qa_board::app;
use qa_board::board::store::QuestionStore;
use qa_board::chat::ChatSession;
use qa_board::config;
use qa_board::db;
use qa_board::remote::QaClient;
use qa_board::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Q&A board starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: remote={}, poll every {}s",
        config.remote.enabled, config.remote.poll_interval_secs
    );

    // 3. Open database and restore persisted state
    let db = Arc::new(db::Database::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    let store = QuestionStore::load(Arc::clone(&db)).context("failed to load questions")?;
    let chat = ChatSession::load(Arc::clone(&db)).context("failed to load chat transcript")?;

    // 4. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (qa_tx, qa_rx) = mpsc::channel(256);
    let (sync_tx, sync_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 5. Build the backend client from config
    let client = Arc::new(QaClient::from_config(&config));
    match client.as_ref() {
        QaClient::Remote(_) => info!("Remote backend enabled"),
        QaClient::Offline => info!("Offline mode: canned replies only"),
    }

    let speaker_password = config.speaker.password.clone();
    let app_state = app::AppState::new(config, store, chat, client, qa_tx, sync_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, qa_rx, sync_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until user quits).
    // The TUI consumes ui_rx and sends commands through cmd_tx.
    if let Err(e) = tui::run(ui_rx, cmd_tx, speaker_password).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Q&A board shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("qa-board.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("qa_board=info,warn")),
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
