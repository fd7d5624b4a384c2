// Application state and orchestration logic.
//
// The central event loop that coordinates user commands from the TUI,
// submission outcomes from background tasks, and periodic sync results from
// the remote service. Maintains the complete application state and pushes
// snapshots to the TUI render loop.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::board::store::{dashboard_view, public_view, QuestionStore, StoreEvent};
use crate::chat::{self, ChatSession, OfflineOutcome};
use crate::config::Config;
use crate::export;
use crate::protocol::{AskResponse, BoardSnapshot, QaEvent, SyncEvent, UiUpdate, UserCommand};
use crate::remote::{handoff_question, QaClient};

/// Shown after a session reset completes.
const CLEAR_DONE: &str = "資料已清除，場次重置完成。";

/// Shown when export is requested with an empty board.
const EXPORT_EMPTY: &str = "目前沒有資料可匯出";

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// The complete application state.
pub struct AppState {
    pub config: Config,
    pub store: QuestionStore,
    pub chat: ChatSession,
    /// Question backend. Wrapped in Arc for sharing with spawned tasks.
    pub client: Arc<QaClient>,
    /// Sender for submission outcomes; spawned tasks use a clone of this
    /// sender to report back to the main event loop.
    pub qa_tx: mpsc::Sender<QaEvent>,
    /// Sender for poll results, cloned into the fetch tasks.
    pub sync_tx: mpsc::Sender<SyncEvent>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: QuestionStore,
        chat: ChatSession,
        client: Arc<QaClient>,
        qa_tx: mpsc::Sender<QaEvent>,
        sync_tx: mpsc::Sender<SyncEvent>,
    ) -> Self {
        AppState {
            config,
            store,
            chat,
            client,
            qa_tx,
            sync_tx,
        }
    }

    /// Build a `BoardSnapshot` from the current application state.
    pub fn build_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            questions: dashboard_view(self.store.questions()),
            public_board: public_view(self.store.questions()),
            transcript: self.chat.transcript().to_vec(),
            awaiting_reply: self.chat.awaiting_reply(),
            remote_enabled: self.client.is_remote(),
        }
    }

    /// Spawn the background task that answers one submission.
    ///
    /// The remote path asks the webhook service; the offline path evaluates
    /// the canned knowledge base and reports after a simulated thinking
    /// delay. Either way the outcome arrives as a `QaEvent` stamped with
    /// `generation`.
    fn spawn_submission(&self, text: String, generation: u64) {
        let tx = self.qa_tx.clone();
        let client = Arc::clone(&self.client);

        tokio::spawn(async move {
            let event = match client.as_ref() {
                QaClient::Remote(remote) => match remote.ask(&text).await {
                    Ok(resp) => remote_outcome(&text, &resp, generation),
                    Err(err) => {
                        warn!("ask request failed: {err:#}");
                        QaEvent::Failed {
                            message: chat::SUBMIT_FAILED.to_string(),
                            generation,
                        }
                    }
                },
                QaClient::Offline => {
                    tokio::time::sleep(chat::OFFLINE_REPLY_DELAY).await;
                    match chat::evaluate_offline(&text) {
                        OfflineOutcome::Answered(answer) => QaEvent::Answered {
                            text: answer.to_string(),
                            generation,
                        },
                        OfflineOutcome::HandedOff { reply, question } => QaEvent::HandedOff {
                            reply: reply.to_string(),
                            question,
                            generation,
                        },
                    }
                }
            };
            let _ = tx.send(event).await;
        });
    }
}

/// Map a service verdict to a submission outcome.
///
/// An answerable question becomes the answer text; anything else is handed
/// off to the board. Either way the chat reply prefers the service's own
/// wording and only falls back to the stock handoff message when the
/// response carries no answer text.
fn remote_outcome(text: &str, resp: &AskResponse, generation: u64) -> QaEvent {
    let reply = resp
        .answer
        .clone()
        .unwrap_or_else(|| chat::HANDOFF_REPLY.to_string());
    if resp.can_answer {
        QaEvent::Answered {
            text: reply,
            generation,
        }
    } else {
        QaEvent::HandedOff {
            reply,
            question: handoff_question(text, resp),
            generation,
        }
    }
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the main application event loop.
///
/// Listens with `tokio::select!` on:
/// 1. User commands from the TUI
/// 2. Submission outcomes from background tasks
/// 3. Poll results from sync fetch tasks
/// 4. Store change notifications
/// 5. The poll interval (remote mode only)
///
/// Pushes UI updates through `ui_tx` for the TUI render loop.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut qa_rx: mpsc::Receiver<QaEvent>,
    mut sync_rx: mpsc::Receiver<SyncEvent>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");

    let mut store_rx = state.store.subscribe();

    let mut poll_interval = tokio::time::interval(std::time::Duration::from_secs(
        state.config.remote.poll_interval_secs,
    ));
    // The first tick completes immediately; consume it so the first real
    // poll happens after one full interval.
    poll_interval.tick().await;

    // Initial snapshot so the TUI has something to render before the first
    // change.
    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Submission outcomes ---
            event = qa_rx.recv() => {
                match event {
                    Some(event) => handle_qa_event(&mut state, event, &ui_tx).await,
                    None => {
                        info!("QA channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Sync results ---
            sync = sync_rx.recv() => {
                match sync {
                    Some(SyncEvent::Pending(questions)) => {
                        if let Err(e) = state.store.replace_all(questions) {
                            warn!("failed to apply sync result: {e:#}");
                        }
                    }
                    None => {
                        info!("Sync channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Store change notifications ---
            change = store_rx.recv() => {
                match change {
                    Ok(StoreEvent::Changed) => {
                        let _ = ui_tx
                            .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
                            .await;
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        // Snapshots carry full state, so one fresh push
                        // covers everything that was missed.
                        debug!(missed, "store event receiver lagged");
                        let _ = ui_tx
                            .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
                            .await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Store event channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Periodic sync poll (remote mode only) ---
            _ = poll_interval.tick(), if state.client.is_remote() => {
                let client = Arc::clone(&state.client);
                let tx = state.sync_tx.clone();
                tokio::spawn(async move {
                    if let QaClient::Remote(remote) = client.as_ref() {
                        match remote.fetch_pending().await {
                            Ok(questions) => {
                                let _ = tx.send(SyncEvent::Pending(questions)).await;
                            }
                            // Polls fail silently; the next tick retries.
                            Err(err) => debug!("pending poll failed: {err:#}"),
                        }
                    }
                });
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Handle a user command from the TUI.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
) {
    match cmd {
        UserCommand::SubmitQuestion(text) => {
            let text = text.trim().to_string();
            if text.is_empty() {
                return;
            }
            match state.chat.begin_submission(&text) {
                Ok(generation) => {
                    debug!(generation, "question submitted");
                    state.spawn_submission(text, generation);
                }
                Err(e) => warn!("failed to record submission: {e:#}"),
            }
            // Chat-only change, no store event fires; push the snapshot so
            // the typing indicator shows immediately.
            let _ = ui_tx
                .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
                .await;
        }
        UserCommand::Feedback {
            message_index,
            helpful,
        } => {
            match state.chat.record_feedback(message_index, helpful) {
                Ok(Some(question)) => {
                    // The escalation appends to the store, whose change
                    // event pushes the snapshot.
                    if let Err(e) = state.store.append(question) {
                        warn!("failed to escalate feedback question: {e:#}");
                    }
                }
                Ok(None) => {
                    let _ = ui_tx
                        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
                        .await;
                }
                Err(e) => warn!("failed to record feedback: {e:#}"),
            }
        }
        UserCommand::ToggleHidden(id) => {
            let hidden = state
                .store
                .questions()
                .iter()
                .find(|q| q.id == id)
                .map(|q| q.is_hidden);
            let Some(hidden) = hidden else {
                debug!(id, "toggle hidden for unknown question, ignoring");
                return;
            };
            if let Err(e) = state.store.set_hidden(&id, !hidden) {
                warn!("failed to toggle visibility: {e:#}");
            }
        }
        UserCommand::Resolve(id) => {
            match state.store.resolve(&id) {
                Ok(true) => {
                    // Resolution already happened locally; the server
                    // notification is fire-and-forget.
                    if state.client.is_remote() {
                        let client = Arc::clone(&state.client);
                        tokio::spawn(async move {
                            if let QaClient::Remote(remote) = client.as_ref() {
                                remote.notify_resolved(&id).await;
                            }
                        });
                    }
                }
                Ok(false) => debug!(id, "resolve was a no-op"),
                Err(e) => warn!("failed to resolve question: {e:#}"),
            }
        }
        UserCommand::Export => {
            let notice = match export::export_questions(state.store.questions(), Path::new(".")) {
                Ok(Some(path)) => format!("已匯出至 {}", path.display()),
                Ok(None) => EXPORT_EMPTY.to_string(),
                Err(e) => {
                    warn!("export failed: {e:#}");
                    format!("匯出失敗：{e}")
                }
            };
            let _ = ui_tx.send(UiUpdate::Notice(notice)).await;
        }
        UserCommand::ClearAll => {
            if let Err(e) = state.store.clear() {
                warn!("failed to clear session: {e:#}");
                return;
            }
            state.chat.clear();
            info!("session cleared");
            let _ = ui_tx.send(UiUpdate::Notice(CLEAR_DONE.to_string())).await;
        }
        UserCommand::Quit => {
            // Handled in the main loop
        }
    }
}

/// Handle a submission outcome from a background task.
///
/// **Generation check**: every outcome carries the generation of the
/// submission that spawned it. Outcomes whose generation is not the one
/// currently awaited are stale (a newer submission superseded them) and are
/// silently discarded.
async fn handle_qa_event(state: &mut AppState, event: QaEvent, ui_tx: &mpsc::Sender<UiUpdate>) {
    if !state.chat.finish_submission(event.generation()) {
        debug!(
            generation = event.generation(),
            "discarding stale submission outcome"
        );
        return;
    }

    let result = match event {
        QaEvent::Answered { text, .. } => state.chat.push_system(text, true),
        QaEvent::HandedOff {
            reply, question, ..
        } => state
            .chat
            .push_system(reply, false)
            .and_then(|()| state.store.append(question)),
        QaEvent::Failed { message, .. } => {
            warn!("submission failed: {message}");
            state.chat.push_system(message, false)
        }
    };
    if let Err(e) = result {
        warn!("failed to record submission outcome: {e:#}");
    }

    let _ = ui_tx
        .send(UiUpdate::Snapshot(Box::new(state.build_snapshot())))
        .await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
