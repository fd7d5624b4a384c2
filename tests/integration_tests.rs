// Integration tests for the Q&A board.
//
// These tests exercise the full system end-to-end using the library crate's
// public API. They verify that the major subsystems (question store, chat
// session, offline knowledge base, persistence, CSV export, and the app
// event loop) work together correctly.

use std::path::PathBuf;
use std::sync::Arc;

use qa_board::app::{self, AppState};
use qa_board::board::question::{
    ChatMessage, MessageKind, Question, QuestionStatus, NEW_QUESTION_CATEGORY,
};
use qa_board::board::store::QuestionStore;
use qa_board::chat::{self, ChatSession, OfflineOutcome, TRANSCRIPT_CAP};
use qa_board::config::{Config, RemoteConfig, SpeakerConfig};
use qa_board::db::Database;
use qa_board::export;
use qa_board::protocol::{UiUpdate, UserCommand};
use qa_board::remote::QaClient;

use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

/// Unique temp path for file-backed database tests.
fn temp_db_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("qa_board_it_{name}.db"));
    let _ = std::fs::remove_file(&path);
    path
}

fn offline_config() -> Config {
    Config {
        remote: RemoteConfig {
            enabled: false,
            base_url: String::new(),
            poll_interval_secs: 10,
        },
        speaker: SpeakerConfig {
            password: "pw".into(),
        },
        db_path: ":memory:".into(),
    }
}

/// Channels the TUI side of a running app loop would hold.
struct LoopHandles {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    join: tokio::task::JoinHandle<anyhow::Result<()>>,
}

/// Spawn the full app event loop over an empty in-memory board.
fn spawn_offline_loop() -> LoopHandles {
    let db = Arc::new(Database::open(":memory:").unwrap());
    // Mark the board initialised so demo fixtures stay out of the way.
    db.save_questions(&[]).unwrap();
    let store = QuestionStore::load(Arc::clone(&db)).unwrap();
    let chat = ChatSession::load(db).unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (qa_tx, qa_rx) = mpsc::channel(16);
    let (sync_tx, sync_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(64);

    let config = offline_config();
    let client = Arc::new(QaClient::from_config(&config));
    let state = AppState::new(config, store, chat, client, qa_tx, sync_tx);

    let join = tokio::spawn(app::run(cmd_rx, qa_rx, sync_rx, ui_tx, state));
    LoopHandles {
        cmd_tx,
        ui_rx,
        join,
    }
}

/// Read snapshots until one satisfies the predicate, ignoring notices.
async fn await_snapshot<F>(
    ui_rx: &mut mpsc::Receiver<UiUpdate>,
    mut pred: F,
) -> qa_board::protocol::BoardSnapshot
where
    F: FnMut(&qa_board::protocol::BoardSnapshot) -> bool,
{
    loop {
        match ui_rx.recv().await.expect("ui channel closed") {
            UiUpdate::Snapshot(snapshot) if pred(&snapshot) => return *snapshot,
            _ => {}
        }
    }
}

// ===========================================================================
// App event loop, end to end
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn event_loop_answers_known_question_in_chat() {
    let mut h = spawn_offline_loop();

    h.cmd_tx
        .send(UserCommand::SubmitQuestion("投影片會提供嗎？".into()))
        .await
        .unwrap();

    // First the typing indicator, then the reply once the simulated
    // delay elapses (paused time auto-advances).
    let snapshot = await_snapshot(&mut h.ui_rx, |s| {
        !s.awaiting_reply && s.transcript.len() == 2
    })
    .await;

    assert_eq!(snapshot.transcript[0].kind, MessageKind::User);
    assert_eq!(snapshot.transcript[1].kind, MessageKind::System);
    assert!(snapshot.transcript[1].show_feedback);
    // A canned answer puts nothing on the public board.
    assert!(snapshot.public_board.is_empty());

    h.cmd_tx.send(UserCommand::Quit).await.unwrap();
    h.join.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn event_loop_hands_unknown_question_to_board() {
    let mut h = spawn_offline_loop();

    h.cmd_tx
        .send(UserCommand::SubmitQuestion("量子糾纏是什麼？".into()))
        .await
        .unwrap();

    let snapshot = await_snapshot(&mut h.ui_rx, |s| !s.public_board.is_empty()).await;

    assert_eq!(snapshot.public_board.len(), 1);
    assert_eq!(snapshot.public_board[0].text, "量子糾纏是什麼？");
    assert_eq!(snapshot.public_board[0].category, NEW_QUESTION_CATEGORY);
    assert_eq!(snapshot.public_board[0].status, QuestionStatus::Pending);
    // Handoff replies do not invite feedback.
    assert!(!snapshot.transcript[1].show_feedback);

    h.cmd_tx.send(UserCommand::Quit).await.unwrap();
    h.join.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn event_loop_triage_resolve_and_hide() {
    let mut h = spawn_offline_loop();

    h.cmd_tx
        .send(UserCommand::SubmitQuestion("第一個新問題".into()))
        .await
        .unwrap();
    let snapshot = await_snapshot(&mut h.ui_rx, |s| !s.questions.is_empty()).await;
    let id = snapshot.questions[0].id.clone();

    // Hide: drops off the public board, stays on the dashboard
    h.cmd_tx
        .send(UserCommand::ToggleHidden(id.clone()))
        .await
        .unwrap();
    let snapshot = await_snapshot(&mut h.ui_rx, |s| {
        s.questions.first().is_some_and(|q| q.is_hidden)
    })
    .await;
    assert!(snapshot.public_board.is_empty());
    assert_eq!(snapshot.questions.len(), 1);

    // Resolve: one-way transition
    h.cmd_tx.send(UserCommand::Resolve(id)).await.unwrap();
    let snapshot = await_snapshot(&mut h.ui_rx, |s| {
        s.questions
            .first()
            .is_some_and(|q| q.status == QuestionStatus::Resolved)
    })
    .await;
    assert!(snapshot.public_board.is_empty());

    h.cmd_tx.send(UserCommand::Quit).await.unwrap();
    h.join.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn event_loop_negative_feedback_escalates() {
    let mut h = spawn_offline_loop();

    h.cmd_tx
        .send(UserCommand::SubmitQuestion("投影片會提供嗎？".into()))
        .await
        .unwrap();
    await_snapshot(&mut h.ui_rx, |s| s.transcript.len() == 2).await;

    // The reply at index 1 still offers feedback; mark it unhelpful.
    h.cmd_tx
        .send(UserCommand::Feedback {
            message_index: 1,
            helpful: false,
        })
        .await
        .unwrap();

    let snapshot = await_snapshot(&mut h.ui_rx, |s| !s.questions.is_empty()).await;
    assert_eq!(snapshot.questions[0].text, "投影片會提供嗎？");
    // Escalations are flagged so the speaker can spot them.
    assert_eq!(snapshot.questions[0].category, "待解疑問 (回饋轉送)");

    h.cmd_tx.send(UserCommand::Quit).await.unwrap();
    h.join.await.unwrap().unwrap();
}

// ===========================================================================
// Persistence
// ===========================================================================

#[test]
fn board_state_survives_restart() {
    let path = temp_db_path("restart");
    let path_str = path.to_str().unwrap();

    {
        let db = Arc::new(Database::open(path_str).unwrap());
        db.save_questions(&[]).unwrap();
        let mut store = QuestionStore::load(Arc::clone(&db)).unwrap();
        let mut chat = ChatSession::load(db).unwrap();

        let mut q = Question::new("重啟後還在嗎？", "未分類");
        q.id = "persist-1".into();
        store.append(q).unwrap();
        store.resolve("persist-1").unwrap();
        chat.push_system("回覆", false).unwrap();
    }

    // Reopen: everything comes back from SQLite.
    let db = Arc::new(Database::open(path_str).unwrap());
    let store = QuestionStore::load(Arc::clone(&db)).unwrap();
    let chat = ChatSession::load(db).unwrap();

    let questions = store.questions();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, "persist-1");
    assert_eq!(questions[0].status, QuestionStatus::Resolved);
    assert_eq!(chat.transcript().len(), 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn demo_fixtures_seed_once_and_never_return() {
    let path = temp_db_path("seed_once");
    let path_str = path.to_str().unwrap();

    {
        let db = Arc::new(Database::open(path_str).unwrap());
        let mut store = QuestionStore::load(db).unwrap();
        // Fresh database: demo fixtures appear
        assert_eq!(store.questions().len(), 2);
        store.clear().unwrap();
        assert!(store.questions().is_empty());
    }

    // After a session reset the board is initialised-but-empty, so a
    // restart must not re-seed the fixtures.
    let db = Arc::new(Database::open(path_str).unwrap());
    let store = QuestionStore::load(db).unwrap();
    assert!(store.questions().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn transcript_is_capped_fifo() {
    let db = Arc::new(Database::open(":memory:").unwrap());
    let mut chat = ChatSession::load(db).unwrap();

    for i in 0..(TRANSCRIPT_CAP + 10) {
        chat.push_system(format!("msg {i}"), false).unwrap();
    }

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), TRANSCRIPT_CAP);
    assert_eq!(transcript[0].text, "msg 10");
    assert_eq!(transcript.last().unwrap().text, format!("msg {}", TRANSCRIPT_CAP + 9));
}

// ===========================================================================
// Offline knowledge base
// ===========================================================================

#[test]
fn offline_knowledge_base_matches_keywords() {
    match chat::evaluate_offline("請問投影片會公開嗎") {
        OfflineOutcome::Answered(_) => {}
        other => panic!("expected a canned answer, got {other:?}"),
    }

    match chat::evaluate_offline("完全沒有關鍵字的問題") {
        OfflineOutcome::HandedOff { question, .. } => {
            assert_eq!(question.category, NEW_QUESTION_CATEGORY);
            assert!(!question.suggested_replies.is_empty());
        }
        other => panic!("expected a handoff, got {other:?}"),
    }
}

// ===========================================================================
// CSV export
// ===========================================================================

#[test]
fn export_writes_dated_csv_with_bom() {
    let dir = std::env::temp_dir().join("qa_board_it_export");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();

    let mut hidden = Question::new("隱藏的", "未分類");
    hidden.is_hidden = true;
    let questions = vec![Question::new("看板問題", "技術細節"), hidden];

    let path = export::export_questions(&questions, &dir)
        .unwrap()
        .expect("non-empty board should export");
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("qa_session_"));

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF], "UTF-8 BOM expected");
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert!(text.starts_with("ID,Category,Question,Timestamp,Status,IsHidden"));
    assert!(text.contains("看板問題"));
    assert!(text.contains("Yes"));

    let _ = std::fs::remove_dir_all(&dir);
}

// ===========================================================================
// Sync semantics
// ===========================================================================

#[test]
fn server_snapshot_replaces_local_pending_view() {
    let db = Arc::new(Database::open(":memory:").unwrap());
    db.save_questions(&[]).unwrap();
    let mut store = QuestionStore::load(db).unwrap();

    let mut local = Question::new("只在本地", "未分類");
    local.id = "local-1".into();
    store.append(local).unwrap();

    let mut remote = Question::new("伺服器版本", "未分類");
    remote.id = "remote-1".into();
    store.replace_all(vec![remote]).unwrap();

    // The server is the source of truth: local-only entries are gone.
    let questions = store.questions();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, "remote-1");
}

// ===========================================================================
// Wire format
// ===========================================================================

#[test]
fn question_wire_format_round_trips_camel_case() {
    let mut q = Question::new("問題", "未分類").with_replies(&["稍後回答"]);
    q.is_hidden = true;
    let json = serde_json::to_string(&q).unwrap();
    assert!(json.contains("\"isHidden\":true"));
    assert!(json.contains("\"suggestedReplies\""));

    let back: Question = serde_json::from_str(&json).unwrap();
    assert_eq!(back.text, "問題");
    assert!(back.is_hidden);
}

#[test]
fn chat_message_wire_format_uses_type_field() {
    let msg = ChatMessage::system("回覆", true);
    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"type\":\"system\""));
    assert!(json.contains("\"showFeedback\":true"));
}
