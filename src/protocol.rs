//! Wire types for the webhook API and the internal message types that flow
//! between the app loop, the background tasks, and the terminal UI.

use serde::{Deserialize, Serialize};

use crate::board::question::{ChatMessage, Question, QuestionStatus};

// ---------------------------------------------------------------------------
// Webhook API wire types
// ---------------------------------------------------------------------------

/// Body of `POST {base}/qa`.
#[derive(Debug, Clone, Serialize)]
pub struct AskRequest {
    pub question: String,
}

/// Response to an ask. When `can_answer` is true the service answered
/// directly and `answer` carries the reply text. Otherwise the question was
/// handed off to the speaker and the optional fields describe the queued
/// question.
///
/// This endpoint speaks snake_case, unlike `Question`'s camelCase storage
/// format.
#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub can_answer: bool,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub suggested_replies: Vec<String>,
}

/// Response to `GET {base}/qa/pending`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingResponse {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Body of `POST {base}/qa/resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveRequest {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Internal events
// ---------------------------------------------------------------------------

/// Outcome of a question submission, produced by a background task. Each
/// carries the generation of the submission that spawned it so the app loop
/// can discard replies that arrive after a newer submission superseded them.
#[derive(Debug, Clone)]
pub enum QaEvent {
    /// The service (or offline matcher) answered directly.
    Answered { text: String, generation: u64 },
    /// No direct answer. The question was queued for the speaker.
    HandedOff {
        reply: String,
        question: Question,
        generation: u64,
    },
    /// The submission failed outright.
    Failed { message: String, generation: u64 },
}

impl QaEvent {
    pub fn generation(&self) -> u64 {
        match self {
            QaEvent::Answered { generation, .. }
            | QaEvent::HandedOff { generation, .. }
            | QaEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// Result of a background poll of the remote pending list.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Pending(Vec<Question>),
}

/// Commands from the UI to the app loop.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    SubmitQuestion(String),
    /// Feedback on the transcript message at `message_index`.
    Feedback { message_index: usize, helpful: bool },
    ToggleHidden(String),
    Resolve(String),
    Export,
    ClearAll,
    Quit,
}

/// Updates from the app loop to the UI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    Snapshot(Box<BoardSnapshot>),
    Notice(String),
}

/// Full render state pushed to the UI after every change.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    /// All questions, newest first.
    pub questions: Vec<Question>,
    /// Pending, non-hidden questions, newest first.
    pub public_board: Vec<Question>,
    pub transcript: Vec<ChatMessage>,
    /// True while a submission is in flight (typing indicator).
    pub awaiting_reply: bool,
    pub remote_enabled: bool,
}

impl BoardSnapshot {
    /// Questions matching `status`, for the dashboard's pending/resolved tabs.
    pub fn with_status(&self, status: QuestionStatus) -> Vec<&Question> {
        self.questions.iter().filter(|q| q.status == status).collect()
    }
}
