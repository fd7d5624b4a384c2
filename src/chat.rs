//! Audience chat session: transcript, offline knowledge base, feedback.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::board::question::{
    ChatMessage, MessageKind, Question, FEEDBACK_CATEGORY, FEEDBACK_REPLIES,
    NEW_QUESTION_CATEGORY, NEW_QUESTION_REPLIES,
};
use crate::db::Database;

/// Transcript length cap. Oldest messages are evicted first.
pub const TRANSCRIPT_CAP: usize = 50;

/// Simulated thinking delay before an offline reply appears.
pub const OFFLINE_REPLY_DELAY: Duration = Duration::from_millis(1500);

/// Reply sent when a question is queued for the speaker.
pub const HANDOFF_REPLY: &str = "收到您的問題！AI 知識庫暫無解答，已將問題傳送給講者，請稍候。";

/// Shown when a remote submission fails.
pub const SUBMIT_FAILED: &str = "⚠️ 連線失敗，請稍後再試。";

const FEEDBACK_ACK_POSITIVE: &str = "感謝您的回饋！";
const FEEDBACK_ACK_NEGATIVE: &str = "已收到回饋，此問題已轉送給講者。";

/// Canned offline answers, matched by substring against the question text.
const OFFLINE_ANSWERS: [(&[&str], &str); 2] = [
    (&["你好", "嗨"], "你好！有什麼我可以幫你的嗎？"),
    (
        &["投影片", "簡報"],
        "關於簡報檔案，講者稍後會提供下載連結喔！",
    ),
];

/// What the offline knowledge base decided for a submitted question.
#[derive(Debug, Clone, PartialEq)]
pub enum OfflineOutcome {
    /// A canned answer matched.
    Answered(&'static str),
    /// Nothing matched. The reply acknowledges the handoff and the question
    /// goes on the board for the speaker.
    HandedOff {
        reply: &'static str,
        question: Question,
    },
}

/// Decide the offline reply for a question text.
pub fn evaluate_offline(text: &str) -> OfflineOutcome {
    for (keywords, answer) in OFFLINE_ANSWERS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return OfflineOutcome::Answered(answer);
        }
    }
    let question =
        Question::new(text, NEW_QUESTION_CATEGORY).with_replies(&NEW_QUESTION_REPLIES);
    OfflineOutcome::HandedOff {
        reply: HANDOFF_REPLY,
        question,
    }
}

/// Owns the chat transcript and the submission generation counter.
///
/// The counter stamps every submission; replies arriving with a stale
/// generation are discarded, so a reply from an abandoned submission can
/// never land in the transcript after a newer one.
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    db: Arc<Database>,
    next_generation: u64,
    awaiting: Option<u64>,
}

impl ChatSession {
    pub fn load(db: Arc<Database>) -> Result<Self> {
        let transcript = db.load_transcript()?;
        Ok(Self {
            transcript,
            db,
            next_generation: 0,
            awaiting: None,
        })
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// True while a submission is in flight.
    pub fn awaiting_reply(&self) -> bool {
        self.awaiting.is_some()
    }

    /// Record the user's message and start a new submission. Returns the
    /// generation the eventual reply must carry.
    pub fn begin_submission(&mut self, text: &str) -> Result<u64> {
        self.push(ChatMessage::user(text))?;
        self.next_generation += 1;
        self.awaiting = Some(self.next_generation);
        Ok(self.next_generation)
    }

    /// Accept or discard a reply for `generation`. Returns false when the
    /// reply is stale and must be dropped.
    pub fn finish_submission(&mut self, generation: u64) -> bool {
        if self.awaiting == Some(generation) {
            self.awaiting = None;
            true
        } else {
            false
        }
    }

    pub fn push_system(&mut self, text: impl Into<String>, show_feedback: bool) -> Result<()> {
        self.push(ChatMessage::system(text, show_feedback))
    }

    /// Record feedback on the transcript message at `index`.
    ///
    /// The feedback prompt on that message is retired, an acknowledgement is
    /// appended, and for negative feedback the user question that preceded
    /// the reply is escalated to the speaker. Returns the question to put on
    /// the board, if any. Out-of-range or non-feedback indices are ignored.
    pub fn record_feedback(&mut self, index: usize, helpful: bool) -> Result<Option<Question>> {
        let Some(message) = self.transcript.get_mut(index) else {
            return Ok(None);
        };
        if !message.show_feedback {
            return Ok(None);
        }
        message.show_feedback = false;

        if helpful {
            self.push_system(FEEDBACK_ACK_POSITIVE, false)?;
            return Ok(None);
        }

        // The nearest user message before the rated reply is the question
        // the audience member found unanswered.
        let source = self.transcript[..index]
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::User)
            .map(|m| m.text.clone())
            .unwrap_or_else(|| "（未知問題）".to_string());

        self.push_system(FEEDBACK_ACK_NEGATIVE, false)?;

        let question =
            Question::new(source, FEEDBACK_CATEGORY).with_replies(&FEEDBACK_REPLIES);
        Ok(Some(question))
    }

    /// Wipe the transcript and cancel any in-flight submission.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.awaiting = None;
    }

    fn push(&mut self, message: ChatMessage) -> Result<()> {
        self.transcript.push(message);
        while self.transcript.len() > TRANSCRIPT_CAP {
            self.transcript.remove(0);
        }
        self.db.save_transcript(&self.transcript)?;
        Ok(())
    }
}
