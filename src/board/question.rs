//! Core data types for audience questions and the chat transcript.

use chrono::{Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned to questions the remote service hands back without one.
pub const DEFAULT_CATEGORY: &str = "未分類";

/// Category for questions raised locally when no canned answer matched.
pub const NEW_QUESTION_CATEGORY: &str = "未分類 (新提問)";

/// Category for questions escalated from negative feedback on a reply.
pub const FEEDBACK_CATEGORY: &str = "待解疑問 (回饋轉送)";

/// Suggested replies attached to a freshly handed-off question.
pub const NEW_QUESTION_REPLIES: [&str; 3] =
    ["稍後回答", "請參考補充資料", "這是一個很好的問題"];

/// Suggested replies attached to a feedback-escalated question.
pub const FEEDBACK_REPLIES: [&str; 3] =
    ["好的，我們會再補充說明", "請參考這份文件", "這個觀點很有趣"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Pending,
    Resolved,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Pending => "pending",
            QuestionStatus::Resolved => "resolved",
        }
    }
}

/// One audience question as stored and exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub timestamp: String,
    #[serde(default)]
    pub status: QuestionStatus,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub suggested_replies: Vec<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Question {
    /// Builds a new pending question stamped with the current time.
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Question {
            id: Utc::now().timestamp_millis().to_string(),
            text: text.into(),
            category: category.into(),
            timestamp: now_timestamp(),
            status: QuestionStatus::Pending,
            is_hidden: false,
            suggested_replies: Vec::new(),
        }
    }

    pub fn with_replies(mut self, replies: &[&str]) -> Self {
        self.suggested_replies = replies.iter().map(|r| r.to_string()).collect();
        self
    }
}

/// ISO-8601 UTC timestamp with millisecond precision. Lexicographic order
/// matches chronological order, which the views rely on for sorting.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Starter questions shown on a brand-new board so the dashboard is not empty.
pub fn seed_questions() -> Vec<Question> {
    let hour_ago = (Utc::now() - Duration::hours(1))
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut later = Question::new("請問這份簡報之後會提供下載嗎？", "行政相關").with_replies(&[
        "會的，會後將統一寄發 Email。",
        "簡報連結已置於活動官網。",
        "主要內容會釋出，部分敏顯資料會移除。",
    ]);
    later.id = "1".to_string();
    let mut earlier = Question::new("可以詳細解釋一下 n8n 的 webhook 設定嗎？", "技術細節")
        .with_replies(&[
            "好的，我們稍後的 Demo 環節會詳細示範。",
            "這是個好問題，我們可以會後交流。",
            "請參考官方文件關於 Webhook 的章節。",
        ]);
    earlier.id = "2".to_string();
    earlier.timestamp = hour_ago;
    vec![later, earlier]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    System,
}

/// One line of the audience chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(rename = "showFeedback", default)]
    pub show_feedback: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        ChatMessage {
            text: text.into(),
            kind: MessageKind::User,
            show_feedback: false,
        }
    }

    pub fn system(text: impl Into<String>, show_feedback: bool) -> Self {
        ChatMessage {
            text: text.into(),
            kind: MessageKind::System,
            show_feedback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_serializes_with_camel_case_fields() {
        let q = Question::new("test", "未分類");
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("isHidden").is_some());
        assert!(json.get("suggestedReplies").is_some());
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn question_deserializes_with_missing_optional_fields() {
        let json = r#"{"id":"1","text":"hi","timestamp":"2026-01-01T00:00:00.000Z"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.category, DEFAULT_CATEGORY);
        assert_eq!(q.status, QuestionStatus::Pending);
        assert!(!q.is_hidden);
        assert!(q.suggested_replies.is_empty());
    }

    #[test]
    fn chat_message_uses_wire_field_names() {
        let m = ChatMessage::system("收到", true);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["showFeedback"], true);
    }

    #[test]
    fn seed_questions_are_ordered_newest_first_by_timestamp() {
        let seeds = seed_questions();
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].timestamp > seeds[1].timestamp);
        assert_eq!(seeds[0].suggested_replies.len(), 3);
    }

    #[test]
    fn seed_questions_match_demo_fixtures() {
        let seeds = seed_questions();
        assert_eq!(seeds[0].id, "1");
        assert_eq!(seeds[0].text, "請問這份簡報之後會提供下載嗎？");
        assert_eq!(seeds[0].category, "行政相關");
        assert_eq!(seeds[0].suggested_replies[0], "會的，會後將統一寄發 Email。");
        assert_eq!(seeds[1].id, "2");
        assert_eq!(seeds[1].text, "可以詳細解釋一下 n8n 的 webhook 設定嗎？");
        assert_eq!(seeds[1].category, "技術細節");
        assert_eq!(
            seeds[1].suggested_replies,
            vec![
                "好的，我們稍後的 Demo 環節會詳細示範。",
                "這是個好問題，我們可以會後交流。",
                "請參考官方文件關於 Webhook 的章節。",
            ]
        );
    }
}
