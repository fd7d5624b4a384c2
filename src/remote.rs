// HTTP client for the webhook Q&A service, plus the offline fallback.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::board::question::{Question, DEFAULT_CATEGORY, NEW_QUESTION_REPLIES};
use crate::config::Config;
use crate::protocol::{AskRequest, AskResponse, PendingResponse, ResolveRequest};

/// Low-level client for the webhook API.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Submit a question and return the service's verdict.
    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let url = format!("{}/qa", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&AskRequest {
                question: question.to_string(),
            })
            .send()
            .await
            .context("ask request failed")?
            .error_for_status()
            .context("ask request rejected")?;

        response
            .json::<AskResponse>()
            .await
            .context("failed to parse ask response")
    }

    /// Fetch the server's full pending question list.
    pub async fn fetch_pending(&self) -> Result<Vec<Question>> {
        let url = format!("{}/qa/pending", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("pending request failed")?
            .error_for_status()
            .context("pending request rejected")?;

        let body = response
            .json::<PendingResponse>()
            .await
            .context("failed to parse pending response")?;
        debug!(count = body.questions.len(), "fetched pending questions");
        Ok(body.questions)
    }

    /// Tell the server a question was resolved. Fire-and-forget: resolution
    /// already happened locally, so a failed notification is only logged.
    pub async fn notify_resolved(&self, id: &str) {
        let url = format!("{}/qa/resolve", self.base_url);
        let result = self
            .http
            .post(&url)
            .json(&ResolveRequest { id: id.to_string() })
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(err) = result {
            warn!(id, "failed to notify server of resolution: {err}");
        }
    }
}

/// The question backend: either the webhook service or fully offline.
///
/// Callers match on the variant at the submission site so the offline path
/// never touches the network.
pub enum QaClient {
    Remote(RemoteClient),
    Offline,
}

impl QaClient {
    pub fn from_config(config: &Config) -> Self {
        if config.remote.enabled {
            QaClient::Remote(RemoteClient::new(config.remote.base_url.clone()))
        } else {
            QaClient::Offline
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, QaClient::Remote(_))
    }
}

/// Build the board entry for a question the service handed off.
///
/// Fields the service omitted get local fallbacks so a sparse response still
/// produces a complete question.
pub fn handoff_question(text: &str, response: &AskResponse) -> Question {
    let mut question = Question::new(
        text,
        response
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
    );
    if let Some(id) = &response.id {
        question.id = id.clone();
    }
    question.suggested_replies = if response.suggested_replies.is_empty() {
        NEW_QUESTION_REPLIES.iter().map(|s| s.to_string()).collect()
    } else {
        response.suggested_replies.clone()
    };
    question
}
