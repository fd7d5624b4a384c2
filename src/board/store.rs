//! The question store: single owner of the question list.
//!
//! Every mutation persists the full list to the database and then broadcasts
//! a change event, so interested parties subscribe instead of re-reading
//! storage. The views (`public_view`, `dashboard_view`) are pure functions
//! over the list and carry no state of their own.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::board::question::{seed_questions, Question, QuestionStatus};
use crate::db::Database;

/// Change notification emitted after every store mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Changed,
}

pub struct QuestionStore {
    questions: Vec<Question>,
    db: Arc<Database>,
    events: broadcast::Sender<StoreEvent>,
}

impl QuestionStore {
    /// Load the store from the database. A database that has never held a
    /// question list gets the starter questions; an explicitly empty list
    /// (e.g. after a session reset) stays empty.
    pub fn load(db: Arc<Database>) -> Result<Self> {
        let questions = match db.load_questions()? {
            Some(list) => list,
            None => {
                let seeds = seed_questions();
                db.save_questions(&seeds)?;
                info!("no stored questions, seeded {} starter questions", seeds.len());
                seeds
            }
        };

        let (events, _) = broadcast::channel(64);
        Ok(Self {
            questions,
            db,
            events,
        })
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Add a new question (local handoff or feedback escalation). Newest
    /// questions sit at the front, so storage order matches display order
    /// even for identical timestamps.
    pub fn append(&mut self, question: Question) -> Result<()> {
        debug!(id = %question.id, category = %question.category, "appending question");
        self.questions.insert(0, question);
        self.persist_and_notify()
    }

    /// Toggle or set visibility on the public board. Returns false when no
    /// question with that id exists.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> Result<bool> {
        let Some(q) = self.questions.iter_mut().find(|q| q.id == id) else {
            return Ok(false);
        };
        if q.is_hidden == hidden {
            return Ok(true);
        }
        q.is_hidden = hidden;
        self.persist_and_notify()?;
        Ok(true)
    }

    /// Mark a question resolved. Returns true only when the question existed
    /// and was still pending, so the caller knows whether a transition
    /// actually happened. Resolution is one-way.
    pub fn resolve(&mut self, id: &str) -> Result<bool> {
        let Some(q) = self.questions.iter_mut().find(|q| q.id == id) else {
            return Ok(false);
        };
        if q.status == QuestionStatus::Resolved {
            return Ok(false);
        }
        q.status = QuestionStatus::Resolved;
        info!(id = %id, "question resolved");
        self.persist_and_notify()?;
        Ok(true)
    }

    /// Replace the entire list with the server's pending set. Local-only
    /// questions not present in the incoming list are discarded; the server
    /// is the source of truth when syncing.
    pub fn replace_all(&mut self, questions: Vec<Question>) -> Result<()> {
        debug!(count = questions.len(), "replacing question list from sync");
        self.questions = questions;
        self.persist_and_notify()
    }

    /// Session reset: wipes the database (questions and transcript in one
    /// transaction) and drops every question in memory. The caller resets
    /// its own transcript copy.
    pub fn clear(&mut self) -> Result<()> {
        self.db.clear_all()?;
        self.questions.clear();
        let _ = self.events.send(StoreEvent::Changed);
        Ok(())
    }

    fn persist_and_notify(&self) -> Result<()> {
        self.db.save_questions(&self.questions)?;
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(StoreEvent::Changed);
        Ok(())
    }
}

/// Pending, non-hidden questions, newest first. What the audience sees.
pub fn public_view(questions: &[Question]) -> Vec<Question> {
    let mut view: Vec<Question> = questions
        .iter()
        .filter(|q| q.status == QuestionStatus::Pending && !q.is_hidden)
        .cloned()
        .collect();
    sort_newest_first(&mut view);
    view
}

/// All questions, newest first. What the speaker dashboard iterates over,
/// hidden ones included.
pub fn dashboard_view(questions: &[Question]) -> Vec<Question> {
    let mut view = questions.to_vec();
    sort_newest_first(&mut view);
    view
}

// Timestamps are ISO-8601 UTC strings so lexicographic order is
// chronological order.
fn sort_newest_first(questions: &mut [Question]) {
    questions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
