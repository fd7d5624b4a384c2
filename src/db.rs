// SQLite persistence layer for board state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use tracing::warn;

use crate::board::question::{ChatMessage, Question};

/// Key under which the question list is stored.
const QUESTIONS_KEY: &str = "qa_questions";

/// Key under which the chat transcript is stored.
const TRANSCRIPT_KEY: &str = "chatMessages";

/// SQLite-backed persistence for the question list and chat transcript.
///
/// Both collections are stored as JSON blobs in a key-value table, each
/// saved wholesale on every mutation. The volumes involved (tens of
/// questions, a 50-message transcript) make per-row storage not worth it.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure the state
    /// table exists. Pass `":memory:"` for an ephemeral in-memory database
    /// (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS board_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    fn save_raw(&self, key: &str, json_str: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO board_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .with_context(|| format!("failed to save {key}"))?;
        Ok(())
    }

    fn load_raw(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM board_state WHERE key = ?1")
            .context("failed to prepare state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query board state")?;

        match rows.next() {
            Some(row_result) => Ok(Some(row_result.context("failed to read state row")?)),
            None => Ok(None),
        }
    }

    /// Persist the full question list, replacing whatever was stored.
    pub fn save_questions(&self, questions: &[Question]) -> Result<()> {
        let json_str =
            serde_json::to_string(questions).context("failed to serialize questions")?;
        self.save_raw(QUESTIONS_KEY, &json_str)
    }

    /// Load the stored question list. Returns `None` when the key has never
    /// been written, which is how a brand-new board is detected. A stored
    /// value that fails to parse is treated as an empty list rather than an
    /// error so a corrupt row cannot brick startup.
    pub fn load_questions(&self) -> Result<Option<Vec<Question>>> {
        match self.load_raw(QUESTIONS_KEY)? {
            Some(json_str) => match serde_json::from_str(&json_str) {
                Ok(questions) => Ok(Some(questions)),
                Err(err) => {
                    warn!("stored question list is malformed, starting empty: {err}");
                    Ok(Some(Vec::new()))
                }
            },
            None => Ok(None),
        }
    }

    /// Persist the full chat transcript, replacing whatever was stored.
    pub fn save_transcript(&self, messages: &[ChatMessage]) -> Result<()> {
        let json_str =
            serde_json::to_string(messages).context("failed to serialize transcript")?;
        self.save_raw(TRANSCRIPT_KEY, &json_str)
    }

    /// Load the stored chat transcript. Missing or malformed data yields an
    /// empty transcript.
    pub fn load_transcript(&self) -> Result<Vec<ChatMessage>> {
        match self.load_raw(TRANSCRIPT_KEY)? {
            Some(json_str) => match serde_json::from_str(&json_str) {
                Ok(messages) => Ok(messages),
                Err(err) => {
                    warn!("stored transcript is malformed, starting empty: {err}");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Wipe the session in a single transaction: the transcript row is
    /// deleted and the question list is overwritten with an empty array.
    /// Writing `[]` (instead of deleting the key) marks the board as
    /// already initialised so starter questions are not re-seeded on the
    /// next launch.
    pub fn clear_all(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute(
            "DELETE FROM board_state WHERE key = ?1",
            params![TRANSCRIPT_KEY],
        )
        .context("failed to delete transcript")?;
        tx.execute(
            "INSERT OR REPLACE INTO board_state (key, value) VALUES (?1, '[]')",
            params![QUESTIONS_KEY],
        )
        .context("failed to reset question list")?;
        tx.commit().context("failed to commit clear_all")?;
        Ok(())
    }
}
