// CSV export of the question list for post-session review.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::WriterBuilder;

use crate::board::question::Question;

/// UTF-8 byte order mark so spreadsheet tools detect the encoding and render
/// CJK text correctly.
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Render the question list as CSV bytes, BOM included.
pub fn render_csv(questions: &[Question]) -> Result<Vec<u8>> {
    let mut out = Vec::from(UTF8_BOM);
    {
        let mut writer = WriterBuilder::new().from_writer(&mut out);
        writer
            .write_record(["ID", "Category", "Question", "Timestamp", "Status", "IsHidden"])
            .context("failed to write CSV header")?;
        for q in questions {
            writer
                .write_record([
                    q.id.as_str(),
                    q.category.as_str(),
                    q.text.as_str(),
                    q.timestamp.as_str(),
                    q.status.as_str(),
                    if q.is_hidden { "Yes" } else { "No" },
                ])
                .context("failed to write CSV row")?;
        }
        writer.flush().context("failed to flush CSV writer")?;
    }
    Ok(out)
}

/// Write the export file into `dir` and return its path. Returns `Ok(None)`
/// when there is nothing to export.
pub fn export_questions(questions: &[Question], dir: &Path) -> Result<Option<PathBuf>> {
    if questions.is_empty() {
        return Ok(None);
    }

    let bytes = render_csv(questions)?;
    let filename = format!("qa_session_{}.csv", Local::now().format("%Y-%m-%d"));
    let path = dir.join(filename);
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write export file {}", path.display()))?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::question::QuestionStatus;

    fn sample_question() -> Question {
        let mut q = Question::new("什麼是 WAL 模式？", "技術細節");
        q.id = "q-1".to_string();
        q.timestamp = "2026-08-30T10:00:00.000Z".to_string();
        q
    }

    #[test]
    fn render_starts_with_bom_and_header() {
        let bytes = render_csv(&[sample_question()]).unwrap();
        assert_eq!(&bytes[..3], &UTF8_BOM);
        let text = std::str::from_utf8(&bytes[3..]).unwrap();
        assert!(text.starts_with("ID,Category,Question,Timestamp,Status,IsHidden"));
    }

    #[test]
    fn render_maps_hidden_flag_to_yes_no() {
        let mut hidden = sample_question();
        hidden.is_hidden = true;
        let visible = sample_question();

        let text = String::from_utf8(render_csv(&[hidden, visible]).unwrap()[3..].to_vec()).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert!(rows[1].ends_with(",Yes"));
        assert!(rows[2].ends_with(",No"));
    }

    #[test]
    fn render_escapes_quotes_in_question_text() {
        let mut q = sample_question();
        q.text = "他說 \"hello\" 然後離開".to_string();
        let text = String::from_utf8(render_csv(&[q]).unwrap()[3..].to_vec()).unwrap();
        // CSV doubles embedded quotes.
        assert!(text.contains("\"他說 \"\"hello\"\" 然後離開\""));
    }

    #[test]
    fn render_includes_resolved_status() {
        let mut q = sample_question();
        q.status = QuestionStatus::Resolved;
        let text = String::from_utf8(render_csv(&[q]).unwrap()[3..].to_vec()).unwrap();
        assert!(text.contains(",resolved,"));
    }

    #[test]
    fn export_empty_list_writes_nothing() {
        let dir = std::env::temp_dir();
        let result = export_questions(&[], &dir).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn export_writes_dated_file() {
        let dir = std::env::temp_dir().join(format!("qa_export_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = export_questions(&[sample_question()], &dir).unwrap().unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("qa_session_"));
        assert!(name.ends_with(".csv"));
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
