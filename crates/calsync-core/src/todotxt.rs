//! todo.txt task source.
//!
//! One task per line. A line starting with `x ` is completed; `due:YYYY-MM-DD`
//! sets the due date and `t:YYYY-MM-DD` the threshold date. The task text is
//! the line as written, so mirrored events read the same as the list.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::SourceError;
use crate::model::TaskSnapshot;
use crate::store::TaskSource;

const DUE_TAG: &str = "due:";
const THRESHOLD_TAG: &str = "t:";

/// Parse one todo.txt line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<TaskSnapshot> {
    let text = line.trim();
    if text.is_empty() {
        return None;
    }

    let mut task = TaskSnapshot::new(text);
    task.completed = text.starts_with("x ");

    for token in text.split_whitespace() {
        if let Some(value) = token.strip_prefix(DUE_TAG) {
            task.due = task.due.or_else(|| parse_date(value));
        } else if let Some(value) = token.strip_prefix(THRESHOLD_TAG) {
            task.threshold = task.threshold.or_else(|| parse_date(value));
        }
    }
    Some(task)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parse a whole todo.txt document.
pub fn parse(content: &str) -> Vec<TaskSnapshot> {
    content.lines().filter_map(parse_line).collect()
}

/// Reads the todo.txt file afresh on every call.
#[derive(Debug, Clone)]
pub struct TodoTxtSource {
    path: PathBuf,
}

impl TodoTxtSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TaskSource for TodoTxtSource {
    fn list_tasks(&self) -> Result<Vec<TaskSnapshot>, SourceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(parse(&content))
    }
}
