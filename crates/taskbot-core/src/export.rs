//! CSV export of a user's tasks.
//!
//! Output is semicolon-delimited UTF-8 with a byte-order mark so spreadsheet
//! tools pick the right encoding. Status and Category are decorative columns:
//! they cycle through fixed values in row order and say nothing about the task.

use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use tracing::{info, Span};

use crate::{domain::UserId, errors::Error, task::Task, Result};

pub const HEADER: [&str; 6] = ["ID", "Text", "User", "CreatedAt", "Status", "Category"];
pub const STATUSES: [&str; 3] = ["Done", "InProgress", "Postponed"];
pub const CATEGORIES: [&str; 3] = ["Work", "Personal", "Study"];

const DELIMITER: char = ';';
const LINE_END: &str = "\r\n";
const BOM: &str = "\u{feff}";

pub const EMPTY_EXPORT_MESSAGE: &str = "Cannot create CSV: the task list is empty";

pub struct CsvExporter {
    dir: PathBuf,
    span: Span,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            dir: dir.into(),
            span,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `tasks` to `<dir>/<file_name>` and return the absolute path.
    ///
    /// The caller owns the file and is expected to delete it once sent.
    pub fn write_tasks(&self, tasks: &[Task], file_name: &str) -> Result<PathBuf> {
        if tasks.is_empty() {
            return Err(Error::Validation(EMPTY_EXPORT_MESSAGE.to_string()));
        }

        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);

        let file = fs::File::create(&path)?;
        let mut out = BufWriter::new(file);
        out.write_all(render(tasks).as_bytes())?;
        out.flush()?;

        let path = fs::canonicalize(&path)?;
        self.span.in_scope(|| {
            info!(
                count = tasks.len(),
                path = %path.display(),
                "csv export written"
            )
        });
        Ok(path)
    }
}

/// Unique file name for one export of `user_id`'s tasks.
pub fn export_file_name(user_id: UserId) -> String {
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
    format!("tasks_{}_{stamp}.csv", user_id.0)
}

/// Full file contents, BOM included.
pub fn render(tasks: &[Task]) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, HEADER.iter().map(|s| s.to_string()));

    let decorations = STATUSES.iter().cycle().zip(CATEGORIES.iter().cycle());
    for (task, (status, category)) in tasks.iter().zip(decorations) {
        push_row(
            &mut out,
            [
                task.id().to_string(),
                task.text().to_string(),
                task.user_id().0.to_string(),
                task.created_at().to_string(),
                status.to_string(),
                category.to_string(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            out.push(DELIMITER);
        }
        push_field(out, &field);
    }
    out.push_str(LINE_END);
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == '"' || c == '\n' || c == '\r');
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push('"');
    out.push_str(&field.replace('"', "\"\""));
    out.push('"');
}
