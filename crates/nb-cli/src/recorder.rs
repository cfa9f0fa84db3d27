//! Book records warehouse
//!
//! Records are kept as JSON lines, one row per book per run, with the same
//! columns the warehouse table has. Rows are looked up by upload date to skip
//! books that an earlier run on the same day already handled.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use nb_core::record::{Book, BookList};

#[async_trait]
pub trait Recorder: Send + Sync {
    /// Distinct ISBNs already recorded for `date`.
    async fn recorded_isbns(&self, date: NaiveDate) -> Result<Vec<String>, String>;
    async fn save_records(&self, list: &BookList) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub pub_date: Option<NaiveDate>,
    pub title: String,
    pub url: String,
    pub authors: String,
    pub publisher: String,
    pub categories: String,
    pub ccode: String,
    pub target: String,
    pub format: String,
    pub content: String,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub last_updated_at: Option<DateTime<FixedOffset>>,
    pub uploaded_at: DateTime<FixedOffset>,
    pub uploaded_date: NaiveDate,
}

impl Record {
    pub fn from_book(book: &Book, uploaded_at: DateTime<FixedOffset>) -> Self {
        Self {
            isbn: book.isbn.clone(),
            pub_date: book.pub_date.map(|d| d.date_naive()),
            title: book.title.clone(),
            url: book.url.clone(),
            authors: book.authors.clone(),
            publisher: book.publisher.clone(),
            categories: book.categories.clone(),
            ccode: book.ccode.clone(),
            target: book.target.clone(),
            format: book.format.clone(),
            content: book.content.clone(),
            created_at: book.created_date,
            last_updated_at: book.last_updated_date,
            uploaded_at,
            uploaded_date: uploaded_at.date_naive(),
        }
    }
}

pub struct JsonlRecorder {
    path: PathBuf,
}

impl JsonlRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Recorder for JsonlRecorder {
    async fn recorded_isbns(&self, date: NaiveDate) -> Result<Vec<String>, String> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(format!("Failed to read '{}': {}", self.path.display(), e)),
        };

        let mut seen = HashSet::new();
        let mut isbns = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!(
                        "Unexpected record at {}:{}: {}",
                        self.path.display(),
                        line_no + 1,
                        e
                    );
                    continue;
                }
            };
            if record.uploaded_date == date && seen.insert(record.isbn.clone()) {
                isbns.push(record.isbn);
            }
        }
        Ok(isbns)
    }

    async fn save_records(&self, list: &BookList) -> Result<(), String> {
        let mut buf = String::new();
        for book in &list.books {
            let line = serde_json::to_string(&Record::from_book(book, list.upload_date))
                .map_err(|e| format!("Failed to serialize record {}: {}", book.isbn, e))?;
            buf.push_str(&line);
            buf.push('\n');
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| format!("Failed to open '{}': {}", self.path.display(), e))?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| format!("Failed to write '{}': {}", self.path.display(), e))?;
        file.flush()
            .await
            .map_err(|e| format!("Failed to write '{}': {}", self.path.display(), e))?;
        Ok(())
    }
}
