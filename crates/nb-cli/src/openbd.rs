//! openBD client
//!
//! `GET {base}/get?isbn=...` answers with a JSON array holding one object per
//! requested ISBN, or `null` when openBD does not know the book.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Deserialize;

use nb_core::record::{jst, BookDetail};

pub const DEFAULT_OPENBD_URL: &str = "https://api.openbd.jp/v1";

/// ONIX subject scheme identifier of the C-code.
const CCODE_SCHEME: &str = "78";
const HANMOTO_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[async_trait]
pub trait DetailFetcher: Send + Sync {
    /// Look up a book. `Ok(None)` means the service has no entry for it.
    async fn fetch_detail(&self, isbn: &str) -> Result<Option<BookDetail>, String>;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpenBdResponse {
    #[serde(default)]
    pub onix: Onix,
    #[serde(default)]
    pub hanmoto: Hanmoto,
    #[serde(default)]
    pub summary: Summary,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Onix {
    #[serde(rename = "DescriptiveDetail", default)]
    pub descriptive_detail: DescriptiveDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DescriptiveDetail {
    #[serde(rename = "Subject", default)]
    pub subject: Vec<OnixSubject>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OnixSubject {
    #[serde(rename = "MainSubject", default)]
    pub main_subject: String,
    #[serde(rename = "SubjectSchemeIdentifier", default)]
    pub subject_scheme_identifier: String,
    #[serde(rename = "SubjectCode", default)]
    pub subject_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hanmoto {
    #[serde(default)]
    pub datemodified: String,
    #[serde(default)]
    pub datecreated: String,
    #[serde(default)]
    pub datekoukai: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub pubdate: String,
    #[serde(default)]
    pub author: String,
}

impl OpenBdResponse {
    /// The C-code subject, falling back to the first subject listed.
    pub fn ccode(&self) -> &str {
        let subjects = &self.onix.descriptive_detail.subject;
        subjects
            .iter()
            .find(|s| s.subject_scheme_identifier == CCODE_SCHEME)
            .or_else(|| subjects.first())
            .map(|s| s.subject_code.as_str())
            .unwrap_or_default()
    }

    pub fn into_detail(self) -> BookDetail {
        BookDetail {
            authors: self.summary.author.clone(),
            publisher: self.summary.publisher.clone(),
            ccode: self.ccode().to_string(),
            created_date: parse_hanmoto_timestamp(&self.hanmoto.datecreated),
            last_updated_date: parse_hanmoto_timestamp(&self.hanmoto.datemodified),
        }
    }
}

fn parse_hanmoto_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if raw.is_empty() {
        return None;
    }
    let parsed = NaiveDateTime::parse_from_str(raw, HANMOTO_TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| naive.and_local_timezone(jst()).single());
    if parsed.is_none() {
        log::warn!("Error in parsing timestamp: {}", raw);
    }
    parsed
}

pub struct OpenBdClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenBdClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl DetailFetcher for OpenBdClient {
    async fn fetch_detail(&self, isbn: &str) -> Result<Option<BookDetail>, String> {
        let url = format!("{}/get", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("isbn", isbn)])
            .send()
            .await
            .map_err(|e| format!("openBD request failed: {}", e))?;
        if !resp.status().is_success() {
            return Err(format!("openBD returned HTTP {}", resp.status().as_u16()));
        }
        let body: Vec<Option<OpenBdResponse>> = resp
            .json()
            .await
            .map_err(|e| format!("Error in decoding openBD response: {}", e))?;

        Ok(body.into_iter().next().flatten().map(OpenBdResponse::into_detail))
    }
}
