use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, Utc};
use feed_rs::model::{Entry, Feed};
use regex::Regex;
use serde::Serialize;

use nb_core::record::{jst, Book, BookList};

static ISBN_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// The parts of the new-releases feed this job uses, also archived as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub title: String,
    pub published: DateTime<FixedOffset>,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub categories: Vec<String>,
    pub published: Option<DateTime<FixedOffset>>,
}

pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<FeedSnapshot, String> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch feed '{}': {}", url, e))?;
    if !resp.status().is_success() {
        return Err(format!("Feed '{}' returned HTTP {}", url, resp.status().as_u16()));
    }
    let body = resp
        .bytes()
        .await
        .map_err(|e| format!("Failed to read feed '{}': {}", url, e))?;
    parse_feed(&body)
}

pub fn parse_feed(bytes: &[u8]) -> Result<FeedSnapshot, String> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| format!("Failed to parse feed: {}", e))?;
    Ok(snapshot_from_feed(feed))
}

fn snapshot_from_feed(feed: Feed) -> FeedSnapshot {
    let published = match feed.published.or(feed.updated) {
        Some(date) => to_jst(date),
        None => {
            log::warn!("Feed has no publish date, using the current time");
            to_jst(Utc::now())
        }
    };

    FeedSnapshot {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        published,
        entries: feed.entries.into_iter().map(entry_from_feed).collect(),
    }
}

fn entry_from_feed(entry: Entry) -> FeedEntry {
    FeedEntry {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link: entry.links.first().map(|l| l.href.clone()).unwrap_or_default(),
        categories: entry.categories.into_iter().map(|c| c.term).collect(),
        published: entry.published.or(entry.updated).map(to_jst),
    }
}

fn to_jst(date: DateTime<Utc>) -> DateTime<FixedOffset> {
    date.with_timezone(&jst())
}

impl FeedSnapshot {
    /// Build the day's book list from the feed entries.
    pub fn book_list(&self) -> BookList {
        let books = self
            .entries
            .iter()
            .map(|entry| {
                let categories: Vec<&str> = entry.categories.iter().map(|c| c.trim()).collect();
                Book {
                    isbn: extract_isbn(&entry.link),
                    title: entry.title.trim().to_string(),
                    url: entry.link.clone(),
                    categories: categories.join(","),
                    pub_date: entry.published,
                    ..Default::default()
                }
            })
            .collect();

        BookList {
            upload_date: self.published,
            books,
        }
    }
}

/// First run of 13 digits in the link's path, or empty.
pub fn extract_isbn(link: &str) -> String {
    let path = match reqwest::Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link.to_string(),
    };
    isbn_pattern()
        .and_then(|re| re.find(&path))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn isbn_pattern() -> Option<&'static Regex> {
    ISBN_PATTERN
        .get_or_init(|| Regex::new(r"[0-9]{13}").ok())
        .as_ref()
}
