//! Book records
//!
//! A [`Book`] is built from a feed entry, then enriched with openBD details and
//! decoded C-code labels. The filter engine reads it by field name through
//! [`field_value`], which is the only place that knows how each field renders
//! as a string.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::types::Subject;

const JST_OFFSET_SECS: i32 = 9 * 3600;

const JST: FixedOffset = match FixedOffset::east_opt(JST_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("JST offset out of range"),
};

/// Japan Standard Time, the zone the feed and openBD timestamps are in.
pub fn jst() -> FixedOffset {
    JST
}

// =============================================================================
// Book
// =============================================================================

/// A single newly published book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub url: String,
    pub authors: String,
    pub publisher: String,
    /// Feed categories, trimmed and joined with `,`
    pub categories: String,
    pub ccode: String,
    pub target: String,
    pub format: String,
    pub content: String,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub created_date: Option<DateTime<FixedOffset>>,
    pub last_updated_date: Option<DateTime<FixedOffset>>,
}

/// Details looked up for a book by ISBN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDetail {
    pub authors: String,
    pub publisher: String,
    pub ccode: String,
    pub created_date: Option<DateTime<FixedOffset>>,
    pub last_updated_date: Option<DateTime<FixedOffset>>,
}

impl Book {
    /// Copy looked-up details onto this book.
    pub fn update_details(&mut self, detail: &BookDetail) {
        self.authors = detail.authors.clone();
        self.publisher = detail.publisher.clone();
        self.ccode = detail.ccode.clone();
        self.created_date = detail.created_date;
        self.last_updated_date = detail.last_updated_date;
    }

    /// Copy decoded C-code labels onto this book.
    pub fn update_subject(&mut self, subject: &Subject) {
        self.target = subject.target.clone();
        self.format = subject.format.clone();
        self.content = subject.content.clone();
    }

    /// Slack-formatted message announcing this book.
    pub fn notification_message(&self) -> String {
        let pub_date = self
            .pub_date
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_default();
        format!(
            "<{}|{}>\n発売日: {}\nカテゴリー: {}\n内容: {}",
            self.url,
            self.title.trim(),
            pub_date,
            self.categories,
            self.content,
        )
    }
}

// =============================================================================
// Book List
// =============================================================================

/// The books of one feed publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookList {
    /// Publish timestamp of the feed itself
    pub upload_date: DateTime<FixedOffset>,
    pub books: Vec<Book>,
}

impl BookList {
    /// Drop books whose ISBN is in `isbns`, keeping the order of the rest.
    pub fn filter_out(self, isbns: &[String]) -> BookList {
        let seen: HashSet<&str> = isbns.iter().map(String::as_str).collect();
        let books = self
            .books
            .into_iter()
            .filter(|book| !seen.contains(book.isbn.as_str()))
            .collect();
        BookList {
            upload_date: self.upload_date,
            books,
        }
    }
}

// =============================================================================
// Field Table
// =============================================================================

struct RecordField {
    /// Canonical name, as conditions refer to it
    name: &'static str,
    /// Rules-file spelling besides the lowercase canonical name
    snake: &'static str,
    read: fn(&Book) -> Cow<'_, str>,
}

const FIELDS: &[RecordField] = &[
    RecordField {
        name: "Isbn",
        snake: "isbn",
        read: |b| Cow::Borrowed(b.isbn.as_str()),
    },
    RecordField {
        name: "Title",
        snake: "title",
        read: |b| Cow::Borrowed(b.title.as_str()),
    },
    RecordField {
        name: "Url",
        snake: "url",
        read: |b| Cow::Borrowed(b.url.as_str()),
    },
    RecordField {
        name: "Authors",
        snake: "authors",
        read: |b| Cow::Borrowed(b.authors.as_str()),
    },
    RecordField {
        name: "Publisher",
        snake: "publisher",
        read: |b| Cow::Borrowed(b.publisher.as_str()),
    },
    RecordField {
        name: "Categories",
        snake: "categories",
        read: |b| Cow::Borrowed(b.categories.as_str()),
    },
    RecordField {
        name: "Ccode",
        snake: "ccode",
        read: |b| Cow::Borrowed(b.ccode.as_str()),
    },
    RecordField {
        name: "Target",
        snake: "target",
        read: |b| Cow::Borrowed(b.target.as_str()),
    },
    RecordField {
        name: "Format",
        snake: "format",
        read: |b| Cow::Borrowed(b.format.as_str()),
    },
    RecordField {
        name: "Content",
        snake: "content",
        read: |b| Cow::Borrowed(b.content.as_str()),
    },
    RecordField {
        name: "PubDate",
        snake: "pub_date",
        read: |b| format_date(b.pub_date),
    },
    RecordField {
        name: "CreatedDate",
        snake: "created_date",
        read: |b| format_date(b.created_date),
    },
    RecordField {
        name: "LastUpdatedDate",
        snake: "last_updated_date",
        read: |b| format_date(b.last_updated_date),
    },
];

/// Canonical names of every field a condition can target.
pub fn record_fields() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

/// Map a rules-file key to its canonical field name.
///
/// Accepts the lowercase key, the snake_case key and the canonical name itself.
pub fn canonical_field_name(key: &str) -> Option<&'static str> {
    let lowercase = !key.bytes().any(|b| b.is_ascii_uppercase());
    FIELDS
        .iter()
        .find(|f| {
            key == f.name || key == f.snake || (lowercase && key.eq_ignore_ascii_case(f.name))
        })
        .map(|f| f.name)
}

/// Resolve a canonical field name against a book.
///
/// Timestamps render as `YYYY-MM-DD` (empty when absent). Returns `None` when
/// `field` is not a record field.
pub fn field_value<'a>(book: &'a Book, field: &str) -> Option<Cow<'a, str>> {
    FIELDS.iter().find(|f| f.name == field).map(|f| (f.read)(book))
}

fn format_date(date: Option<DateTime<FixedOffset>>) -> Cow<'static, str> {
    match date {
        Some(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
        None => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_book() -> Book {
        Book {
            isbn: "1111111111111".to_string(),
            title: " ご冗談でしょう、tatamiyaさん ".to_string(),
            url: "http://example.com/bd/isbn/1111111111111".to_string(),
            categories: "自然科学".to_string(),
            content: "物理学".to_string(),
            pub_date: Some(jst().with_ymd_and_hms(2024, 8, 31, 12, 13, 24).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_every_record_field_resolves() {
        let book = sample_book();
        assert_eq!(record_fields().count(), 13);
        for field in record_fields() {
            assert!(field_value(&book, field).is_some(), "{field} should resolve");
            assert_eq!(canonical_field_name(field), Some(field));
            assert_eq!(canonical_field_name(&field.to_lowercase()), Some(field));
        }
    }

    #[test]
    fn test_jst_is_nine_hours_ahead() {
        assert_eq!(jst().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_canonical_field_name() {
        assert_eq!(canonical_field_name("categories"), Some("Categories"));
        assert_eq!(canonical_field_name("content"), Some("Content"));
        assert_eq!(canonical_field_name("last_updated_date"), Some("LastUpdatedDate"));
        assert_eq!(canonical_field_name("pubdate"), Some("PubDate"));
        assert_eq!(canonical_field_name("category"), None);
        assert_eq!(canonical_field_name("CATEGORIES"), None);
        assert_eq!(canonical_field_name(""), None);
    }

    #[test]
    fn test_field_value() {
        let book = sample_book();
        assert_eq!(field_value(&book, "Categories").as_deref(), Some("自然科学"));
        assert_eq!(field_value(&book, "PubDate").as_deref(), Some("2024-08-31"));
        assert_eq!(field_value(&book, "CreatedDate").as_deref(), Some(""));
        assert_eq!(field_value(&book, "Genre"), None);
        // lookup is case-sensitive on canonical names
        assert_eq!(field_value(&book, "categories"), None);
    }

    #[test]
    fn test_notification_message() {
        let book = sample_book();
        assert_eq!(
            book.notification_message(),
            "<http://example.com/bd/isbn/1111111111111|ご冗談でしょう、tatamiyaさん>\n発売日: 2024/08/31\nカテゴリー: 自然科学\n内容: 物理学"
        );
    }

    #[test]
    fn test_filter_out_keeps_order() {
        let upload_date = jst().with_ymd_and_hms(2024, 8, 1, 22, 42, 0).unwrap();
        let books = ["1", "2", "3", "4"]
            .iter()
            .map(|isbn| Book { isbn: isbn.to_string(), ..Default::default() })
            .collect();
        let list = BookList { upload_date, books };

        let filtered = list.filter_out(&["3".to_string(), "9".to_string()]);
        let isbns: Vec<&str> = filtered.books.iter().map(|b| b.isbn.as_str()).collect();
        assert_eq!(isbns, vec!["1", "2", "4"]);
        assert_eq!(filtered.upload_date, upload_date);
    }

    #[test]
    fn test_update_details_and_subject() {
        let mut book = sample_book();
        book.update_details(&BookDetail {
            authors: "tatamiya tamiya／著".to_string(),
            publisher: "畳屋書店".to_string(),
            ccode: "0042".to_string(),
            created_date: None,
            last_updated_date: None,
        });
        book.update_subject(&Subject {
            target: "一般".to_string(),
            format: "単行本".to_string(),
            content: "物理学".to_string(),
        });
        assert_eq!(book.publisher, "畳屋書店");
        assert_eq!(book.ccode, "0042");
        assert_eq!(book.target, "一般");
        assert_eq!(book.format, "単行本");
    }
}
