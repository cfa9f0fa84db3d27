//! Notification Filter
//!
//! Decides whether a book is worth a notification. A filter is an AND of
//! blocks, a block is an OR of conditions. Evaluation is synchronous, does no
//! allocation beyond rendering timestamp fields, and never fails.

use crate::record::{field_value, Book};
use crate::types::ConditionKind;

// =============================================================================
// Condition
// =============================================================================

/// A single field/word-list predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    kind: ConditionKind,
    field: String,
    words: Vec<String>,
}

impl Condition {
    /// Create a condition on a canonical field name.
    pub fn new(kind: ConditionKind, field: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            words,
        }
    }

    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Evaluate this condition against a book.
    pub fn matches(&self, book: &Book) -> bool {
        let value = match field_value(book, &self.field) {
            Some(value) => value,
            None => return self.kind.unresolved_result(),
        };
        let value = value.as_ref();

        match self.kind {
            ConditionKind::Contains => self.words.iter().any(|w| value == w),
            ConditionKind::NotContains => !self.words.iter().any(|w| value == w),
            ConditionKind::NotStartsWith => {
                !self.words.iter().any(|w| value.starts_with(w.as_str()))
            }
        }
    }
}

// =============================================================================
// Condition Block
// =============================================================================

/// An OR-group of conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConditionBlock {
    conditions: Vec<Condition>,
}

impl ConditionBlock {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn into_conditions(self) -> Vec<Condition> {
        self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True if any condition matches. An empty block never matches.
    pub fn match_any(&self, book: &Book) -> bool {
        self.conditions.iter().any(|c| c.matches(book))
    }
}

// =============================================================================
// Notification Filter
// =============================================================================

/// An AND-sequence of condition blocks.
///
/// Immutable once built; share it behind an `Arc` across per-book tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationFilter {
    blocks: Vec<ConditionBlock>,
}

impl NotificationFilter {
    /// Build a filter from blocks. Empty blocks are dropped.
    pub fn new(blocks: Vec<ConditionBlock>) -> Self {
        Self {
            blocks: blocks.into_iter().filter(|b| !b.is_empty()).collect(),
        }
    }

    pub fn blocks(&self) -> &[ConditionBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<ConditionBlock> {
        self.blocks
    }

    /// Total number of conditions across all blocks.
    pub fn condition_count(&self) -> usize {
        self.blocks.iter().map(|b| b.conditions.len()).sum()
    }

    /// True if every block matches. A filter with no blocks matches nothing.
    pub fn is_match(&self, book: &Book) -> bool {
        if self.blocks.is_empty() {
            return false;
        }
        self.blocks.iter().all(|b| b.match_any(book))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    fn book(categories: &str, content: &str) -> Book {
        Book {
            categories: categories.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    fn or_filter() -> NotificationFilter {
        NotificationFilter::new(vec![ConditionBlock::new(vec![
            Condition::new(ConditionKind::Contains, "Categories", words(&["自然科学"])),
            Condition::new(ConditionKind::Contains, "Content", words(&["数学", "物理学"])),
        ])])
    }

    fn and_filter() -> NotificationFilter {
        NotificationFilter::new(vec![
            ConditionBlock::new(vec![Condition::new(
                ConditionKind::Contains,
                "Categories",
                words(&["自然科学"]),
            )]),
            ConditionBlock::new(vec![Condition::new(
                ConditionKind::Contains,
                "Content",
                words(&["数学", "物理学"]),
            )]),
        ])
    }

    #[test]
    fn test_or_conditions_within_block() {
        let filter = or_filter();
        assert!(filter.is_match(&book("自然科学", "物理学")));
        assert!(filter.is_match(&book("自然科学", "その他の工業")));
        assert!(filter.is_match(&book("児童書", "物理学")));
        assert!(!filter.is_match(&book("児童書", "その他の工業")));
    }

    #[test]
    fn test_and_across_blocks() {
        let filter = and_filter();
        assert!(filter.is_match(&book("自然科学", "物理学")));
        assert!(!filter.is_match(&book("自然科学", "その他の工業")));
        assert!(!filter.is_match(&book("児童書", "物理学")));
        assert!(!filter.is_match(&book("児童書", "その他の工業")));
    }

    #[test]
    fn test_and_is_exact_conjunction_of_blocks() {
        let filter = and_filter();
        for b in [
            book("自然科学", "物理学"),
            book("自然科学", "その他の工業"),
            book("児童書", "数学"),
            book("", ""),
        ] {
            let expected = filter.blocks().iter().all(|block| block.match_any(&b));
            assert_eq!(filter.is_match(&b), expected);
        }
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = NotificationFilter::default();
        assert!(!filter.is_match(&book("自然科学", "物理学")));
        assert!(!filter.is_match(&Book::default()));
    }

    #[test]
    fn test_empty_blocks_are_dropped() {
        let filter =
            NotificationFilter::new(vec![ConditionBlock::default(), ConditionBlock::default()]);
        assert!(filter.blocks().is_empty());
        assert!(!filter.is_match(&book("自然科学", "物理学")));

        // an empty block must not turn a passing filter into a failing one
        let filter = NotificationFilter::new(vec![
            ConditionBlock::new(vec![Condition::new(
                ConditionKind::Contains,
                "Categories",
                words(&["自然科学"]),
            )]),
            ConditionBlock::default(),
        ]);
        assert_eq!(filter.blocks().len(), 1);
        assert!(filter.is_match(&book("自然科学", "")));
    }

    #[test]
    fn test_empty_fields_fail_positive_conditions() {
        let filter = or_filter();
        assert!(!filter.is_match(&Book::default()));
        assert!(!filter.is_match(&book("hoge", "")));
        assert!(!filter.is_match(&book("", "hoge")));
    }

    #[test]
    fn test_contains_is_exact_match() {
        let cond = Condition::new(ConditionKind::Contains, "Categories", words(&["自然"]));
        assert!(!cond.matches(&book("自然科学", "")));
        assert!(cond.matches(&book("自然", "")));
    }

    #[test]
    fn test_empty_word_lists() {
        let b = book("自然科学", "物理学");
        assert!(!Condition::new(ConditionKind::Contains, "Categories", vec![]).matches(&b));
        assert!(Condition::new(ConditionKind::NotContains, "Categories", vec![]).matches(&b));
        assert!(Condition::new(ConditionKind::NotStartsWith, "Categories", vec![]).matches(&b));
    }

    #[test]
    fn test_not_contains() {
        let cond = Condition::new(ConditionKind::NotContains, "Categories", words(&["学参", "児童書"]));
        assert!(cond.matches(&book("自然科学", "")));
        assert!(!cond.matches(&book("学参", "")));
        assert!(!cond.matches(&book("児童書", "")));
        // exact comparison, no trimming
        assert!(cond.matches(&book(" 学参", "")));
    }

    #[test]
    fn test_not_starts_with() {
        let cond = Condition::new(
            ConditionKind::NotStartsWith,
            "Content",
            words(&["日本文学", "外国文学"]),
        );
        assert!(cond.matches(&book("", "物理学")));
        assert!(!cond.matches(&book("", "日本文学、小説・物語")));
        assert!(!cond.matches(&book("", "外国文学小説")));
        assert!(cond.matches(&book("", "")));
    }

    #[test]
    fn test_unknown_field_fallbacks() {
        let b = book("自然科学", "物理学");
        assert!(!Condition::new(ConditionKind::Contains, "Genre", words(&["自然科学"])).matches(&b));
        assert!(Condition::new(ConditionKind::NotContains, "Genre", words(&["自然科学"])).matches(&b));
        assert!(Condition::new(ConditionKind::NotStartsWith, "Genre", words(&["自然"])).matches(&b));
    }

    #[test]
    fn test_timestamp_fields() {
        use crate::record::jst;
        use chrono::TimeZone;

        let mut b = Book::default();
        let cond = Condition::new(ConditionKind::NotStartsWith, "PubDate", words(&["2124-"]));
        assert!(cond.matches(&b));
        b.pub_date = Some(jst().with_ymd_and_hms(2124, 2, 29, 0, 0, 0).unwrap());
        assert!(!cond.matches(&b));
    }

    #[test]
    fn test_filter_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NotificationFilter>();

        let filter = std::sync::Arc::new(or_filter());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let filter = std::sync::Arc::clone(&filter);
                std::thread::spawn(move || {
                    let category = if i % 2 == 0 { "自然科学" } else { "児童書" };
                    filter.is_match(&book(category, "その他の工業"))
                })
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![true, false, true, false]);
    }
}
