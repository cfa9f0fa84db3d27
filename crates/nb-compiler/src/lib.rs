//! New Books Notification Rules Compiler
//!
//! This crate turns a JSON rules file into a [`NotificationFilter`].

use std::path::Path;

use nb_core::NotificationFilter;

pub mod builder;
pub mod optimizer;
pub mod parser;

pub use builder::{build_filter, build_filter_with_stats, BuildStats, RejectedRule, RuleRejection};
pub use optimizer::{optimize_filter, OptimizeStats};
pub use parser::{parse_rule_set, read_rule_set, FilterSettings, RulesError};

/// Read a rules file and build the filter it describes.
///
/// Read and parse failures are returned; invalid individual rules are skipped.
pub fn load_filter(path: &Path) -> Result<NotificationFilter, RulesError> {
    let settings = read_rule_set(path)?;
    let (filter, stats) = build_filter_with_stats(&settings);
    log::info!(
        "Loaded notification filter from '{}': {} block(s), {} condition(s), {} rule(s) skipped",
        path.display(),
        filter.blocks().len(),
        filter.condition_count(),
        stats.rejected.len(),
    );
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use nb_core::Book;

    use super::*;

    #[test]
    fn loads_shipped_rules() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data/filter.json");
        let filter = load_filter(&path).expect("shipped rules should load");
        assert_eq!(filter.blocks().len(), 2);

        let physics = Book {
            categories: "児童書".to_string(),
            content: "物理学".to_string(),
            ..Default::default()
        };
        assert!(filter.is_match(&physics));

        let study_aid = Book {
            categories: "学参".to_string(),
            content: "物理学".to_string(),
            ..Default::default()
        };
        assert!(!filter.is_match(&study_aid));
    }

    #[test]
    fn load_errors_are_returned() {
        let missing = load_filter(Path::new("/nonexistent/filter.json"));
        assert!(matches!(missing, Err(RulesError::Read { .. })));
    }
}
