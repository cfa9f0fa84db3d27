//! Shared type definitions
//!
//! Small value types used by both the filter engine and the rules compiler.

use serde::{Deserialize, Serialize};

// =============================================================================
// Condition Kinds
// =============================================================================

/// Comparison performed by a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    /// Field value equals one of the words (exact match, not substring)
    Contains,
    /// Field value equals none of the words
    NotContains,
    /// Field value starts with none of the words
    NotStartsWith,
}

impl ConditionKind {
    /// Parse from the `type` value used in rules files.
    pub fn from_config(s: &str) -> Option<Self> {
        match s {
            "contain" => Some(Self::Contains),
            "not_contain" => Some(Self::NotContains),
            "not_start_with" => Some(Self::NotStartsWith),
            _ => None,
        }
    }

    /// The rules-file spelling of this kind.
    pub fn as_config(&self) -> &'static str {
        match self {
            Self::Contains => "contain",
            Self::NotContains => "not_contain",
            Self::NotStartsWith => "not_start_with",
        }
    }

    /// Result when the field cannot be resolved on the record.
    ///
    /// Positive conditions fail closed, negative ones fail open.
    pub const fn unresolved_result(&self) -> bool {
        match self {
            Self::Contains => false,
            Self::NotContains | Self::NotStartsWith => true,
        }
    }
}

// =============================================================================
// Decoded Subject
// =============================================================================

/// Labels decoded from a C-code.
///
/// Any label may be empty when its sub-code is missing from the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Target audience (first digit)
    pub target: String,
    /// Publication format (second digit)
    pub format: String,
    /// Content category (last two digits)
    pub content: String,
}
