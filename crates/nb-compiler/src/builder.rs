use nb_core::filter::{Condition, ConditionBlock, NotificationFilter};
use nb_core::record::canonical_field_name;
use nb_core::types::ConditionKind;

use crate::parser::{ConditionSettings, FilterSettings};

/// Why a single rule was left out of the filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleRejection {
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),
    #[error("Invalid condition kind: {0:?}")]
    InvalidConditionKind(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    /// Index of the block in the rules file
    pub block: usize,
    /// Index of the condition within its block
    pub condition: usize,
    pub reason: RuleRejection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub blocks_seen: usize,
    pub conditions_seen: usize,
    pub blocks_dropped: usize,
    pub rejected: Vec<RejectedRule>,
}

pub fn build_filter(settings: &FilterSettings) -> NotificationFilter {
    build_filter_with_stats(settings).0
}

/// Build a filter, skipping rules with an unknown field or kind.
///
/// Blocks left with no valid rule are dropped, so a rules file with nothing
/// usable yields a filter that matches nothing.
pub fn build_filter_with_stats(settings: &FilterSettings) -> (NotificationFilter, BuildStats) {
    let mut stats = BuildStats {
        blocks_seen: settings.blocks.len(),
        ..Default::default()
    };
    let mut blocks = Vec::with_capacity(settings.blocks.len());

    for (block_idx, block) in settings.blocks.iter().enumerate() {
        let mut conditions = Vec::with_capacity(block.conditions.len());

        for (cond_idx, raw) in block.conditions.iter().enumerate() {
            stats.conditions_seen += 1;
            match build_condition(raw) {
                Ok(condition) => conditions.push(condition),
                Err(reason) => {
                    log::warn!("Skipping rule {} in block {}: {}", cond_idx, block_idx, reason);
                    stats.rejected.push(RejectedRule {
                        block: block_idx,
                        condition: cond_idx,
                        reason,
                    });
                }
            }
        }

        if conditions.is_empty() {
            log::warn!("Dropping block {}: no valid rules", block_idx);
            stats.blocks_dropped += 1;
            continue;
        }
        blocks.push(ConditionBlock::new(conditions));
    }

    (NotificationFilter::new(blocks), stats)
}

fn build_condition(raw: &ConditionSettings) -> Result<Condition, RuleRejection> {
    let field = canonical_field_name(&raw.filter_by)
        .ok_or_else(|| RuleRejection::InvalidFieldName(raw.filter_by.clone()))?;
    let kind = ConditionKind::from_config(&raw.filter_type)
        .ok_or_else(|| RuleRejection::InvalidConditionKind(raw.filter_type.clone()))?;
    Ok(Condition::new(kind, field, raw.words.clone()))
}
