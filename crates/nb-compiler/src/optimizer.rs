use std::collections::HashSet;

use nb_core::filter::{Condition, ConditionBlock, NotificationFilter};

pub struct OptimizeStats {
    pub blocks_before: usize,
    pub blocks_after: usize,
    pub conditions_before: usize,
    pub conditions_after: usize,
    pub deduped_conditions: usize,
    pub deduped_blocks: usize,
}

/// Remove repeated conditions within a block and repeated blocks.
///
/// OR and AND are both idempotent, so the optimized filter accepts exactly
/// the same books.
pub fn optimize_filter(filter: NotificationFilter) -> (NotificationFilter, OptimizeStats) {
    let conditions_before = filter.condition_count();
    let mut blocks = filter.into_blocks();
    let blocks_before = blocks.len();

    let mut deduped_conditions = 0usize;
    blocks = blocks
        .into_iter()
        .map(|block| {
            let mut seen: HashSet<Condition> = HashSet::new();
            let conditions: Vec<Condition> = block
                .into_conditions()
                .into_iter()
                .filter(|condition| {
                    if seen.contains(condition) {
                        deduped_conditions += 1;
                        false
                    } else {
                        seen.insert(condition.clone());
                        true
                    }
                })
                .collect();
            ConditionBlock::new(conditions)
        })
        .collect();

    let mut seen: HashSet<ConditionBlock> = HashSet::new();
    let mut deduped_blocks = 0usize;
    blocks.retain(|block| {
        if seen.contains(block) {
            deduped_blocks += 1;
            false
        } else {
            seen.insert(block.clone());
            true
        }
    });

    let optimized = NotificationFilter::new(blocks);
    let stats = OptimizeStats {
        blocks_before,
        blocks_after: optimized.blocks().len(),
        conditions_before,
        conditions_after: optimized.condition_count(),
        deduped_conditions,
        deduped_blocks,
    };

    (optimized, stats)
}
