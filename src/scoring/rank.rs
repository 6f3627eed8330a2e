//! Ranking order for scored repairs.

use std::cmp::Ordering;

use crate::models::ScoredRepair;

/// Ranking comparator: score descending, then station id, then repair name.
pub fn compare_scored(a: &ScoredRepair, b: &ScoredRepair) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.station_id.cmp(&b.station_id))
        .then_with(|| a.repair_name.cmp(&b.repair_name))
}

/// Sorts items (stable) and assigns ranks 1..n.
pub fn rank_in_place(items: &mut [ScoredRepair]) {
    items.sort_by(compare_scored);
    for (i, item) in items.iter_mut().enumerate() {
        item.rank = i + 1;
    }
}
