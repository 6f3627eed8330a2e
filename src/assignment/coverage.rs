//! First-year coverage of top-priority repairs.

use std::collections::HashSet;

use crate::models::{CoverageWarning, RepairKey, Trip};

/// Number of repairs in the top `percent` of `total` (rounded up).
///
/// `percent` is clamped into [0, 100]; non-finite input counts as 0.
pub fn top_count(total: usize, percent: f64) -> usize {
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let count = (percent * total as f64 / 100.0).ceil() as usize;
    count.min(total)
}

/// Warnings for top-priority repairs whose keys are not in `covered`.
///
/// Repairs are flattened in trip order and stably sorted by score, so equal
/// scores keep their trip order.
pub(crate) fn coverage_warnings(
    trips: &[Trip],
    covered: &HashSet<RepairKey>,
    percent: f64,
) -> Vec<CoverageWarning> {
    let mut ranked: Vec<(&Trip, usize)> = trips
        .iter()
        .flat_map(|trip| (0..trip.repairs.len()).map(move |i| (trip, i)))
        .collect();
    ranked.sort_by(|(ta, ia), (tb, ib)| tb.repairs[*ib].score.total_cmp(&ta.repairs[*ia].score));

    let count = top_count(ranked.len(), percent);
    ranked
        .into_iter()
        .take(count)
        .filter(|(trip, i)| !covered.contains(&trip.repairs[*i].key()))
        .map(|(trip, i)| {
            let item = &trip.repairs[i];
            CoverageWarning {
                station_id: item.station_id.clone(),
                repair_name: item.repair_name.clone(),
                score: item.score,
                trip_location: trip.trip_location.clone(),
                access_type: trip.access_type.clone(),
            }
        })
        .collect()
}
