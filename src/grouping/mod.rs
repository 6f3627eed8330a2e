//! Trip grouping.
//!
//! Clusters repairs into trips keyed by (trip location, access type), sums
//! per-trip days, cost and funding splits, and orders trips by priority.
//!
//! # Ordering
//!
//! 1. Priority score (descending), per [`PriorityMode`]
//! 2. Maximum repair score (descending)
//! 3. Position-wise comparison of descending score lists
//! 4. Total days (descending)
//! 5. First-seen order
//!
//! # Example
//!
//! ```
//! use u_workplan::grouping::TripGrouper;
//! use u_workplan::models::{Repair, StationIndex};
//!
//! let repairs = vec![
//!     Repair::new("S1", "Roof").with_field("Trip Location", "North").with_field("Access Type", "Boat"),
//!     Repair::new("S2", "Dock").with_field("Trip Location", "North").with_field("Access Type", "Boat"),
//!     Repair::new("S3", "Pump"),
//! ];
//!
//! let plan = TripGrouper::new().group_raw(&repairs, &StationIndex::new()).unwrap();
//! assert_eq!(plan.trips.len(), 2);
//! assert_eq!(plan.trips[0].trip_location, "North");
//! assert_eq!(plan.trips[0].stations.len(), 2);
//! assert_eq!(plan.trips[1].trip_location, "Unknown");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::{FieldNames, PlannerConfig};
use crate::error::PlanError;
use crate::models::{
    accumulate, PriorityMode, RecordView, Repair, ScoredRepair, SplitMap, Station,
    StationAggregate, StationIndex, Trip, TripContextTable,
};

/// Ordered trips with the repair → trip side table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    /// Trips in priority order.
    pub trips: Vec<Trip>,
    /// Trip location and access type per repair.
    pub contexts: TripContextTable,
}

/// Groups repairs into trips.
#[derive(Debug, Clone)]
pub struct TripGrouper {
    priority_mode: PriorityMode,
    fields: FieldNames,
    unknown_label: String,
}

impl Default for TripGrouper {
    fn default() -> Self {
        Self::new()
    }
}

impl TripGrouper {
    /// Creates a grouper with `tripmean` priority and default field names.
    pub fn new() -> Self {
        Self::from_config(&PlannerConfig::default())
    }

    /// Creates a grouper from planner configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            priority_mode: config.priority_mode,
            fields: config.fields.clone(),
            unknown_label: config.unknown_label.clone(),
        }
    }

    /// Sets the priority mode.
    pub fn with_priority_mode(mut self, mode: PriorityMode) -> Self {
        self.priority_mode = mode;
        self
    }

    /// Sets the field names.
    pub fn with_fields(mut self, fields: FieldNames) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the label used for missing locations and access types.
    pub fn with_unknown_label(mut self, label: impl Into<String>) -> Self {
        self.unknown_label = label.into();
        self
    }

    /// Groups unscored repairs (every score is 0).
    pub fn group_raw(
        &self,
        repairs: &[Repair],
        stations: &StationIndex,
    ) -> Result<TripPlan, PlanError> {
        let items: Vec<ScoredRepair> = repairs.iter().cloned().map(ScoredRepair::from).collect();
        self.group(&items, stations)
    }

    /// Groups scored repairs into ordered trips.
    ///
    /// # Errors
    /// [`PlanError::NoRepairs`] when `items` is empty.
    pub fn group(
        &self,
        items: &[ScoredRepair],
        stations: &StationIndex,
    ) -> Result<TripPlan, PlanError> {
        if items.is_empty() {
            return Err(PlanError::NoRepairs);
        }

        let mut trips: Vec<Trip> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for item in items {
            let repair = &item.original_repair;
            let view = RecordView::resolve(repair, stations);
            let location = self.label(&view, &self.fields.trip_location);
            let access = self.label(&view, &self.fields.access_type);

            let slot = *index
                .entry((location.clone(), access.clone()))
                .or_insert_with(|| {
                    trips.push(Trip::new(location, access));
                    trips.len() - 1
                });
            let trip = &mut trips[slot];

            let days = view.number(&self.fields.days).unwrap_or(0.0);
            let station_pos = match trip
                .stations
                .iter()
                .position(|s| s.station.id == item.station_id)
            {
                Some(pos) => pos,
                None => {
                    let station = stations
                        .get(&item.station_id)
                        .cloned()
                        .unwrap_or_else(|| Station::new(item.station_id.clone()));
                    trip.stations.push(StationAggregate::new(station));
                    trip.stations.len() - 1
                }
            };
            trip.stations[station_pos].add(repair, days);

            trip.total_days += days;
            trip.total_cost += item.cost;
            if item.split_amounts.is_empty() {
                if let Some(split) = SplitMap::resolve(&view, &self.fields.split_fields) {
                    accumulate(&mut trip.total_split_costs, &split.apply(item.cost));
                }
            } else {
                accumulate(&mut trip.total_split_costs, &item.split_amounts);
            }
            trip.repairs.push(item.clone());
        }

        for trip in &mut trips {
            trip.refresh_priority(self.priority_mode);
        }
        trips.sort_by(compare_trips);

        log::debug!(
            "grouped {} repairs into {} trips ({})",
            items.len(),
            trips.len(),
            self.priority_mode
        );

        let contexts = TripContextTable::from_trips(&trips);
        Ok(TripPlan { trips, contexts })
    }

    fn label(&self, view: &RecordView<'_>, field: &str) -> String {
        view.text(field)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| self.unknown_label.clone())
    }
}

/// Trip ordering comparator (highest priority first).
pub fn compare_trips(a: &Trip, b: &Trip) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| b.priority_metrics.max.total_cmp(&a.priority_metrics.max))
        .then_with(|| compare_score_lists(&a.sorted_scores(), &b.sorted_scores()))
        .then_with(|| b.total_days.total_cmp(&a.total_days))
}

/// Larger score at the first differing position sorts first.
fn compare_score_lists(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| y.total_cmp(x))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::index_stations;

    fn scored(station: &str, name: &str, score: f64, location: &str, access: &str) -> ScoredRepair {
        let mut item = ScoredRepair::unscored(
            Repair::new(station, name)
                .with_field("Trip Location", location)
                .with_field("Access Type", access),
        );
        item.score = score;
        item
    }

    #[test]
    fn test_trip_metrics_mean_max_median() {
        let items = vec![
            scored("S1", "Roof", 80.0, "Site A", "Boat"),
            scored("S1", "Dock", 60.0, "Site A", "Boat"),
        ];
        let plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        assert_eq!(plan.trips.len(), 1);

        let trip = &plan.trips[0];
        assert!((trip.priority_score - 70.0).abs() < 1e-10);
        assert!((trip.priority_metrics.mean - 70.0).abs() < 1e-10);
        assert!((trip.priority_metrics.max - 80.0).abs() < 1e-10);
        assert!((trip.priority_metrics.median - 70.0).abs() < 1e-10);
        assert_eq!(trip.priority_mode, PriorityMode::TripMean);
        assert_eq!(trip.stations.len(), 1);
        assert_eq!(trip.stations[0].repair_count, 2);
    }

    #[test]
    fn test_tripmax_mode() {
        let items = vec![
            scored("S1", "a", 90.0, "A", "Boat"),
            scored("S1", "b", 10.0, "A", "Boat"),
            scored("S2", "c", 60.0, "B", "Boat"),
        ];
        let mean_plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        assert_eq!(mean_plan.trips[0].trip_location, "B");

        let max_plan = TripGrouper::new()
            .with_priority_mode(PriorityMode::TripMax)
            .group(&items, &StationIndex::new())
            .unwrap();
        assert_eq!(max_plan.trips[0].trip_location, "A");
        assert!((max_plan.trips[0].priority_score - 90.0).abs() < 1e-10);
    }

    #[test]
    fn test_tie_break_by_max_then_score_list() {
        let items = vec![
            // mean 50, max 60
            scored("S1", "a", 60.0, "A", "Boat"),
            scored("S1", "b", 40.0, "A", "Boat"),
            // mean 50, max 70
            scored("S2", "c", 70.0, "B", "Boat"),
            scored("S2", "d", 30.0, "B", "Boat"),
            // mean 50, max 70, second 50 > 30
            scored("S3", "e", 70.0, "C", "Boat"),
            scored("S3", "f", 50.0, "C", "Boat"),
            scored("S3", "g", 30.0, "C", "Boat"),
        ];
        let plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        let order: Vec<&str> = plan.trips.iter().map(|t| t.trip_location.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_tie_break_by_days_then_first_seen() {
        let mut long = scored("S2", "b", 50.0, "B", "Boat");
        long.original_repair = long.original_repair.with_field("Days", 5.0);
        let items = vec![
            scored("S1", "a", 50.0, "A", "Boat"),
            long,
            scored("S3", "c", 50.0, "C", "Boat"),
        ];
        let plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        let order: Vec<&str> = plan.trips.iter().map(|t| t.trip_location.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(plan.trips[0].total_days, 5.0);
    }

    #[test]
    fn test_station_fields_supply_trip_key() {
        let stations = index_stations(vec![Station::new("S1")
            .with_field("Trip Location", "Harbor")
            .with_field("Access Type", "Truck")
            .with_field("Days", 2.0)]);
        let repairs = vec![
            Repair::new("S1", "Roof").with_cost(100.0),
            Repair::new("S1", "Dock").with_cost(50.0).with_field("Days", 1.0),
        ];
        let plan = TripGrouper::new().group_raw(&repairs, &stations).unwrap();
        assert_eq!(plan.trips.len(), 1);

        let trip = &plan.trips[0];
        assert_eq!(trip.trip_location, "Harbor");
        assert_eq!(trip.access_type, "Truck");
        assert_eq!(trip.total_days, 3.0);
        assert_eq!(trip.total_cost, 150.0);
        assert_eq!(trip.stations[0].station, stations["S1"]);
        assert_eq!(trip.stations[0].total_days, 3.0);
    }

    #[test]
    fn test_unknown_label_is_configurable() {
        let repairs = vec![Repair::new("S1", "Roof").with_field("Trip Location", "  ")];
        let plan = TripGrouper::new()
            .with_unknown_label("N/A")
            .group_raw(&repairs, &StationIndex::new())
            .unwrap();
        assert_eq!(plan.trips[0].trip_location, "N/A");
        assert_eq!(plan.trips[0].access_type, "N/A");
    }

    #[test]
    fn test_split_totals() {
        let mut scored_item = scored("S1", "a", 10.0, "A", "Boat");
        scored_item.cost = 100.0;
        scored_item.split_amounts = [("f".to_string(), 100.0)].into_iter().collect();
        let raw = ScoredRepair::unscored(
            Repair::new("S2", "b")
                .with_cost(200.0)
                .with_field("Trip Location", "A")
                .with_field("Access Type", "Boat")
                .with_field("Capital", "25%F-75%P"),
        );
        let plan = TripGrouper::new()
            .group(&[scored_item, raw], &StationIndex::new())
            .unwrap();
        let totals = &plan.trips[0].total_split_costs;
        assert_eq!(totals["f"], 150.0);
        assert_eq!(totals["p"], 150.0);
    }

    #[test]
    fn test_context_table_covers_every_repair() {
        let items = vec![
            scored("S1", "a", 10.0, "A", "Boat"),
            scored("S2", "b", 20.0, "B", "Truck"),
            scored("S3", "c", 30.0, "A", "Boat"),
        ];
        let plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        assert_eq!(plan.contexts.len(), 3);
        let ctx = plan.contexts.get(&items[1].key()).unwrap();
        assert_eq!(ctx.trip_location, "B");
        assert_eq!(ctx.access_type, "Truck");
    }

    #[test]
    fn test_member_order_preserved() {
        let items = vec![
            scored("S1", "first", 10.0, "A", "Boat"),
            scored("S2", "other", 10.0, "B", "Boat"),
            scored("S1", "second", 90.0, "A", "Boat"),
        ];
        let plan = TripGrouper::new().group(&items, &StationIndex::new()).unwrap();
        let trip = plan.trips.iter().find(|t| t.trip_location == "A").unwrap();
        let names: Vec<&str> = trip.repairs.iter().map(|r| r.repair_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn test_empty_input_fails() {
        let err = TripGrouper::new()
            .group(&[], &StationIndex::new())
            .unwrap_err();
        assert!(matches!(err, PlanError::NoRepairs));
    }

    #[test]
    fn test_score_list_comparison() {
        assert_eq!(compare_score_lists(&[70.0, 50.0], &[70.0, 30.0]), Ordering::Less);
        assert_eq!(compare_score_lists(&[70.0], &[70.0, 30.0]), Ordering::Equal);
        assert_eq!(compare_score_lists(&[60.0], &[70.0]), Ordering::Greater);
    }
}
