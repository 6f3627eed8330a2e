//! Trip model.
//!
//! A trip is the indivisible unit of year assignment: every repair sharing a
//! travel location and access type. Trips are built by the
//! [`TripGrouper`](crate::grouping::TripGrouper).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::record::{Repair, RepairKey, Station};
use super::scored::ScoredRepair;

/// How a trip's priority score is derived from its repairs' scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityMode {
    /// Mean repair score.
    #[default]
    #[serde(rename = "tripmean")]
    TripMean,
    /// Maximum repair score.
    #[serde(rename = "tripmax")]
    TripMax,
}

impl FromStr for PriorityMode {
    type Err = std::convert::Infallible;

    /// Lenient parse: `"tripmax"` (any case) selects max, anything else mean.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("tripmax") {
            Ok(PriorityMode::TripMax)
        } else {
            Ok(PriorityMode::TripMean)
        }
    }
}

impl fmt::Display for PriorityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityMode::TripMean => f.write_str("tripmean"),
            PriorityMode::TripMax => f.write_str("tripmax"),
        }
    }
}

/// Summary statistics over a trip's repair scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityMetrics {
    /// Arithmetic mean.
    pub mean: f64,
    /// Maximum.
    pub max: f64,
    /// Median (mean of the middle two for even counts).
    pub median: f64,
}

impl PriorityMetrics {
    /// Computes metrics. All zero for an empty slice.
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let max = sorted[n - 1];
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        Self { mean, max, median }
    }

    /// Priority score under `mode`.
    pub fn priority(&self, mode: PriorityMode) -> f64 {
        match mode {
            PriorityMode::TripMean => self.mean,
            PriorityMode::TripMax => self.max,
        }
    }
}

/// A station visited by a trip, with its repairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAggregate {
    /// Station record (first-seen record for this id).
    pub station: Station,
    /// Raw repairs at this station within the trip.
    pub repairs: Vec<Repair>,
    /// Sum of repair days.
    pub total_days: f64,
    /// Sum of repair costs.
    pub total_cost: f64,
    /// Number of repairs.
    pub repair_count: usize,
}

impl StationAggregate {
    /// Creates an empty aggregate for a station.
    pub fn new(station: Station) -> Self {
        Self {
            station,
            repairs: Vec::new(),
            total_days: 0.0,
            total_cost: 0.0,
            repair_count: 0,
        }
    }

    /// Adds a repair with its resolved duration.
    pub fn add(&mut self, repair: &Repair, days: f64) {
        self.repairs.push(repair.clone());
        self.total_days += days;
        self.total_cost += repair.cost;
        self.repair_count += 1;
    }
}

/// A cluster of repairs sharing trip location and access type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Travel location.
    pub trip_location: String,
    /// Access type (e.g., boat, truck).
    pub access_type: String,
    /// Member repairs in input order.
    pub repairs: Vec<ScoredRepair>,
    /// Visited stations in first-seen order.
    pub stations: Vec<StationAggregate>,
    /// Sum of repair days.
    pub total_days: f64,
    /// Sum of repair costs.
    pub total_cost: f64,
    /// Cost per funding source.
    pub total_split_costs: BTreeMap<String, f64>,
    /// Score used to order trips.
    pub priority_score: f64,
    /// Mode that produced `priority_score`.
    pub priority_mode: PriorityMode,
    /// Score statistics.
    pub priority_metrics: PriorityMetrics,
}

impl Trip {
    /// Creates an empty trip.
    pub fn new(trip_location: impl Into<String>, access_type: impl Into<String>) -> Self {
        Self {
            trip_location: trip_location.into(),
            access_type: access_type.into(),
            repairs: Vec::new(),
            stations: Vec::new(),
            total_days: 0.0,
            total_cost: 0.0,
            total_split_costs: BTreeMap::new(),
            priority_score: 0.0,
            priority_mode: PriorityMode::TripMean,
            priority_metrics: PriorityMetrics::default(),
        }
    }

    /// Number of member repairs.
    pub fn repair_count(&self) -> usize {
        self.repairs.len()
    }

    /// Member scores sorted descending.
    pub fn sorted_scores(&self) -> Vec<f64> {
        let mut scores: Vec<f64> = self.repairs.iter().map(|r| r.score).collect();
        scores.sort_by(|a, b| b.total_cmp(a));
        scores
    }

    /// Recomputes metrics and the priority score under `mode`.
    pub fn refresh_priority(&mut self, mode: PriorityMode) {
        let scores: Vec<f64> = self.repairs.iter().map(|r| r.score).collect();
        self.priority_metrics = PriorityMetrics::from_scores(&scores);
        self.priority_mode = mode;
        self.priority_score = self.priority_metrics.priority(mode);
    }
}

/// Trip location and access type of a repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripContext {
    /// Travel location.
    pub trip_location: String,
    /// Access type.
    pub access_type: String,
}

/// Side table mapping each repair to the trip it was grouped into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripContextTable {
    entries: HashMap<RepairKey, TripContext>,
}

impl TripContextTable {
    /// Builds the table from trips. The first trip containing a key wins.
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut entries = HashMap::new();
        for trip in trips {
            for item in &trip.repairs {
                entries.entry(item.key()).or_insert_with(|| TripContext {
                    trip_location: trip.trip_location.clone(),
                    access_type: trip.access_type.clone(),
                });
            }
        }
        Self { entries }
    }

    /// Context of a repair.
    pub fn get(&self, key: &RepairKey) -> Option<&TripContext> {
        self.entries.get(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(station: &str, name: &str, score: f64) -> ScoredRepair {
        let mut scored = ScoredRepair::unscored(Repair::new(station, name));
        scored.score = score;
        scored
    }

    #[test]
    fn test_metrics_odd_and_even() {
        let m = PriorityMetrics::from_scores(&[80.0, 60.0]);
        assert!((m.mean - 70.0).abs() < 1e-10);
        assert!((m.max - 80.0).abs() < 1e-10);
        assert!((m.median - 70.0).abs() < 1e-10);

        let m = PriorityMetrics::from_scores(&[10.0, 90.0, 20.0]);
        assert!((m.median - 20.0).abs() < 1e-10);
        assert!((m.mean - 40.0).abs() < 1e-10);
    }

    #[test]
    fn test_metrics_empty() {
        assert_eq!(PriorityMetrics::from_scores(&[]), PriorityMetrics::default());
    }

    #[test]
    fn test_priority_mode_parse() {
        assert_eq!("tripmax".parse::<PriorityMode>().unwrap(), PriorityMode::TripMax);
        assert_eq!(" TripMax ".parse::<PriorityMode>().unwrap(), PriorityMode::TripMax);
        assert_eq!("tripmean".parse::<PriorityMode>().unwrap(), PriorityMode::TripMean);
        assert_eq!("other".parse::<PriorityMode>().unwrap(), PriorityMode::TripMean);
        assert_eq!(PriorityMode::TripMax.to_string(), "tripmax");
    }

    #[test]
    fn test_refresh_priority() {
        let mut trip = Trip::new("Site A", "Boat");
        trip.repairs = vec![item("S1", "a", 80.0), item("S1", "b", 60.0)];

        trip.refresh_priority(PriorityMode::TripMean);
        assert!((trip.priority_score - 70.0).abs() < 1e-10);

        trip.refresh_priority(PriorityMode::TripMax);
        assert!((trip.priority_score - 80.0).abs() < 1e-10);
        assert_eq!(trip.sorted_scores(), vec![80.0, 60.0]);
    }

    #[test]
    fn test_station_aggregate_add() {
        let mut agg = StationAggregate::new(Station::new("S1"));
        agg.add(&Repair::new("S1", "Roof").with_cost(100.0), 2.0);
        agg.add(&Repair::new("S1", "Dock").with_cost(50.0), 1.5);
        assert_eq!(agg.repair_count, 2);
        assert_eq!(agg.total_cost, 150.0);
        assert_eq!(agg.total_days, 3.5);
    }

    #[test]
    fn test_context_table() {
        let mut a = Trip::new("Site A", "Boat");
        a.repairs = vec![item("S1", "Roof", 10.0)];
        let mut b = Trip::new("Site B", "Truck");
        b.repairs = vec![item("S2", "Dock", 20.0)];

        let table = TripContextTable::from_trips(&[a, b]);
        assert_eq!(table.len(), 2);
        let ctx = table.get(&Repair::new("S2", "Dock").key()).unwrap();
        assert_eq!(ctx.trip_location, "Site B");
        assert_eq!(ctx.access_type, "Truck");
    }
}
