//! Scored repair (pipeline item).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::{Repair, RepairKey};

/// Contribution of one soft parameter to a repair's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterScore {
    /// Parameter name.
    pub parameter: String,
    /// Value found on the repair or its station.
    pub value: Option<String>,
    /// Weight of the matched option.
    pub option_weight: Option<f64>,
    /// Parameter maximum weight.
    pub max_weight: f64,
    /// Normalized overall fraction of the parameter.
    pub overall_fraction: f64,
    /// Fraction after renormalization over present parameters.
    pub effective_fraction: f64,
    /// `(option_weight / max_weight) * effective_fraction`.
    pub contribution: f64,
    /// Whether the value matched an option.
    pub matched: bool,
}

/// A repair with its computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRepair {
    /// Source row index.
    pub row_index: Option<usize>,
    /// Owning station.
    pub station_id: String,
    /// Repair name.
    pub repair_name: String,
    /// Repair cost.
    pub cost: f64,
    /// Cost per funding source.
    pub split_amounts: BTreeMap<String, f64>,
    /// Score in [0, 100], two decimals.
    pub score: f64,
    /// 1-based rank after sorting (0 when unscored).
    pub rank: usize,
    /// Per-parameter breakdown.
    pub details: Vec<ParameterScore>,
    /// The untouched input repair.
    pub original_repair: Repair,
}

impl ScoredRepair {
    /// Wraps a raw repair without scoring it (score 0, rank 0).
    pub fn unscored(repair: Repair) -> Self {
        Self {
            row_index: repair.row_index,
            station_id: repair.station_id.clone(),
            repair_name: repair.name.clone(),
            cost: repair.cost,
            split_amounts: BTreeMap::new(),
            score: 0.0,
            rank: 0,
            details: Vec::new(),
            original_repair: repair,
        }
    }

    /// Stable key of the underlying repair.
    pub fn key(&self) -> RepairKey {
        self.original_repair.key()
    }
}

impl From<Repair> for ScoredRepair {
    fn from(repair: Repair) -> Self {
        Self::unscored(repair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscored_wraps_repair() {
        let repair = Repair::new("S1", "Roof").with_cost(250.0).with_row_index(4);
        let item = ScoredRepair::unscored(repair.clone());
        assert_eq!(item.station_id, "S1");
        assert_eq!(item.repair_name, "Roof");
        assert_eq!(item.cost, 250.0);
        assert_eq!(item.score, 0.0);
        assert_eq!(item.rank, 0);
        assert_eq!(item.key(), repair.key());
        assert_eq!(item.original_repair, repair);
    }
}
