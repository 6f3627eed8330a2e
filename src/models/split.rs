//! Funding split maps.
//!
//! A funding split expression apportions a repair's cost across funding sources:
//!
//! ```text
//! "50%F-50%P"   →  { f: 0.5, p: 0.5 }
//! "Capital: 100% F" → { f: 1.0 }
//! ```
//!
//! Segments are separated by `-`; each segment must end in
//! `<number>%<source-token>`. Malformed segments are skipped. An expression with no
//! valid segment yields no map.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::record::{canonical, RecordView};

const SEGMENT_PATTERN: &str = r"(\d+(?:\.\d+)?)\s*%\s*([A-Za-z][A-Za-z0-9&]*)\s*$";

fn segment_regex() -> Option<&'static Regex> {
    static SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();
    SEGMENT
        .get_or_init(|| match Regex::new(SEGMENT_PATTERN) {
            Ok(re) => Some(re),
            Err(err) => {
                log::error!("internal error building funding split regex: {err}");
                None
            }
        })
        .as_ref()
}

/// Funding source token → fraction of cost.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitMap(BTreeMap<String, f64>);

impl SplitMap {
    /// Parses a split expression. Returns `None` when no segment is valid.
    pub fn parse(raw: &str) -> Option<Self> {
        let re = segment_regex()?;
        let mut fractions: BTreeMap<String, f64> = BTreeMap::new();
        for segment in raw.split('-') {
            let Some(caps) = re.captures(segment) else {
                continue;
            };
            let Ok(percent) = caps[1].parse::<f64>() else {
                continue;
            };
            *fractions.entry(canonical(&caps[2])).or_default() += percent / 100.0;
        }
        (!fractions.is_empty()).then_some(Self(fractions))
    }

    /// Resolves the split map of a repair from the first of `fields` that
    /// parses (repair before station for each field).
    pub fn resolve<S: AsRef<str>>(view: &RecordView<'_>, fields: &[S]) -> Option<Self> {
        fields
            .iter()
            .filter_map(|field| view.text(field.as_ref()))
            .find_map(|text| Self::parse(&text))
    }

    /// Fraction for a funding source token (matched canonically).
    pub fn fraction(&self, source: &str) -> Option<f64> {
        self.0.get(&canonical(source)).copied()
    }

    /// Apportions `cost` across the sources.
    pub fn apply(&self, cost: f64) -> BTreeMap<String, f64> {
        self.0
            .iter()
            .map(|(source, fraction)| (source.clone(), cost * fraction))
            .collect()
    }

    /// Sum of all fractions.
    pub fn total_fraction(&self) -> f64 {
        self.0.values().sum()
    }

    /// Iterates `(source, fraction)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no sources.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Adds `amounts` into `totals`, source by source.
pub(crate) fn accumulate(totals: &mut BTreeMap<String, f64>, amounts: &BTreeMap<String, f64>) {
    for (source, amount) in amounts {
        *totals.entry(source.clone()).or_default() += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Repair, Station};

    #[test]
    fn test_parse_two_sources() {
        let split = SplitMap::parse("50%F-50%P").unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split.fraction("f"), Some(0.5));
        assert_eq!(split.fraction("P"), Some(0.5));
        assert!((split.total_fraction() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_skips_malformed_segments() {
        let split = SplitMap::parse("70% F - garbage - 30 %Prov").unwrap();
        assert_eq!(split.fraction("f"), Some(0.7));
        assert_eq!(split.fraction("prov"), Some(0.3));
        assert_eq!(split.len(), 2);
    }

    #[test]
    fn test_parse_trailing_pattern_with_prefix() {
        let split = SplitMap::parse("Capital 100%F").unwrap();
        assert_eq!(split.fraction("f"), Some(1.0));
    }

    #[test]
    fn test_parse_repeated_token_accumulates() {
        let split = SplitMap::parse("25%F-25%F-50%P").unwrap();
        assert_eq!(split.fraction("f"), Some(0.5));
    }

    #[test]
    fn test_parse_no_valid_segment() {
        assert!(SplitMap::parse("").is_none());
        assert!(SplitMap::parse("federal").is_none());
        assert!(SplitMap::parse("50-50").is_none());
    }

    #[test]
    fn test_apply_conserves_cost() {
        let split = SplitMap::parse("50%F-50%P").unwrap();
        let amounts = split.apply(1000.0);
        assert_eq!(amounts["f"], 500.0);
        assert_eq!(amounts["p"], 500.0);
        let total: f64 = amounts.values().sum();
        assert!((total - 1000.0).abs() < 1e-10);
    }

    #[test]
    fn test_resolve_first_populated_field() {
        let station = Station::new("S1").with_field("Capital", "100%P");
        let repair = Repair::new("S1", "Roof").with_field("O&M", "not a split");
        let view = RecordView::new(&repair, Some(&station));
        let split = SplitMap::resolve(&view, &["O&M", "Capital", "Decommission"]).unwrap();
        assert_eq!(split.fraction("p"), Some(1.0));

        let repair = Repair::new("S1", "Roof").with_field("o & m", "40%F-60%P");
        let view = RecordView::new(&repair, Some(&station));
        let split = SplitMap::resolve(&view, &["O&M", "Capital"]).unwrap();
        assert_eq!(split.fraction("f"), Some(0.4));
    }

    #[test]
    fn test_accumulate() {
        let mut totals = BTreeMap::new();
        accumulate(&mut totals, &SplitMap::parse("50%F-50%P").unwrap().apply(100.0));
        accumulate(&mut totals, &SplitMap::parse("100%F").unwrap().apply(10.0));
        assert_eq!(totals["f"], 60.0);
        assert_eq!(totals["p"], 50.0);
    }
}
