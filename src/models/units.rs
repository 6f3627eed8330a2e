//! Time units and comparison operators for hard constraints.
//!
//! Temporal values are normalized to hours before comparison:
//!
//! | Unit | Hours |
//! |------|-------|
//! | hour | 1 |
//! | day | 24 |
//! | week | 168 |
//! | month | 720 (30-day approximation) |
//! | year | 8760 (365-day approximation) |

use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::canonical;

/// Duration unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Hours (canonical unit).
    #[default]
    Hours,
    /// Days.
    Days,
    /// Weeks.
    Weeks,
    /// Months (30 days).
    Months,
    /// Years (365 days).
    Years,
}

impl TimeUnit {
    /// Number of hours in one unit.
    pub fn hours(self) -> f64 {
        match self {
            TimeUnit::Hours => 1.0,
            TimeUnit::Days => 24.0,
            TimeUnit::Weeks => 168.0,
            TimeUnit::Months => 720.0,
            TimeUnit::Years => 8760.0,
        }
    }

    /// Converts `value` in this unit to hours.
    #[inline]
    pub fn to_hours(self, value: f64) -> f64 {
        value * self.hours()
    }

    /// Parses a configured unit label (`"days"`, `"Week"`, `"hrs"`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        match canonical(raw).as_str() {
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            "w" | "wk" | "wks" | "week" | "weeks" => Some(TimeUnit::Weeks),
            "mo" | "mos" | "month" | "months" => Some(TimeUnit::Months),
            "y" | "yr" | "yrs" | "year" | "years" => Some(TimeUnit::Years),
            _ => None,
        }
    }

    /// Infers a unit from a field name such as `"Days"` or `"Duration (weeks)"`.
    ///
    /// The unit word occurring earliest in the name wins.
    pub fn infer_from_field(field_name: &str) -> Option<Self> {
        const WORDS: [(&str, TimeUnit); 6] = [
            ("hour", TimeUnit::Hours),
            ("hrs", TimeUnit::Hours),
            ("day", TimeUnit::Days),
            ("week", TimeUnit::Weeks),
            ("month", TimeUnit::Months),
            ("year", TimeUnit::Years),
        ];
        let name = canonical(field_name);
        WORDS
            .iter()
            .filter_map(|(word, unit)| name.find(word).map(|pos| (pos, *unit)))
            .min_by_key(|(pos, _)| *pos)
            .map(|(_, unit)| unit)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        };
        f.write_str(label)
    }
}

/// Comparison operator of a per-item constraint: `value <op> limit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `<`
    #[serde(rename = "<")]
    Less,
    /// `<=`
    #[default]
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `=`
    #[serde(rename = "=")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    const EPSILON: f64 = 1e-9;

    /// Parses an operator symbol. Returns `None` for unrecognized input.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "<" => Some(Comparison::Less),
            "<=" | "=<" | "≤" => Some(Comparison::LessOrEqual),
            ">" => Some(Comparison::Greater),
            ">=" | "=>" | "≥" => Some(Comparison::GreaterOrEqual),
            "=" | "==" => Some(Comparison::Equal),
            "!=" | "<>" | "≠" => Some(Comparison::NotEqual),
            _ => None,
        }
    }

    /// Evaluates `value <op> limit`. Equality uses a small absolute tolerance.
    pub fn holds(self, value: f64, limit: f64) -> bool {
        let equal = (value - limit).abs() <= Self::EPSILON;
        match self {
            Comparison::Less => value < limit && !equal,
            Comparison::LessOrEqual => value < limit || equal,
            Comparison::Greater => value > limit && !equal,
            Comparison::GreaterOrEqual => value > limit || equal,
            Comparison::Equal => equal,
            Comparison::NotEqual => !equal,
        }
    }

    /// Operator symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessOrEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterOrEqual => ">=",
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
