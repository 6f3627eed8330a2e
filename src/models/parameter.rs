//! Soft (scoring) parameters and the overall weight vector.
//!
//! A parameter catalog is built from flat rows, one per option:
//!
//! | parameter | condition | max_weight | option | weight |
//! |-----------|-----------|------------|--------|--------|
//! | Age | Asset age | 10 | Old | 10 |
//! | Age | | | New | 2 |
//! | Material | | | Steel | 5 |
//!
//! Rows sharing a parameter name collapse into one [`SoftParameter`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::record::{canonical, FieldValue};

/// A raw catalog row as supplied by the parameter provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    /// Parameter name (e.g., "Age").
    pub parameter: String,
    /// Free-text description of what the parameter measures.
    #[serde(default)]
    pub condition: String,
    /// Explicit maximum option weight, if supplied.
    #[serde(default)]
    pub max_weight: Option<f64>,
    /// Option label (text or number).
    #[serde(default)]
    pub option: FieldValue,
    /// Option weight.
    #[serde(default)]
    pub weight: f64,
}

impl ParameterRow {
    /// Creates a row.
    pub fn new(parameter: impl Into<String>, option: impl Into<FieldValue>, weight: f64) -> Self {
        Self {
            parameter: parameter.into(),
            condition: String::new(),
            max_weight: None,
            option: option.into(),
            weight,
        }
    }

    /// Sets the explicit maximum weight.
    pub fn with_max_weight(mut self, max_weight: f64) -> Self {
        self.max_weight = Some(max_weight);
        self
    }

    /// Sets the condition description.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }
}

/// A weighted option of a soft parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "OptionRecord")]
pub struct OptionWeight {
    /// Option label as supplied.
    pub label: String,
    /// Weight awarded when a repair's value matches this option.
    pub weight: f64,
    #[serde(skip)]
    key: String,
    #[serde(skip)]
    numeric: Option<f64>,
}

#[derive(Deserialize)]
struct OptionRecord {
    label: String,
    weight: f64,
}

impl From<OptionRecord> for OptionWeight {
    fn from(record: OptionRecord) -> Self {
        Self::new(record.label, record.weight)
    }
}

impl OptionWeight {
    fn new(label: String, weight: f64) -> Self {
        let key = canonical(&label);
        let numeric = FieldValue::Text(label.clone()).as_exact_number();
        Self {
            label,
            weight,
            key,
            numeric,
        }
    }
}

/// A weighted scoring criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftParameter {
    /// Parameter name (also the field name looked up on repairs/stations).
    pub name: String,
    /// Description.
    pub condition: String,
    /// Normalizing maximum weight. Always positive.
    pub max_weight: f64,
    /// Options in first-seen order.
    pub options: Vec<OptionWeight>,
}

impl SoftParameter {
    /// Weight of the option matching `value`.
    ///
    /// Exact canonical-string match first, then numeric equality
    /// (`"10"` matches option `"10.0"`).
    pub fn option_weight(&self, value: &FieldValue) -> Option<f64> {
        let text = value.as_text()?;
        let key = canonical(&text);
        if let Some(option) = self.options.iter().find(|o| o.key == key) {
            return Some(option.weight);
        }
        let number = value.as_exact_number()?;
        self.options
            .iter()
            .find(|o| o.numeric.is_some_and(|n| (n - number).abs() < 1e-9))
            .map(|o| o.weight)
    }
}

/// Collection of soft parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterCatalog {
    parameters: Vec<SoftParameter>,
}

impl ParameterCatalog {
    /// Collapses rows by canonical parameter name.
    ///
    /// Rows with a blank parameter name or blank option are skipped. Later
    /// rows with the same option label overwrite earlier weights. The
    /// maximum weight is the first explicit positive `max_weight`, else
    /// the largest option weight, never below 1.
    pub fn from_rows(rows: &[ParameterRow]) -> Self {
        struct Acc {
            name: String,
            condition: String,
            explicit_max: Option<f64>,
            options: Vec<OptionWeight>,
        }

        let mut order: Vec<Acc> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let name = row.parameter.trim();
            if name.is_empty() {
                continue;
            }
            let slot = *index.entry(canonical(name)).or_insert_with(|| {
                order.push(Acc {
                    name: name.to_string(),
                    condition: String::new(),
                    explicit_max: None,
                    options: Vec::new(),
                });
                order.len() - 1
            });
            let acc = &mut order[slot];

            if acc.condition.is_empty() && !row.condition.trim().is_empty() {
                acc.condition = row.condition.trim().to_string();
            }
            if acc.explicit_max.is_none() {
                acc.explicit_max = row.max_weight.filter(|m| m.is_finite() && *m > 0.0);
            }
            let Some(label) = row.option.as_text() else {
                continue;
            };
            let weight = if row.weight.is_finite() { row.weight } else { 0.0 };
            let option = OptionWeight::new(label, weight);
            match acc.options.iter_mut().find(|o| o.key == option.key) {
                Some(existing) => *existing = option,
                None => acc.options.push(option),
            }
        }

        let parameters = order
            .into_iter()
            .map(|acc| {
                let observed = acc
                    .options
                    .iter()
                    .map(|o| o.weight)
                    .fold(f64::NEG_INFINITY, f64::max);
                let max_weight = acc.explicit_max.unwrap_or_else(|| observed.max(1.0));
                SoftParameter {
                    name: acc.name,
                    condition: acc.condition,
                    max_weight,
                    options: acc.options,
                }
            })
            .collect();

        Self { parameters }
    }

    /// Parameters in first-seen order.
    pub fn parameters(&self) -> &[SoftParameter] {
        &self.parameters
    }

    /// Finds a parameter by name (canonical match).
    pub fn get(&self, name: &str) -> Option<&SoftParameter> {
        let key = canonical(name);
        self.parameters.iter().find(|p| canonical(&p.name) == key)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// Overall importance weights normalized over a catalog.
///
/// `fractions[i]` belongs to `catalog.parameters()[i]` and all fractions sum
/// to 1 (unless the catalog is empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Normalized fraction per catalog parameter.
    pub fractions: Vec<f64>,
    /// Whether equal weighting was used because no positive weight was supplied.
    pub equal_fallback: bool,
}

impl WeightVector {
    /// Normalizes `weights` (keyed by parameter name, matched canonically).
    ///
    /// Negative, non-finite and missing weights count as zero. When the
    /// total is zero every catalog parameter gets `1/n`.
    pub fn normalize(catalog: &ParameterCatalog, weights: &HashMap<String, f64>) -> Self {
        let by_key: HashMap<String, f64> = weights
            .iter()
            .map(|(name, w)| (canonical(name), *w))
            .collect();

        let raw: Vec<f64> = catalog
            .parameters()
            .iter()
            .map(|p| {
                by_key
                    .get(&canonical(&p.name))
                    .copied()
                    .filter(|w| w.is_finite() && *w > 0.0)
                    .unwrap_or(0.0)
            })
            .collect();

        let total: f64 = raw.iter().sum();
        if total > 0.0 {
            Self {
                fractions: raw.iter().map(|w| w / total).collect(),
                equal_fallback: false,
            }
        } else {
            let n = raw.len();
            Self {
                fractions: vec![if n == 0 { 0.0 } else { 1.0 / n as f64 }; n],
                equal_fallback: true,
            }
        }
    }

    /// Fraction of the parameter at `index`.
    pub fn fraction(&self, index: usize) -> f64 {
        self.fractions.get(index).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rows() -> Vec<ParameterRow> {
        vec![
            ParameterRow::new("Age", "Old", 10.0)
                .with_max_weight(10.0)
                .with_condition("Asset age"),
            ParameterRow::new("Age", "New", 2.0),
            ParameterRow::new("Material", "Steel", 5.0),
            ParameterRow::new("material ", "Wood", 1.0),
        ]
    }

    #[test]
    fn test_catalog_collapses_rows() {
        let catalog = ParameterCatalog::from_rows(&sample_rows());
        assert_eq!(catalog.len(), 2);

        let age = catalog.get("age").unwrap();
        assert_eq!(age.condition, "Asset age");
        assert_eq!(age.max_weight, 10.0);
        assert_eq!(age.options.len(), 2);

        let material = catalog.get("MATERIAL").unwrap();
        assert_eq!(material.name, "Material");
        assert_eq!(material.max_weight, 5.0);
    }

    #[test]
    fn test_catalog_max_weight_minimum_one() {
        let catalog = ParameterCatalog::from_rows(&[
            ParameterRow::new("Flag", "Yes", 0.5),
            ParameterRow::new("Flag", "No", 0.0),
        ]);
        assert_eq!(catalog.get("Flag").unwrap().max_weight, 1.0);
    }

    #[test]
    fn test_catalog_ignores_non_positive_explicit_max() {
        let catalog =
            ParameterCatalog::from_rows(&[ParameterRow::new("Risk", "High", 4.0).with_max_weight(0.0)]);
        assert_eq!(catalog.get("Risk").unwrap().max_weight, 4.0);
    }

    #[test]
    fn test_catalog_later_option_overwrites() {
        let catalog = ParameterCatalog::from_rows(&[
            ParameterRow::new("Age", "Old", 3.0),
            ParameterRow::new("Age", "old", 7.0),
        ]);
        let age = catalog.get("Age").unwrap();
        assert_eq!(age.options.len(), 1);
        assert_eq!(age.options[0].weight, 7.0);
    }

    #[test]
    fn test_catalog_skips_blank_rows() {
        let catalog = ParameterCatalog::from_rows(&[
            ParameterRow::new("  ", "Old", 3.0),
            ParameterRow::new("Age", FieldValue::Empty, 3.0),
        ]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("Age").unwrap().options.is_empty());
    }

    #[test]
    fn test_option_weight_exact_and_numeric() {
        let catalog = ParameterCatalog::from_rows(&[
            ParameterRow::new("Size", "10.0", 4.0),
            ParameterRow::new("Size", "Large Item", 6.0),
        ]);
        let size = catalog.get("Size").unwrap();
        assert_eq!(size.option_weight(&FieldValue::from("10")), Some(4.0));
        assert_eq!(size.option_weight(&FieldValue::Number(10.0)), Some(4.0));
        assert_eq!(size.option_weight(&FieldValue::from("large item")), Some(6.0));
        assert_eq!(size.option_weight(&FieldValue::from("11")), None);
        assert_eq!(size.option_weight(&FieldValue::Empty), None);
    }

    #[test]
    fn test_option_weight_range_labels_need_exact_text() {
        let catalog = ParameterCatalog::from_rows(&[
            ParameterRow::new("Age", "5 - 10 years", 5.0),
            ParameterRow::new("Age", "10 - 20 years", 10.0),
        ]);
        let age = catalog.get("Age").unwrap();
        assert_eq!(age.option_weight(&FieldValue::from("5 - 10 years")), Some(5.0));
        assert_eq!(age.option_weight(&FieldValue::from("5 km")), None);
        assert_eq!(age.option_weight(&FieldValue::from("5")), None);
        assert_eq!(age.option_weight(&FieldValue::from("10")), None);
        assert_eq!(age.option_weight(&FieldValue::Number(10.0)), None);
    }

    #[test]
    fn test_catalog_json_roundtrip_keeps_matching() {
        let catalog = ParameterCatalog::from_rows(&sample_rows());
        let json = serde_json::to_string(&catalog).unwrap();
        let restored: ParameterCatalog = serde_json::from_str(&json).unwrap();
        let age = restored.get("Age").unwrap();
        assert_eq!(age.option_weight(&FieldValue::from("OLD")), Some(10.0));
    }

    #[test]
    fn test_weights_normalize() {
        let catalog = ParameterCatalog::from_rows(&sample_rows());
        let weights = HashMap::from([("age".to_string(), 3.0), ("Material".to_string(), 2.0)]);
        let vector = WeightVector::normalize(&catalog, &weights);
        assert!(!vector.equal_fallback);
        assert!((vector.fraction(0) - 0.6).abs() < 1e-10);
        assert!((vector.fraction(1) - 0.4).abs() < 1e-10);
        let sum: f64 = vector.fractions.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_weights_equal_fallback() {
        let catalog = ParameterCatalog::from_rows(&sample_rows());
        let weights = HashMap::from([("Age".to_string(), -1.0), ("Other".to_string(), 5.0)]);
        let vector = WeightVector::normalize(&catalog, &weights);
        assert!(vector.equal_fallback);
        assert_eq!(vector.fractions, vec![0.5, 0.5]);
    }

    #[test]
    fn test_weights_empty_catalog() {
        let vector = WeightVector::normalize(&ParameterCatalog::default(), &HashMap::new());
        assert!(vector.fractions.is_empty());
        assert_eq!(vector.fraction(3), 0.0);
    }
}
