//! Opaque repair and station records.
//!
//! Repairs and stations arrive from spreadsheet-like sources with free-form
//! columns. Each record keeps its columns as an ordered [`FieldSet`] of
//! `(name, canonical key, value)` entries; lookups match names
//! case- and whitespace-insensitively.
//!
//! # Lookup Precedence
//!
//! [`RecordView`] pairs a repair with its owning station. A named field is
//! searched in this order, first non-blank match wins:
//!
//! 1. the repair's free-form fields
//! 2. the repair's intrinsic attributes (cost, name, station id)
//! 3. the station's fields

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Stations indexed by station identifier.
pub type StationIndex = HashMap<String, Station>;

/// Canonical form of a field name or categorical value.
///
/// Lowercase with every whitespace character removed, so `"Trip Location"`,
/// `"trip location"` and `" TripLocation "` all compare equal.
pub fn canonical(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits a multi-valued cell (`"North/South; East"`) into trimmed, non-empty tokens.
pub fn split_tokens(raw: &str) -> Vec<&str> {
    raw.split(['/', ',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// A single cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric cell.
    Number(f64),
    /// Boolean cell.
    Flag(bool),
    /// Text cell.
    Text(String),
    /// Missing or null cell.
    #[default]
    Empty,
}

impl FieldValue {
    /// Whether the value carries no usable content (null or blank text).
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(n) => !n.is_finite(),
            FieldValue::Flag(_) => false,
        }
    }

    /// Text rendering of the value. `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }
        match self {
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Flag(b) => Some(b.to_string()),
            FieldValue::Text(s) => Some(s.trim().to_string()),
            FieldValue::Empty => None,
        }
    }

    /// Numeric interpretation of the value.
    ///
    /// Text is trimmed, stripped of thousands separators and a leading
    /// currency sign. When the whole text does not parse, the leading
    /// whitespace-delimited token is tried (`"2 days"` → `2.0`).
    /// Returns `None` for anything else.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => parse_number(s, true),
            _ => None,
        }
    }

    /// Numeric interpretation requiring the whole text to be a number.
    ///
    /// Same cleanup as [`as_number`](Self::as_number) without the leading
    /// token fallback, so `"5 km"` and `"5 - 10 years"` are `None`.
    pub fn as_exact_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => parse_number(s, false),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

fn parse_number(raw: &str, leading_token: bool) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(n) = cleaned.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    if !leading_token {
        return None;
    }
    let head = cleaned.split_whitespace().next()?;
    head.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A named cell with its precomputed canonical key.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Name as supplied by the source.
    pub name: String,
    key: String,
    /// Cell value.
    pub value: FieldValue,
}

impl Field {
    /// Creates a field, computing its canonical key.
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let key = canonical(&name);
        Self {
            name,
            key,
            value: value.into(),
        }
    }

    /// Canonical key used for matching.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Ordered collection of free-form fields.
///
/// Serialized as a JSON object; deserialization keeps document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<Field>,
}

impl FieldSet {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Appends a field. Earlier fields with the same canonical name keep precedence.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.entries.push(Field::new(name, value));
    }

    /// First non-blank value whose canonical name equals `canonical(name)`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.get_canonical(&canonical(name))
    }

    /// Lookup by an already-canonical key.
    pub fn get_canonical(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|f| f.key == key && !f.value.is_blank())
            .map(|f| &f.value)
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.entries.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for field in &self.entries {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::new();
                while let Some((name, value)) = access.next_entry::<String, FieldValue>()? {
                    set.insert(name, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FieldSetVisitor)
    }
}

/// Stable identity of a repair across pipeline stages.
///
/// `#<row_index>` when the source row is known, otherwise
/// `<station_id>|<name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepairKey(String);

impl RepairKey {
    /// Key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A candidate repair item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    /// Source row index, when the repair came from a tabular source.
    #[serde(default)]
    pub row_index: Option<usize>,
    /// Owning station identifier.
    pub station_id: String,
    /// Repair name.
    pub name: String,
    /// Estimated cost in currency units.
    #[serde(default)]
    pub cost: f64,
    /// Free-form attributes.
    #[serde(default)]
    pub fields: FieldSet,
}

impl Repair {
    /// Creates a repair with zero cost and no attributes.
    pub fn new(station_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            row_index: None,
            station_id: station_id.into(),
            name: name.into(),
            cost: 0.0,
            fields: FieldSet::new(),
        }
    }

    /// Sets the source row index.
    pub fn with_row_index(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    /// Sets the cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Adds a free-form attribute.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Stable key of this repair.
    pub fn key(&self) -> RepairKey {
        match self.row_index {
            Some(row) => RepairKey(format!("#{row}")),
            None => RepairKey(format!("{}|{}", self.station_id, self.name)),
        }
    }

    /// Looks up a field on the repair alone (free-form fields, then intrinsic attributes).
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let key = canonical(name);
        if let Some(value) = self.fields.get_canonical(&key) {
            return Some(value.clone());
        }
        self.intrinsic(&key)
    }

    fn intrinsic(&self, key: &str) -> Option<FieldValue> {
        let value = match key {
            "cost" | "repaircost" => FieldValue::Number(self.cost),
            "name" | "repairname" => FieldValue::Text(self.name.clone()),
            "stationid" | "station" => FieldValue::Text(self.station_id.clone()),
            _ => return None,
        };
        (!value.is_blank()).then_some(value)
    }
}

/// A station record supplying fallback field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Station identifier.
    pub id: String,
    /// Free-form attributes.
    #[serde(default)]
    pub fields: FieldSet,
}

impl Station {
    /// Creates a station without attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: FieldSet::new(),
        }
    }

    /// Adds an attribute.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value);
        self
    }
}

/// Builds a [`StationIndex`] from a list of stations. The first station per id wins.
pub fn index_stations(stations: impl IntoIterator<Item = Station>) -> StationIndex {
    let mut index = StationIndex::new();
    for station in stations {
        index.entry(station.id.clone()).or_insert(station);
    }
    index
}

/// A repair together with its owning station, for field lookup.
#[derive(Debug, Clone, Copy)]
pub struct RecordView<'a> {
    /// The repair.
    pub repair: &'a Repair,
    /// Owning station, when known.
    pub station: Option<&'a Station>,
}

impl<'a> RecordView<'a> {
    /// Creates a view.
    pub fn new(repair: &'a Repair, station: Option<&'a Station>) -> Self {
        Self { repair, station }
    }

    /// Creates a view, resolving the station from an index.
    pub fn resolve(repair: &'a Repair, stations: &'a StationIndex) -> Self {
        Self::new(repair, stations.get(&repair.station_id))
    }

    /// Field value by name, repair before station.
    pub fn value(&self, name: &str) -> Option<FieldValue> {
        if let Some(value) = self.repair.field(name) {
            return Some(value);
        }
        self.station
            .and_then(|s| s.fields.get(name))
            .cloned()
    }

    /// Text rendering of a field.
    pub fn text(&self, name: &str) -> Option<String> {
        self.value(name).and_then(|v| v.as_text())
    }

    /// Numeric interpretation of a field. Unparseable values are absent.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(|v| v.as_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ignores_case_and_whitespace() {
        assert_eq!(canonical("Trip Location"), "triplocation");
        assert_eq!(canonical("  trip\tLOCATION "), "triplocation");
        assert_eq!(canonical("O&M"), "o&m");
    }

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("North/South; East ,"), vec!["North", "South", "East"]);
        assert!(split_tokens(" ").is_empty());
    }

    #[test]
    fn test_field_value_number_parsing() {
        assert_eq!(FieldValue::from("1,250.5").as_number(), Some(1250.5));
        assert_eq!(FieldValue::from("$300").as_number(), Some(300.0));
        assert_eq!(FieldValue::from("2 days").as_number(), Some(2.0));
        assert_eq!(FieldValue::from("n/a").as_number(), None);
        assert_eq!(FieldValue::Empty.as_number(), None);
        assert_eq!(FieldValue::Flag(true).as_number(), None);
    }

    #[test]
    fn test_field_value_exact_number() {
        assert_eq!(FieldValue::from(" 1,250.5 ").as_exact_number(), Some(1250.5));
        assert_eq!(FieldValue::Number(3.0).as_exact_number(), Some(3.0));
        assert_eq!(FieldValue::from("2 days").as_exact_number(), None);
        assert_eq!(FieldValue::from("5 - 10 years").as_exact_number(), None);
    }

    #[test]
    fn test_field_value_text() {
        assert_eq!(FieldValue::Number(10.0).as_text().as_deref(), Some("10"));
        assert_eq!(FieldValue::Number(10.5).as_text().as_deref(), Some("10.5"));
        assert_eq!(FieldValue::from("  Old ").as_text().as_deref(), Some("Old"));
        assert_eq!(FieldValue::from("   ").as_text(), None);
    }

    #[test]
    fn test_field_set_first_non_blank_wins() {
        let set = FieldSet::new()
            .with("Age", "")
            .with(" age ", "Old")
            .with("AGE", "New");
        assert_eq!(set.get("Age"), Some(&FieldValue::from("Old")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_field_set_json_keeps_order() {
        let set: FieldSet =
            serde_json::from_str(r#"{"Zeta": 1, "alpha": "x", "Alpha": "y", "empty": null}"#)
                .unwrap();
        let names: Vec<&str> = set.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "alpha", "Alpha", "empty"]);
        assert_eq!(set.get("ALPHA"), Some(&FieldValue::from("x")));
        assert_eq!(set.get("empty"), None);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"Zeta":1.0,"alpha":"x","Alpha":"y","empty":null}"#);
    }

    #[test]
    fn test_repair_key() {
        let with_row = Repair::new("S1", "Roof").with_row_index(7);
        let without_row = Repair::new("S1", "Roof");
        assert_eq!(with_row.key().as_str(), "#7");
        assert_eq!(without_row.key().as_str(), "S1|Roof");
    }

    #[test]
    fn test_repair_intrinsic_fields() {
        let repair = Repair::new("S1", "Roof").with_cost(1200.0);
        assert_eq!(repair.field("Repair Cost"), Some(FieldValue::Number(1200.0)));
        assert_eq!(repair.field("station id"), Some(FieldValue::from("S1")));
        assert_eq!(repair.field("Unknown"), None);

        let overridden = repair.with_field("Cost", 99.0);
        assert_eq!(overridden.field("cost"), Some(FieldValue::Number(99.0)));
    }

    #[test]
    fn test_record_view_precedence() {
        let station = Station::new("S1")
            .with_field("Trip Location", "Harbor")
            .with_field("Access Type", "Boat");
        let repair = Repair::new("S1", "Roof").with_field("Access Type", "Truck");
        let view = RecordView::new(&repair, Some(&station));

        assert_eq!(view.text("access type").as_deref(), Some("Truck"));
        assert_eq!(view.text("TRIP LOCATION").as_deref(), Some("Harbor"));
        assert_eq!(view.text("Region"), None);
    }

    #[test]
    fn test_record_view_blank_falls_back_to_station() {
        let station = Station::new("S1").with_field("Region", "North");
        let repair = Repair::new("S1", "Roof").with_field("Region", " ");
        let view = RecordView::new(&repair, Some(&station));
        assert_eq!(view.text("Region").as_deref(), Some("North"));
    }

    #[test]
    fn test_index_stations_first_wins() {
        let index = index_stations(vec![
            Station::new("S1").with_field("Region", "North"),
            Station::new("S1").with_field("Region", "South"),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index["S1"].fields.get("region"),
            Some(&FieldValue::from("North"))
        );
    }

    #[test]
    fn test_repair_deserialize() {
        let repair: Repair = serde_json::from_str(
            r#"{"row_index": 3, "station_id": "S9", "name": "Dock", "cost": 500,
                "fields": {"Age": "Old", "Days": "2"}}"#,
        )
        .unwrap();
        assert_eq!(repair.row_index, Some(3));
        assert_eq!(repair.cost, 500.0);
        assert_eq!(repair.field("days").and_then(|v| v.as_number()), Some(2.0));
    }
}
