//! Raw row representation shared by the fetcher and the normalization engine.
//!
//! Rows arrive from the store (or from the query endpoint's JSON) as loosely
//! typed records. They are converted once, at the boundary, into [`RawRow`]:
//! a mapping from column name to an optional string. Nothing downstream sees
//! untyped JSON.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// One catalog row: column name to cell text, `None` for SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    cells: HashMap<String, Option<String>>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Option<String>>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Sets a cell.
    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.cells.insert(column.into(), value);
    }

    /// Cell text, `None` when the column is absent or `NULL`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).and_then(|v| v.as_deref())
    }

    /// Whether the row has the column at all, even if `NULL`.
    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Column names in arbitrary order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Renders a JSON scalar the way the catalog would have stored it as text.
fn cell_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

impl<'de> Deserialize<'de> for RawRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let cells = HashMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            cells: cells.into_iter().map(|(k, v)| (k, cell_text(v))).collect(),
        })
    }
}

impl Serialize for RawRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Sorted so the endpoint's JSON is reproducible.
        let mut keys: Vec<&String> = self.cells.keys().collect();
        keys.sort();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            map.serialize_entry(key, &self.cells[key])?;
        }
        map.end()
    }
}

/// Rows grouped by category key, in the order the keys were first seen.
///
/// This is the query endpoint's response shape: `{ "6331": [row, ...], ... }`.
/// Key order is preserved on both serialization and deserialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawResponse {
    groups: Vec<(String, Vec<RawRow>)>,
}

impl RawResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows under a category key, merging with earlier rows for it.
    pub fn extend(&mut self, category_key: impl Into<String>, rows: Vec<RawRow>) {
        let key = category_key.into();
        match self.groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(rows),
            None => self.groups.push((key, rows)),
        }
    }

    /// Rows for one category key; empty when the key is absent.
    pub fn rows(&self, category_key: &str) -> &[RawRow] {
        self.groups
            .iter()
            .find(|(k, _)| k == category_key)
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    /// Category keys in insertion order.
    pub fn category_keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(k, _)| k.as_str())
    }

    /// `(key, rows)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawRow])> {
        self.groups.iter().map(|(k, rows)| (k.as_str(), rows.as_slice()))
    }

    /// Whether no category holds any row.
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|(_, rows)| rows.is_empty())
    }

    /// Total rows across all categories.
    pub fn total_rows(&self) -> usize {
        self.groups.iter().map(|(_, rows)| rows.len()).sum()
    }

    /// Parses the endpoint JSON.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the endpoint JSON.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for RawResponse {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Keys that matched nothing are left out, so an empty result is `{}`.
        let groups: Vec<_> = self.groups.iter().filter(|(_, rows)| !rows.is_empty()).collect();
        let mut map = serializer.serialize_map(Some(groups.len()))?;
        for (key, rows) in groups {
            map.serialize_entry(key, rows)?;
        }
        map.end()
    }
}

struct RawResponseVisitor;

impl<'de> Visitor<'de> for RawResponseVisitor {
    type Value = RawResponse;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an object mapping category keys to arrays of rows")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut response = RawResponse::new();
        while let Some((key, rows)) = access.next_entry::<String, Vec<RawRow>>()? {
            response.extend(key, rows);
        }
        Ok(response)
    }
}

impl<'de> Deserialize<'de> for RawResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RawResponseVisitor)
    }
}
