//! Domain models for the recoding workflow.
//!
//! This module contains the core data structures used throughout the crate:
//!
//! - [`Table`] - Ordered named columns of text cells
//! - [`Column`] - A single named column
//! - [`ValueMap`] - Literal value substitution table for one column
//! - [`MappingSet`] - Column name to [`ValueMap`] collection
//! - [`Decision`] - Operator choice for a column

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::TableError;

// =============================================================================
// Table
// =============================================================================

/// A single named column. `None` cells are missing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Option<String>>,
}

impl Column {
    /// Create a column from its name and cells.
    pub fn new(name: impl Into<String>, cells: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// Create a column where every cell is present.
    pub fn from_values<S: Into<String>>(name: impl Into<String>, values: Vec<S>) -> Self {
        Self::new(name, values.into_iter().map(|v| Some(v.into())).collect())
    }

    /// Distinct cell values in first-seen order.
    pub fn distinct(&self) -> Vec<Option<&str>> {
        let mut seen = HashSet::new();
        self.cells
            .iter()
            .map(Option::as_deref)
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }
}

/// An ordered sequence of uniquely named columns with a uniform row count.
///
/// The invariants are checked on construction and preserved by every
/// mutating method: cells may be rewritten and whole columns dropped,
/// but rows are never added or removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking name uniqueness and row count uniformity.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut names = HashSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(bad) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(TableError::RaggedColumn {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.cells.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a mutable view of a column's cells by name.
    ///
    /// Only the cells are exposed so the row count cannot drift.
    pub fn cells_mut(&mut self, name: &str) -> Option<&mut [Option<String>]> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_mut_slice())
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Check whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.cells.len())
    }

    /// Iterate over rows as slices of borrowed cells.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&str>>> + '_ {
        (0..self.row_count()).map(move |i| {
            self.columns
                .iter()
                .map(|c| c.cells[i].as_deref())
                .collect()
        })
    }

    /// Remove the named columns, returning the names actually removed
    /// in table order.
    pub fn drop_columns(&mut self, names: &[&str]) -> Vec<String> {
        let mut removed = Vec::new();
        self.columns.retain(|c| {
            if names.contains(&c.name.as_str()) {
                removed.push(c.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}

// =============================================================================
// Value Map
// =============================================================================

/// A literal substitution table from raw cell text to replacement text.
///
/// Keys are unique. Serializes as a plain JSON object of strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(BTreeMap<String, String>);

impl ValueMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from (old, new) pairs. A repeated old value keeps the
    /// last replacement given.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Insert or overwrite a substitution.
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.0.insert(old.into(), new.into());
    }

    /// Look up the replacement for a raw value.
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.0.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (old, new) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// =============================================================================
// Mapping Set
// =============================================================================

/// One [`ValueMap`] per column name.
///
/// Serializes as `{ "column": { "raw": "new", ... }, ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSet(BTreeMap<String, ValueMap>);

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column's map, replacing any earlier one.
    pub fn insert(&mut self, column: impl Into<String>, map: ValueMap) {
        self.0.insert(column.into(), map);
    }

    pub fn get(&self, column: &str) -> Option<&ValueMap> {
        self.0.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in sorted order.
    pub fn columns(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueMap)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ValueMap)> for MappingSet {
    fn from_iter<I: IntoIterator<Item = (String, ValueMap)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// Decision
// =============================================================================

/// The operator's choice for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Leave the column unchanged.
    Skip,
    /// Enter a fresh value map for the column.
    RecodeNew,
    /// Apply the map used for the last freshly recoded column.
    RepeatPrevious,
}

impl Decision {
    /// Accepted answers, as shown to the operator.
    pub const CHOICES: &'static str = "y/n/p";
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "y" => Ok(Decision::RecodeNew),
            "n" => Ok(Decision::Skip),
            // "ap" is the legacy spelling of "apply previous"
            "p" | "ap" => Ok(Decision::RepeatPrevious),
            other => Err(format!(
                "Invalid input '{}', please enter 'y', 'n', or 'p'.",
                other
            )),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Skip => "skip",
            Decision::RecodeNew => "recode",
            Decision::RepeatPrevious => "repeat previous",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::from_values("A", vec!["1"]),
            Column::from_values("A", vec!["2"]),
        ]);
        assert_eq!(result, Err(TableError::DuplicateColumn("A".into())));
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::from_values("A", vec!["1", "2"]),
            Column::from_values("B", vec!["1"]),
        ]);
        assert!(matches!(result, Err(TableError::RaggedColumn { .. })));
    }

    #[test]
    fn test_drop_columns_keeps_rows() {
        let mut table = Table::new(vec![
            Column::from_values("A", vec!["1", "2"]),
            Column::from_values("B", vec!["3", "4"]),
            Column::from_values("C", vec!["5", "6"]),
        ])
        .unwrap();

        let removed = table.drop_columns(&["C", "A", "Missing"]);

        assert_eq!(removed, vec!["A", "C"]);
        assert_eq!(table.column_names(), vec!["B"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_distinct_first_seen_order() {
        let column = Column::new(
            "Q",
            vec![
                Some("b".into()),
                None,
                Some("a".into()),
                Some("b".into()),
                None,
            ],
        );
        assert_eq!(column.distinct(), vec![Some("b"), None, Some("a")]);
        assert_eq!(column.missing_count(), 2);
    }

    #[test]
    fn test_value_map_last_pair_wins() {
        let map = ValueMap::from_pairs(vec![("x", "1"), ("y", "2"), ("x", "3")]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x"), Some("3"));
    }

    #[test]
    fn test_mapping_set_overwrites_column() {
        let mut set = MappingSet::new();
        set.insert("Q1", ValueMap::from_pairs(vec![("a", "1")]));
        set.insert("Q1", ValueMap::from_pairs(vec![("b", "2")]));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Q1").and_then(|m| m.get("b")), Some("2"));
        assert!(set.get("Q1").and_then(|m| m.get("a")).is_none());
    }

    #[test]
    fn test_mapping_set_wire_format() {
        let mut set = MappingSet::new();
        set.insert(
            "Status",
            ValueMap::from_pairs(vec![("Complete", "1"), ("Partial", "0")]),
        );
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Status": {"Complete": "1", "Partial": "0"}})
        );
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("y".parse::<Decision>(), Ok(Decision::RecodeNew));
        assert_eq!(" N ".parse::<Decision>(), Ok(Decision::Skip));
        assert_eq!("p".parse::<Decision>(), Ok(Decision::RepeatPrevious));
        assert_eq!("AP".parse::<Decision>(), Ok(Decision::RepeatPrevious));
        assert!("yes".parse::<Decision>().is_err());
        assert!("".parse::<Decision>().is_err());
    }
}
