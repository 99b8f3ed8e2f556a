//! Literal value substitution.
//!
//! A cell is looked up once in the map as it was before the pass; a
//! replacement is never looked up again. Missing cells never match.

use crate::models::{Table, ValueMap};

/// Apply a map to a column's cells in place. Returns the number of cells
/// whose text changed.
pub fn recode_cells(cells: &mut [Option<String>], map: &ValueMap) -> usize {
    let mut changed = 0;

    for cell in cells.iter_mut() {
        let Some(raw) = cell.as_deref() else {
            continue;
        };
        if let Some(new) = map.get(raw) {
            if new != raw {
                changed += 1;
            }
            *cell = Some(new.to_string());
        }
    }

    changed
}

/// Apply a map to a named column. Returns `None` if the column is absent.
pub fn recode_column(table: &mut Table, column: &str, map: &ValueMap) -> Option<usize> {
    table.cells_mut(column).map(|cells| recode_cells(cells, map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_exact_match_only() {
        let map = ValueMap::from_pairs(vec![("Agree", "1")]);
        let mut cells = some(&["Agree", "Strongly Agree", "agree", " Agree"]);

        let changed = recode_cells(&mut cells, &map);

        assert_eq!(changed, 1);
        assert_eq!(cells, some(&["1", "Strongly Agree", "agree", " Agree"]));
    }

    #[test]
    fn test_missing_cells_pass_through() {
        let map = ValueMap::from_pairs(vec![("", "blank"), ("x", "1")]);
        let mut cells = vec![None, Some("x".to_string()), None];

        recode_cells(&mut cells, &map);

        assert_eq!(cells, vec![None, Some("1".to_string()), None]);
    }

    #[test]
    fn test_swap_is_simultaneous() {
        let map = ValueMap::from_pairs(vec![("A", "B"), ("B", "A")]);
        let mut cells = some(&["A", "B", "C"]);

        recode_cells(&mut cells, &map);

        assert_eq!(cells, some(&["B", "A", "C"]));
    }

    #[test]
    fn test_chain_not_transitive() {
        let map = ValueMap::from_pairs(vec![("1", "2"), ("2", "3")]);
        let mut cells = some(&["1", "2"]);

        recode_cells(&mut cells, &map);

        assert_eq!(cells, some(&["2", "3"]));
    }

    #[test]
    fn test_idempotent_when_keys_and_values_disjoint() {
        let map = ValueMap::from_pairs(vec![("Complete", "1"), ("Partial", "0")]);
        let mut once = some(&["Complete", "Partial", "Other"]);
        recode_cells(&mut once, &map);

        let mut twice = once.clone();
        let changed = recode_cells(&mut twice, &map);

        assert_eq!(changed, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_recode_column_absent() {
        let mut table = Table::new(vec![Column::from_values("A", vec!["x"])]).unwrap();
        let map = ValueMap::from_pairs(vec![("x", "1")]);

        assert_eq!(recode_column(&mut table, "B", &map), None);
        assert_eq!(recode_column(&mut table, "A", &map), Some(1));
        assert_eq!(table.column("A").unwrap().cells, some(&["1"]));
    }
}
