//! Recode Session - resolve and apply one decision per column.
//!
//! Two modes:
//!
//! - **Replay**: apply a known [`MappingSet`] to a table, no questions asked.
//! - **Interactive**: walk the columns in table order, ask the operator for
//!   a [`Decision`] per column, and build up a new [`MappingSet`].
//!
//! ```text
//! for each column:
//!   show preview ─▶ decision ─┬─ n ─▶ leave as is
//!                             ├─ y ─▶ read pairs ─▶ apply ─▶ remember as previous
//!                             └─ p ─▶ apply previous (if any)
//! ```

pub mod prompter;
pub mod substitute;

use crate::config::DEFAULT_SAMPLE_ROWS;
use crate::error::PromptResult;
use crate::logs::{log_info, log_success_indent, log_warning};
use crate::models::{Decision, MappingSet, Table, ValueMap};

pub use prompter::{ColumnPreview, ConsolePrompter, Prompter, ScriptedPrompter};
pub use substitute::{recode_cells, recode_column};

/// What happened to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnOutcome {
    /// A map from a supplied mapping set was applied
    Replayed,
    /// A fresh map was entered and applied
    Recoded,
    /// The previous map was applied again
    RepeatedPrevious,
    /// Left unchanged on request
    Skipped,
    /// Repeat was requested before any map existed; left unchanged
    RepeatWithoutPrevious,
}

/// Per-column result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReport {
    pub column: String,
    pub outcome: ColumnOutcome,
    /// Cells whose text changed
    pub changed: usize,
}

/// Summary of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Columns in the order they were handled
    pub columns: Vec<ColumnReport>,
    /// Mapping set columns not found in the table (replay only)
    pub missing: Vec<String>,
}

impl SessionReport {
    /// Report entry for a column, if it was handled.
    pub fn outcome(&self, column: &str) -> Option<ColumnOutcome> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| c.outcome)
    }

    /// Total number of changed cells.
    pub fn changed_cells(&self) -> usize {
        self.columns.iter().map(|c| c.changed).sum()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let recoded = self
            .columns
            .iter()
            .filter(|c| {
                matches!(
                    c.outcome,
                    ColumnOutcome::Replayed | ColumnOutcome::Recoded | ColumnOutcome::RepeatedPrevious
                )
            })
            .count();
        format!(
            "Recoded: {} columns, {} cells changed, {} columns left as is, {} mapped columns missing",
            recoded,
            self.changed_cells(),
            self.columns.len() - recoded,
            self.missing.len()
        )
    }
}

/// Apply a mapping set to a table.
///
/// Columns in both the table and the set are recoded; set columns absent
/// from the table are reported and ignored; other columns are untouched.
pub fn replay(table: &mut Table, mappings: &MappingSet) -> SessionReport {
    let mut report = SessionReport::default();

    let names: Vec<String> = table.column_names().into_iter().map(str::to_string).collect();
    for name in names {
        let Some(map) = mappings.get(&name) else {
            continue;
        };
        let changed = recode_column(table, &name, map).unwrap_or(0);
        log_success_indent(
            format!("Recode mapping applied to column '{}' ({} cells changed)", name, changed),
            1,
        );
        report.columns.push(ColumnReport {
            column: name,
            outcome: ColumnOutcome::Replayed,
            changed,
        });
    }

    for (column, _) in mappings.iter() {
        if !table.has_column(column) {
            log_warning(format!("Column '{}' not found in the table", column));
            report.missing.push(column.to_string());
        }
    }

    report
}

/// Mutable state of an interactive session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Column being processed
    pub current_column: Option<String>,
    /// Map applied by the last [`Decision::RecodeNew`]
    pub previous_mapping: Option<ValueMap>,
    /// Decisions recorded so far
    pub mappings: MappingSet,
}

/// Interactive recode session driven by a [`Prompter`].
pub struct RecodeSession<P> {
    prompter: P,
    state: SessionState,
    sample_rows: usize,
}

impl<P: Prompter> RecodeSession<P> {
    pub fn new(prompter: P) -> Self {
        Self {
            prompter,
            state: SessionState::default(),
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    /// Number of cells shown in each column preview.
    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Walk every column once, in table order.
    ///
    /// On a prompt error the columns already handled stay recoded and
    /// their decisions stay in [`SessionState::mappings`].
    pub fn run(&mut self, table: &mut Table) -> PromptResult<SessionReport> {
        let mut report = SessionReport::default();

        let names: Vec<String> = table.column_names().into_iter().map(str::to_string).collect();
        for name in names {
            let column_report = self.resolve_column(table, &name)?;
            report.columns.push(column_report);
        }

        self.state.current_column = None;
        Ok(report)
    }

    fn resolve_column(&mut self, table: &mut Table, name: &str) -> PromptResult<ColumnReport> {
        self.state.current_column = Some(name.to_string());

        if let Some(column) = table.column(name) {
            let preview = ColumnPreview::of(column, self.sample_rows);
            self.prompter.show_column(&preview)?;
        }

        let decision = self.prompter.elicit_decision(name)?;

        let (outcome, changed) = match decision {
            Decision::Skip => {
                log_info(format!("Skipping column '{}'", name));
                (ColumnOutcome::Skipped, 0)
            }
            Decision::RecodeNew => {
                let pairs = self.prompter.elicit_pairs(name)?;
                let map = ValueMap::from_pairs(pairs);
                let changed = recode_column(table, name, &map).unwrap_or(0);
                log_success_indent(
                    format!("Values in column '{}' have been recoded ({} cells)", name, changed),
                    1,
                );
                self.state.mappings.insert(name, map.clone());
                self.state.previous_mapping = Some(map);
                (ColumnOutcome::Recoded, changed)
            }
            Decision::RepeatPrevious => match self.state.previous_mapping.clone() {
                Some(map) => {
                    let changed = recode_column(table, name, &map).unwrap_or(0);
                    log_success_indent(
                        format!("Previous recoding applied to column '{}' ({} cells)", name, changed),
                        1,
                    );
                    self.state.mappings.insert(name, map);
                    (ColumnOutcome::RepeatedPrevious, changed)
                }
                None => {
                    log_warning(format!(
                        "No previous mapping yet, skipping column '{}'",
                        name
                    ));
                    (ColumnOutcome::RepeatWithoutPrevious, 0)
                }
            },
        };

        Ok(ColumnReport {
            column: name.to_string(),
            outcome,
            changed,
        })
    }

    /// Mapping set built so far.
    pub fn mappings(&self) -> &MappingSet {
        &self.state.mappings
    }

    /// Finish the session, returning its mapping set and the prompter.
    pub fn into_parts(self) -> (MappingSet, P) {
        (self.state.mappings, self.prompter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{drain, LogEntry, LogLevel, LOG_BROADCASTER};
    use crate::models::Column;
    use std::io::Cursor;

    fn values(table: &Table, name: &str) -> Vec<Option<String>> {
        table.column(name).unwrap().cells.clone()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn survey() -> Table {
        Table::new(vec![
            Column::from_values("Status", vec!["Complete", "Partial", "Complete"]),
            Column::from_values("Q1", vec!["Agree", "Disagree", "Agree"]),
            Column::from_values("Q2", vec!["Disagree", "Neutral", "Agree"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_recode_new_status_column() {
        let mut table =
            Table::new(vec![Column::from_values("Status", vec!["Complete", "Partial", "Complete"])])
                .unwrap();
        let prompter = ScriptedPrompter::new().with_recode(vec![("Complete", "1"), ("Partial", "0")]);
        let mut session = RecodeSession::new(prompter);

        let report = session.run(&mut table).unwrap();

        assert_eq!(values(&table, "Status"), some(&["1", "0", "1"]));
        assert_eq!(report.outcome("Status"), Some(ColumnOutcome::Recoded));
        assert_eq!(report.changed_cells(), 3);

        let (mappings, prompter) = session.into_parts();
        assert_eq!(
            serde_json::to_value(&mappings).unwrap(),
            serde_json::json!({"Status": {"Complete": "1", "Partial": "0"}})
        );
        assert_eq!(prompter.shown, vec!["Status"]);
    }

    #[test]
    fn test_repeat_previous_applies_same_map() {
        let mut table = Table::new(vec![
            Column::from_values("A", vec!["x", "y"]),
            Column::from_values("B", vec!["x", "z"]),
        ])
        .unwrap();
        let prompter = ScriptedPrompter::new()
            .with_recode(vec![("x", "1"), ("y", "2")])
            .with_decision(Decision::RepeatPrevious);
        let mut session = RecodeSession::new(prompter);

        let report = session.run(&mut table).unwrap();

        assert_eq!(values(&table, "A"), some(&["1", "2"]));
        assert_eq!(values(&table, "B"), some(&["1", "z"]));
        assert_eq!(report.outcome("B"), Some(ColumnOutcome::RepeatedPrevious));
        assert_eq!(session.mappings().get("B"), session.mappings().get("A"));
    }

    #[test]
    fn test_repeat_previous_matches_direct_application() {
        let original = survey();
        let q1_map = ValueMap::from_pairs(vec![("Agree", "1"), ("Disagree", "0")]);

        let mut expected = original.column("Q2").unwrap().cells.clone();
        recode_cells(&mut expected, &q1_map);

        let mut table = original.clone();
        let prompter = ScriptedPrompter::new()
            .with_decision(Decision::Skip)
            .with_recode(vec![("Agree", "1"), ("Disagree", "0")])
            .with_decision(Decision::RepeatPrevious);
        RecodeSession::new(prompter).run(&mut table).unwrap();

        assert_eq!(values(&table, "Q2"), expected);
    }

    #[test]
    fn test_repeat_without_previous_is_skip() {
        let original = survey();
        let mut table = original.clone();
        let prompter = ScriptedPrompter::new()
            .with_decision(Decision::RepeatPrevious)
            .with_decision(Decision::Skip)
            .with_decision(Decision::Skip);
        let mut session = RecodeSession::new(prompter);

        let report = session.run(&mut table).unwrap();

        assert_eq!(table, original);
        assert!(session.mappings().is_empty());
        assert_eq!(
            report.outcome("Status"),
            Some(ColumnOutcome::RepeatWithoutPrevious)
        );
        assert!(session.state().previous_mapping.is_none());
    }

    fn warnings_mentioning(
        rx: &mut tokio::sync::broadcast::Receiver<LogEntry>,
        needle: &str,
    ) -> Vec<String> {
        drain(rx)
            .into_iter()
            .filter(|e| e.level == LogLevel::Warning && e.message.contains(needle))
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn test_repeat_without_previous_warns_operator() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let mut table =
            Table::new(vec![Column::from_values("Satisfaction_W3", vec!["High"])]).unwrap();
        let prompter = ScriptedPrompter::new().with_decision(Decision::RepeatPrevious);

        RecodeSession::new(prompter).run(&mut table).unwrap();

        let warnings = warnings_mentioning(&mut rx, "Satisfaction_W3");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No previous mapping"));
    }

    #[test]
    fn test_skip_records_nothing() {
        let mut table = survey();
        let prompter = ScriptedPrompter::new()
            .with_recode(vec![("Complete", "1")])
            .with_decision(Decision::Skip)
            .with_decision(Decision::RepeatPrevious);
        let mut session = RecodeSession::new(prompter);

        session.run(&mut table).unwrap();

        assert_eq!(session.mappings().columns(), vec!["Q2", "Status"]);
        assert!(!session.mappings().contains("Q1"));
    }

    #[test]
    fn test_previous_is_last_fresh_map_only() {
        let mut table = Table::new(vec![
            Column::from_values("A", vec!["x"]),
            Column::from_values("B", vec!["x"]),
            Column::from_values("C", vec!["x"]),
            Column::from_values("D", vec!["x"]),
        ])
        .unwrap();
        let prompter = ScriptedPrompter::new()
            .with_recode(vec![("x", "1")])
            .with_recode(vec![("x", "2")])
            .with_decision(Decision::RepeatPrevious)
            .with_decision(Decision::RepeatPrevious);

        RecodeSession::new(prompter).run(&mut table).unwrap();

        assert_eq!(values(&table, "A"), some(&["1"]));
        assert_eq!(values(&table, "C"), some(&["2"]));
        assert_eq!(values(&table, "D"), some(&["2"]));
    }

    #[test]
    fn test_partial_session_keeps_progress() {
        let mut table = survey();
        let prompter = ScriptedPrompter::new().with_recode(vec![("Complete", "1")]);
        let mut session = RecodeSession::new(prompter);

        assert!(session.run(&mut table).is_err());

        assert_eq!(values(&table, "Status"), some(&["1", "Partial", "1"]));
        assert!(session.mappings().contains("Status"));
        assert_eq!(session.state().current_column.as_deref(), Some("Q1"));
    }

    #[test]
    fn test_console_driven_session() {
        let mut table =
            Table::new(vec![Column::from_values("Status", vec!["Complete", "Partial"])]).unwrap();
        let input = "what\ny\nComplete\n1\nPartial\n0\ndone\n";
        let prompter = ConsolePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());

        let mut session = RecodeSession::new(prompter).with_sample_rows(1);
        session.run(&mut table).unwrap();

        assert_eq!(values(&table, "Status"), some(&["1", "0"]));
        let (_, prompter) = session.into_parts();
        let out = String::from_utf8(prompter.into_output()).unwrap();
        assert!(out.contains("First 1 rows"));
        assert!(out.contains("Invalid input"));
    }

    #[test]
    fn test_replay_applies_present_columns() {
        let mut table = survey();
        let mut mappings = MappingSet::new();
        mappings.insert(
            "Status",
            ValueMap::from_pairs(vec![("Complete", "1"), ("Partial", "0")]),
        );

        let report = replay(&mut table, &mappings);

        assert_eq!(values(&table, "Status"), some(&["1", "0", "1"]));
        assert_eq!(values(&table, "Q1"), survey().column("Q1").unwrap().cells);
        assert_eq!(report.outcome("Status"), Some(ColumnOutcome::Replayed));
        assert_eq!(report.outcome("Q1"), None);
    }

    #[test]
    fn test_replay_empty_set_is_identity() {
        let mut table = survey();
        let report = replay(&mut table, &MappingSet::new());

        assert_eq!(table, survey());
        assert!(report.columns.is_empty());
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_replay_reports_missing_column() {
        let mut table = survey();
        let mut mappings = MappingSet::new();
        mappings.insert("Q7", ValueMap::from_pairs(vec![("Agree", "1")]));

        let report = replay(&mut table, &mappings);

        assert_eq!(report.missing, vec!["Q7"]);
        assert_eq!(table, survey());
    }

    #[test]
    fn test_replay_warns_about_missing_column() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let mut table = survey();
        let mut mappings = MappingSet::new();
        mappings.insert("Region_Dropped", ValueMap::from_pairs(vec![("North", "1")]));

        replay(&mut table, &mappings);

        let warnings = warnings_mentioning(&mut rx, "Region_Dropped");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not found"));
    }

    #[test]
    fn test_replay_twice_is_idempotent() {
        let mut mappings = MappingSet::new();
        mappings.insert(
            "Q1",
            ValueMap::from_pairs(vec![("Agree", "1"), ("Disagree", "0")]),
        );

        let mut once = survey();
        replay(&mut once, &mappings);
        let mut twice = once.clone();
        replay(&mut twice, &mappings);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_summary() {
        let mut table = survey();
        let prompter = ScriptedPrompter::new()
            .with_recode(vec![("Complete", "1")])
            .with_decision(Decision::Skip)
            .with_decision(Decision::Skip);

        let report = RecodeSession::new(prompter).run(&mut table).unwrap();

        assert!(report.summary().starts_with("Recoded: 1 columns, 2 cells changed"));
    }
}
