//! Operator interaction boundary.
//!
//! The session only talks to the operator through [`Prompter`]. Answers
//! returned by a prompter are already validated; re-prompting on bad
//! input happens inside the implementation.

use std::collections::VecDeque;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::PathBuf;

use crate::config::DONE_SENTINEL;
use crate::error::{PromptError, PromptResult};
use crate::models::{Column, Decision};

/// Read-only view of a column shown before asking for a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPreview<'a> {
    pub name: &'a str,
    /// First cells of the column
    pub sample: Vec<Option<&'a str>>,
    /// Distinct values in first-seen order
    pub distinct: Vec<Option<&'a str>>,
}

impl<'a> ColumnPreview<'a> {
    pub fn of(column: &'a Column, sample_rows: usize) -> Self {
        Self {
            name: &column.name,
            sample: column
                .cells
                .iter()
                .take(sample_rows)
                .map(Option::as_deref)
                .collect(),
            distinct: column.distinct(),
        }
    }
}

/// Blocking request/response exchange with the operator.
pub trait Prompter {
    /// Show a column's sample and distinct values.
    fn show_column(&mut self, preview: &ColumnPreview<'_>) -> PromptResult<()>;

    /// Ask what to do with a column.
    fn elicit_decision(&mut self, column: &str) -> PromptResult<Decision>;

    /// Ask for (old, new) value pairs until the operator is done.
    fn elicit_pairs(&mut self, column: &str) -> PromptResult<Vec<(String, String)>>;

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> PromptResult<bool>;

    /// Ask for a destination path. `None` means the operator declined.
    fn elicit_path(&mut self, question: &str) -> PromptResult<Option<PathBuf>>;
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn show_column(&mut self, preview: &ColumnPreview<'_>) -> PromptResult<()> {
        (**self).show_column(preview)
    }

    fn elicit_decision(&mut self, column: &str) -> PromptResult<Decision> {
        (**self).elicit_decision(column)
    }

    fn elicit_pairs(&mut self, column: &str) -> PromptResult<Vec<(String, String)>> {
        (**self).elicit_pairs(column)
    }

    fn confirm(&mut self, question: &str) -> PromptResult<bool> {
        (**self).confirm(question)
    }

    fn elicit_path(&mut self, question: &str) -> PromptResult<Option<PathBuf>> {
        (**self).elicit_path(question)
    }
}

fn display_cell(cell: Option<&str>) -> &str {
    cell.unwrap_or("<missing>")
}

// =============================================================================
// Console
// =============================================================================

/// Line-oriented prompter over any reader/writer pair.
pub struct ConsolePrompter<R, W> {
    input: R,
    output: W,
}

impl ConsolePrompter<StdinLock<'static>, Stdout> {
    /// Prompter bound to the process's stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer, e.g. to inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt: &str) -> PromptResult<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn show_column(&mut self, preview: &ColumnPreview<'_>) -> PromptResult<()> {
        writeln!(self.output, "\nColumn: {}", preview.name)?;
        writeln!(self.output, "First {} rows for context:", preview.sample.len())?;
        for cell in &preview.sample {
            writeln!(self.output, "  {}", display_cell(*cell))?;
        }

        writeln!(self.output, "\nUnique values in column '{}':", preview.name)?;
        for value in &preview.distinct {
            writeln!(self.output, "  {}", display_cell(*value))?;
        }
        Ok(())
    }

    fn elicit_decision(&mut self, column: &str) -> PromptResult<Decision> {
        let prompt = format!(
            "Recode values in '{}'? (y = new mapping, n = skip, p = repeat previous) ({}): ",
            column,
            Decision::CHOICES
        );
        loop {
            let answer = self.ask(&prompt)?;
            match answer.parse::<Decision>() {
                Ok(decision) => return Ok(decision),
                Err(msg) => writeln!(self.output, "{}", msg)?,
            }
        }
    }

    fn elicit_pairs(&mut self, _column: &str) -> PromptResult<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        loop {
            let old = self.ask(&format!(
                "Enter the value to be replaced (or type '{}' to finish): ",
                DONE_SENTINEL
            ))?;
            if old.eq_ignore_ascii_case(DONE_SENTINEL) {
                break;
            }
            let new = self.ask(&format!("Enter the new value for {}: ", old))?;
            pairs.push((old, new));
        }
        Ok(pairs)
    }

    fn confirm(&mut self, question: &str) -> PromptResult<bool> {
        let prompt = format!("{} (y/n): ", question);
        loop {
            match self.ask(&prompt)?.to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => writeln!(self.output, "Invalid input, please enter 'y' or 'n'.")?,
            }
        }
    }

    fn elicit_path(&mut self, question: &str) -> PromptResult<Option<PathBuf>> {
        let answer = self.ask(&format!("{} (leave empty to cancel): ", question))?;
        Ok((!answer.is_empty()).then(|| PathBuf::from(answer)))
    }
}

// =============================================================================
// Scripted
// =============================================================================

/// Prompter that replays pre-recorded answers, for headless runs.
///
/// Running out of answers yields [`PromptError::EndOfInput`].
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    decisions: VecDeque<Decision>,
    pairs: VecDeque<Vec<(String, String)>>,
    confirmations: VecDeque<bool>,
    paths: VecDeque<Option<PathBuf>>,
    /// Names of the columns shown so far
    pub shown: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a decision.
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decisions.push_back(decision);
        self
    }

    /// Queue a [`Decision::RecodeNew`] followed by its value pairs.
    pub fn with_recode<K: Into<String>, V: Into<String>>(mut self, pairs: Vec<(K, V)>) -> Self {
        self.decisions.push_back(Decision::RecodeNew);
        self.pairs.push_back(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Queue a yes/no answer.
    pub fn with_confirmation(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    /// Queue a path answer (`None` declines).
    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.paths.push_back(path);
        self
    }

    /// True once every queued answer has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.decisions.is_empty()
            && self.pairs.is_empty()
            && self.confirmations.is_empty()
            && self.paths.is_empty()
    }
}

impl Prompter for ScriptedPrompter {
    fn show_column(&mut self, preview: &ColumnPreview<'_>) -> PromptResult<()> {
        self.shown.push(preview.name.to_string());
        Ok(())
    }

    fn elicit_decision(&mut self, _column: &str) -> PromptResult<Decision> {
        self.decisions.pop_front().ok_or(PromptError::EndOfInput)
    }

    fn elicit_pairs(&mut self, _column: &str) -> PromptResult<Vec<(String, String)>> {
        self.pairs.pop_front().ok_or(PromptError::EndOfInput)
    }

    fn confirm(&mut self, _question: &str) -> PromptResult<bool> {
        self.confirmations.pop_front().ok_or(PromptError::EndOfInput)
    }

    fn elicit_path(&mut self, _question: &str) -> PromptResult<Option<PathBuf>> {
        self.paths.pop_front().ok_or(PromptError::EndOfInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> ConsolePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        ConsolePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn printed(prompter: ConsolePrompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_output()).unwrap()
    }

    #[test]
    fn test_decision_reprompts_on_invalid_input() {
        let mut prompter = console("maybe\n\nAP\n");

        let decision = prompter.elicit_decision("Q1").unwrap();

        assert_eq!(decision, Decision::RepeatPrevious);
        assert_eq!(printed(prompter).matches("Invalid input").count(), 2);
    }

    #[test]
    fn test_pairs_until_sentinel() {
        let mut prompter = console("Complete\n1\n Partial \n0\nComplete\n2\nDONE\n");

        let pairs = prompter.elicit_pairs("Status").unwrap();

        assert_eq!(
            pairs,
            vec![
                ("Complete".to_string(), "1".to_string()),
                ("Partial".to_string(), "0".to_string()),
                ("Complete".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_end_of_input() {
        let mut prompter = console("Complete\n");
        assert!(matches!(
            prompter.elicit_pairs("Status"),
            Err(PromptError::EndOfInput)
        ));
    }

    #[test]
    fn test_confirm_and_path() {
        let mut prompter = console("x\nY\nout.json\n\n");

        assert!(prompter.confirm("Save?").unwrap());
        assert_eq!(
            prompter.elicit_path("Where?").unwrap(),
            Some(PathBuf::from("out.json"))
        );
        assert_eq!(prompter.elicit_path("Where?").unwrap(), None);
    }

    #[test]
    fn test_show_column_lists_sample_and_distinct() {
        let column = Column::new(
            "Status",
            vec![
                Some("Complete".into()),
                None,
                Some("Complete".into()),
                Some("Partial".into()),
            ],
        );
        let preview = ColumnPreview::of(&column, 2);
        assert_eq!(preview.sample, vec![Some("Complete"), None]);
        assert_eq!(preview.distinct, vec![Some("Complete"), None, Some("Partial")]);

        let mut prompter = console("");
        prompter.show_column(&preview).unwrap();
        let out = printed(prompter);

        assert!(out.contains("Column: Status"));
        assert!(out.contains("<missing>"));
        assert!(out.contains("Partial"));
    }

    #[test]
    fn test_scripted_runs_out() {
        let mut prompter = ScriptedPrompter::new().with_decision(Decision::Skip);

        assert_eq!(prompter.elicit_decision("A").unwrap(), Decision::Skip);
        assert!(prompter.is_exhausted());
        assert!(matches!(
            prompter.elicit_decision("B"),
            Err(PromptError::EndOfInput)
        ));
    }
}
