//! High-level pipeline API for recoding a survey export.
//!
//! This module combines the steps: loading mappings (first, so a bad
//! mapping file aborts before the table is touched), reading the table,
//! running the session, and persisting results.
//!
//! # Example
//!
//! ```rust,ignore
//! use recode::pipeline::{recode_file, RecodeOptions, MappingSource};
//! use recode::session::ConsolePrompter;
//! use std::path::Path;
//!
//! let options = RecodeOptions {
//!     mappings: Some(MappingSource::File("likert.json".into())),
//!     ..RecodeOptions::default()
//! };
//! let result = recode_file(Path::new("export.csv"), &options, ConsolePrompter::stdio())?;
//! println!("{}", result.report.summary());
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::{Settings, DEFAULT_SAMPLE_ROWS};
use crate::error::{PromptResult, RecodeResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{MappingSet, Table};
use crate::parser::{parse_csv_file_auto, write_table, write_table_file};
use crate::session::{replay, Prompter, RecodeSession, SessionReport};
use crate::store::{self, MappingRegistry};

/// Where previously authored mappings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingSource {
    /// A plain mapping file
    File(PathBuf),
    /// A stored set in the registry, by ID
    Template(String),
}

/// Options for the recode pipeline
#[derive(Debug, Clone)]
pub struct RecodeOptions {
    /// Mappings to replay; interactive mode if absent or empty
    pub mappings: Option<MappingSource>,
    /// CSV delimiter (auto-detect if not specified)
    pub delimiter: Option<char>,
    /// Cells shown per column preview
    pub sample_rows: usize,
    /// Registry used to resolve [`MappingSource::Template`]
    pub registry_dir: PathBuf,
}

impl Default for RecodeOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl RecodeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mappings: None,
            delimiter: None,
            sample_rows: settings.sample_rows,
            registry_dir: settings.registry_dir.clone(),
        }
    }
}

/// How the session ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecodeMode {
    Replay,
    Interactive,
}

/// CSV file information
#[derive(Debug, Clone)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete recode run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Recoded table
    pub table: Table,
    /// Replayed or newly built mappings
    pub mappings: MappingSet,
    pub mode: RecodeMode,
    pub report: SessionReport,
    /// CSV parsing metadata
    pub csv_info: CsvInfo,
    /// Registry ID when mappings came from a stored set
    pub template_id: Option<String>,
}

/// Per-column statistics for `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub distinct: usize,
    pub missing: usize,
}

/// Load mappings from a file or the registry.
pub fn load_mappings(source: &MappingSource, registry_dir: &Path) -> RecodeResult<MappingSet> {
    match source {
        MappingSource::File(path) => {
            let mappings = store::load(path)?;
            log_success(format!("Recode mappings loaded from {}", path.display()));
            Ok(mappings)
        }
        MappingSource::Template(id) => {
            let registry = MappingRegistry::with_dir(registry_dir);
            let stored = registry.get(id)?;
            log_success(format!("Using template: {} ({})", stored.name, stored.id));
            Ok(stored.mappings.clone())
        }
    }
}

/// Recode a table in place.
///
/// A non-empty supplied set is replayed; otherwise an interactive session
/// builds a new set. Returns the set that describes what was applied.
pub fn recode_table<P: Prompter>(
    table: &mut Table,
    supplied: Option<MappingSet>,
    prompter: P,
    sample_rows: usize,
) -> PromptResult<(MappingSet, RecodeMode, SessionReport)> {
    match supplied.filter(|m| !m.is_empty()) {
        Some(mappings) => {
            log_info(format!("Replaying mappings for {} column(s)...", mappings.len()));
            let report = replay(table, &mappings);
            log_success("Loaded recode mappings have been applied");
            Ok((mappings, RecodeMode::Replay, report))
        }
        None => {
            log_info(format!("Interactive recoding of {} column(s)", table.width()));
            let mut session = RecodeSession::new(prompter).with_sample_rows(sample_rows);
            let report = session.run(table)?;
            let (mappings, _) = session.into_parts();
            Ok((mappings, RecodeMode::Interactive, report))
        }
    }
}

/// Recode a CSV file.
///
/// Mappings are loaded before the table is read; a load failure aborts
/// the run with nothing modified.
pub fn recode_file<P: Prompter>(
    path: &Path,
    options: &RecodeOptions,
    prompter: P,
) -> RecodeResult<PipelineResult> {
    // 1. Mappings first (fail fast)
    let supplied = match &options.mappings {
        Some(source) => Some(load_mappings(source, &options.registry_dir)?),
        None => None,
    };

    // 2. Table
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_csv_file_auto(path, options.delimiter)?;
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!(
        "Read {} rows, {} columns",
        parsed.table.row_count(),
        parsed.table.width()
    ));

    let csv_info = CsvInfo {
        encoding: parsed.encoding.clone(),
        delimiter: parsed.delimiter,
        headers: parsed.table.column_names().into_iter().map(str::to_string).collect(),
        row_count: parsed.table.row_count(),
    };

    // 3. Session
    let mut table = parsed.table;
    let sample_rows = if options.sample_rows == 0 {
        DEFAULT_SAMPLE_ROWS
    } else {
        options.sample_rows
    };
    let (mappings, mode, report) = recode_table(&mut table, supplied, prompter, sample_rows)?;
    log_success(report.summary());

    // 4. Registry stats
    let template_id = match (&options.mappings, mode) {
        (Some(MappingSource::Template(id)), RecodeMode::Replay) => {
            let mut registry = MappingRegistry::with_dir(&options.registry_dir);
            if let Err(e) = registry.record_use(id) {
                log_warning(format!("Could not update template stats: {}", e));
            }
            Some(id.clone())
        }
        _ => None,
    };

    Ok(PipelineResult {
        table,
        mappings,
        mode,
        report,
        csv_info,
        template_id,
    })
}

/// Save mappings, logging the outcome. `None` is a cancelled save.
pub fn persist_mappings(mappings: &MappingSet, destination: Option<&Path>) -> RecodeResult<bool> {
    let saved = store::save(mappings, destination)?;
    match destination {
        Some(path) if saved => log_success(format!("Recode mappings saved to {}", path.display())),
        _ => log_info("Saving recode mappings cancelled"),
    }
    Ok(saved)
}

/// Write a table to a file, or to stdout when no path is given.
pub fn write_output(table: &Table, destination: Option<&Path>, delimiter: char) -> RecodeResult<()> {
    match destination {
        Some(path) => {
            write_table_file(table, path, delimiter)?;
            log_success(format!("💾 Modified CSV file saved to {}", path.display()));
        }
        None => {
            let stdout = std::io::stdout();
            write_table(table, stdout.lock(), delimiter)?;
        }
    }
    Ok(())
}

/// Distinct and missing counts per column.
pub fn summarize(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name.clone(),
            distinct: c.distinct().into_iter().flatten().count(),
            missing: c.missing_count(),
        })
        .collect()
}

/// Print column mapping overview
pub fn print_mappings(mappings: &MappingSet) {
    log_info("🗺️  Mappings:");
    for (column, map) in mappings.iter() {
        log_info_indent(format!("{} ({} values)", column, map.len()), 1);
    }
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
