//! # Recode - interactive recoding of survey-export tables
//!
//! Recode cleans CSV exports from survey platforms: it strips
//! administrative columns and turns raw answer text into normalized
//! categories, one column at a time, remembering every decision as a
//! reusable mapping set.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Mapping set │────▶│   Session   │◀────│   Parser    │◀────│  CSV File   │
//! │ (optional)  │     │ (replay or  │     │  (auto-enc) │     │  (ISO/UTF8) │
//! └─────────────┘     │ interactive)│     └─────────────┘     └─────────────┘
//!        ▲            └─────────────┘
//!        │                   │
//!        └───── save ────────┴──────▶ recoded CSV
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recode::{parse_table, replay, MappingSet, ValueMap};
//!
//! let mut table = parse_table("Status\nComplete\nPartial", ',').unwrap();
//! let mut mappings = MappingSet::new();
//! mappings.insert("Status", ValueMap::from_pairs(vec![("Complete", "1"), ("Partial", "0")]));
//!
//! let report = replay(&mut table, &mappings);
//! println!("{}", report.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Table, ValueMap, MappingSet, Decision
//! - [`parser`] - CSV reading/writing with auto-detection
//! - [`store`] - Mapping files and the stored mapping registry
//! - [`session`] - Substitution, operator prompts, recode session
//! - [`strip`] - Administrative column removal
//! - [`pipeline`] - End-to-end file workflow
//! - [`config`] - Environment settings
//! - [`logs`] - Operator-facing progress log

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Table I/O
pub mod parser;

// Mapping persistence
pub mod store;

// Recoding
pub mod session;
pub mod strip;

// Orchestration
pub mod pipeline;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, LoadError, PromptError, RecodeError, RegistryError, SaveError, TableError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Column, Decision, MappingSet, Table, ValueMap};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_csv_file_auto,
    parse_table, write_table, write_table_file, ParseResult,
};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{
    recode_cells, recode_column, replay, ColumnOutcome, ColumnPreview, ColumnReport,
    ConsolePrompter, Prompter, RecodeSession, ScriptedPrompter, SessionReport, SessionState,
};

// =============================================================================
// Re-exports - Store
// =============================================================================

pub use store::{MappingRegistry, StoredMappingSet};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    recode_file, recode_table, CsvInfo, MappingSource, PipelineResult, RecodeMode, RecodeOptions,
};

pub use config::Settings;
pub use strip::{strip_columns, StripReport};
