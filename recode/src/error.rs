//! Error types for the recoding workflow.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Table read/write errors
//! - [`TableError`] - Table shape invariant violations
//! - [`LoadError`] - Mapping file load errors
//! - [`SaveError`] - Mapping file save errors
//! - [`RegistryError`] - Stored mapping registry errors
//! - [`PromptError`] - Operator interaction errors
//! - [`RecodeError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write the file.
    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to decode the file contents.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// A record could not be parsed.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Failed to serialize the table.
    #[error("Failed to write CSV: {0}")]
    Write(String),

    /// The parsed rows do not form a valid table.
    #[error(transparent)]
    Table(#[from] TableError),
}

// =============================================================================
// Table Errors
// =============================================================================

/// Violations of the table shape invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Two columns share the same name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column has a different number of cells than the first one.
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}

// =============================================================================
// Mapping Store Errors
// =============================================================================

/// Errors while loading a mapping file.
///
/// A failed load never yields a partial mapping set.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("Mapping file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Cannot read mapping file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON.
    #[error("Malformed mapping file '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not an object of string-to-string objects.
    #[error("Mapping file '{}' must map column names to objects of strings: {source}", path.display())]
    InvalidShape {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors while saving a mapping file.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Failed to write the destination.
    #[error("Cannot write mapping file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("Cannot serialize mappings: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the stored mapping registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Stored mapping set not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// The name does not produce a usable identifier.
    #[error("Invalid template name: '{0}'")]
    InvalidName(String),

    /// Failed to load the imported mapping file.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Failed to export a mapping file.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// IO error.
    #[error("Registry IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Prompt Errors
// =============================================================================

/// Errors on the operator channel.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Reading or writing the console failed.
    #[error("Console IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The operator closed the input stream.
    #[error("Input ended before an answer was given")]
    EndOfInput,
}

// =============================================================================
// Recode Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::pipeline`].
#[derive(Debug, Error)]
pub enum RecodeError {
    /// Table read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Mapping file could not be loaded.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Mapping file could not be saved.
    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Operator interaction error.
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for mapping file loads.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for mapping file saves.
pub type SaveResult<T> = Result<T, SaveError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for operator interaction.
pub type PromptResult<T> = Result<T, PromptError>;

/// Result type for pipeline operations.
pub type RecodeResult<T> = Result<T, RecodeError>;
