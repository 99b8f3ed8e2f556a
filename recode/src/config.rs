//! Runtime configuration.
//!
//! Settings come from the environment (a `.env` file is honoured) and
//! can be overridden per invocation by CLI flags.

use std::env;
use std::path::PathBuf;

use crate::logs::log_warning;

/// Default directory for stored mapping sets (relative to current dir).
pub const DEFAULT_REGISTRY_DIR: &str = ".recode/mappings";

/// Default number of cells shown when previewing a column.
pub const DEFAULT_SAMPLE_ROWS: usize = 3;

/// Sentinel that ends value pair entry.
pub const DONE_SENTINEL: &str = "done";

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where stored mapping sets live
    pub registry_dir: PathBuf,
    /// Cells shown per column preview
    pub sample_rows: usize,
    /// Suppress log echo on stderr
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_dir: PathBuf::from(DEFAULT_REGISTRY_DIR),
            sample_rows: DEFAULT_SAMPLE_ROWS,
            quiet: false,
        }
    }
}

impl Settings {
    /// Read settings from `RECODE_*` environment variables.
    pub fn from_env() -> Self {
        // Try loading .env file
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let registry_dir = lookup("RECODE_REGISTRY_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.registry_dir);

        let sample_rows = match lookup("RECODE_SAMPLE_ROWS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    log_warning(format!(
                        "Ignoring RECODE_SAMPLE_ROWS='{}', using {}",
                        raw, DEFAULT_SAMPLE_ROWS
                    ));
                    DEFAULT_SAMPLE_ROWS
                }
            },
            None => defaults.sample_rows,
        };

        let quiet = lookup("RECODE_QUIET")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.quiet);

        Self {
            registry_dir,
            sample_rows,
            quiet,
        }
    }
}
