//! Mapping Store - durable mapping sets.
//!
//! A mapping file is a JSON object whose keys are column names and whose
//! values are objects of `raw value -> new value` strings:
//!
//! ```json
//! { "Status": { "Complete": "1", "Partial": "0" } }
//! ```
//!
//! [`registry`] keeps named mapping sets in a local directory for reuse.

pub mod registry;

use serde_json::error::Category;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{LoadError, LoadResult, SaveError, SaveResult};
use crate::models::MappingSet;

pub use registry::{MappingRegistry, StoredMappingSet};

/// Load a mapping set from a file.
///
/// Fails if the file is absent, is not JSON, or is not an object of
/// string-to-string objects. Nothing is returned on failure.
pub fn load(path: &Path) -> LoadResult<MappingSet> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    parse(&content, path)
}

/// Parse mapping file content. `origin` is only used in error messages.
pub fn parse(content: &str, origin: &Path) -> LoadResult<MappingSet> {
    serde_json::from_str(content).map_err(|source| match source.classify() {
        Category::Data => LoadError::InvalidShape {
            path: origin.to_path_buf(),
            source,
        },
        Category::Syntax | Category::Eof | Category::Io => LoadError::Malformed {
            path: origin.to_path_buf(),
            source,
        },
    })
}

/// Save a mapping set, overwriting the destination.
///
/// `None` means the operator declined to pick a destination: nothing is
/// written and `Ok(false)` is returned.
pub fn save(mappings: &MappingSet, destination: Option<&Path>) -> SaveResult<bool> {
    let Some(path) = destination else {
        return Ok(false);
    };

    let content = serde_json::to_string_pretty(mappings)?;
    fs::write(path, content).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(true)
}
