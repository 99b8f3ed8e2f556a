//! Mapping Registry - Store and reuse mapping sets
//!
//! Saves named mapping sets to disk and suggests them for tables whose
//! columns they cover.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, RegistryResult};
use crate::logs::log_warning;
use crate::models::MappingSet;

/// Minimum share of a stored set's columns that must be present in a table.
const COMPATIBILITY_THRESHOLD: f64 = 0.5;

/// A stored mapping set with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMappingSet {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// The recoding decisions
    pub mappings: MappingSet,
    /// Columns this set recodes
    pub columns: Vec<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last time this set was replayed
    pub last_used: Option<String>,
    /// Number of times replayed
    pub use_count: u32,
}

/// Registry for managing stored mapping sets
pub struct MappingRegistry {
    /// Directory where sets are stored
    registry_dir: PathBuf,
    /// Loaded sets (id -> set)
    sets: HashMap<String, StoredMappingSet>,
}

impl MappingRegistry {
    /// Create a registry over a directory, loading existing sets from disk
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut registry = Self {
            registry_dir: dir.as_ref().to_path_buf(),
            sets: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    /// Load all sets from the registry directory.
    ///
    /// Unreadable entries are reported and skipped.
    fn load_all(&mut self) {
        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .map_err(RegistryError::from)
                .and_then(|content| {
                    serde_json::from_str::<StoredMappingSet>(&content).map_err(RegistryError::from)
                });

            match parsed {
                Ok(set) => {
                    self.sets.insert(set.id.clone(), set);
                }
                Err(e) => log_warning(format!("Skipping {}: {}", path.display(), e)),
            }
        }
    }

    /// Get all stored sets, most recently created first
    pub fn list(&self) -> Vec<&StoredMappingSet> {
        let mut sets: Vec<_> = self.sets.values().collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        sets
    }

    /// Get a set by ID
    pub fn get(&self, id: &str) -> RegistryResult<&StoredMappingSet> {
        self.sets
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Find stored sets whose columns mostly appear in a table.
    /// Returns sets sorted by compatibility score (descending)
    pub fn find_compatible(&self, table_columns: &[&str]) -> Vec<(&StoredMappingSet, f64)> {
        let mut compatible: Vec<_> = self
            .sets
            .values()
            .filter_map(|s| {
                let score = calculate_compatibility(&s.columns, table_columns);
                (score > COMPATIBILITY_THRESHOLD).then_some((s, score))
            })
            .collect();

        compatible.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.0.use_count.cmp(&a.0.use_count))
        });

        compatible
    }

    /// Save a new mapping set to the registry
    pub fn save(&mut self, mappings: MappingSet, name: &str) -> RegistryResult<String> {
        let id = generate_id(name)?;
        fs::create_dir_all(&self.registry_dir)?;

        let stored = StoredMappingSet {
            id: id.clone(),
            name: name.to_string(),
            columns: mappings.columns(),
            mappings,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            use_count: 0,
        };

        self.write(&stored)?;
        self.sets.insert(id.clone(), stored);
        Ok(id)
    }

    /// Import a plain mapping file as a stored set
    pub fn import(&mut self, path: &Path, name: Option<&str>) -> RegistryResult<String> {
        let mappings = super::load(path)?;

        let set_name = name.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("imported")
        });

        self.save(mappings, set_name)
    }

    /// Export a stored set as a plain mapping file
    pub fn export(&self, id: &str, destination: &Path) -> RegistryResult<()> {
        let stored = self.get(id)?;
        super::save(&stored.mappings, Some(destination))?;
        Ok(())
    }

    /// Update statistics after replaying a set
    pub fn record_use(&mut self, id: &str) -> RegistryResult<()> {
        let stored = self
            .sets
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        stored.last_used = Some(chrono::Utc::now().to_rfc3339());
        stored.use_count += 1;

        let snapshot = stored.clone();
        self.write(&snapshot)
    }

    /// Delete a set from the registry
    pub fn delete(&mut self, id: &str) -> RegistryResult<()> {
        if self.sets.remove(id).is_none() {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        fs::remove_file(self.path_for(id))?;
        Ok(())
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.registry_dir.join(format!("{}.json", id))
    }

    fn write(&self, stored: &StoredMappingSet) -> RegistryResult<()> {
        let content = serde_json::to_string_pretty(stored)?;
        fs::write(self.path_for(&stored.id), content)?;
        Ok(())
    }
}

/// Share of stored columns present in the table (case-insensitive)
fn calculate_compatibility(stored: &[String], table: &[&str]) -> f64 {
    if stored.is_empty() {
        return 0.0;
    }

    let table_lower: Vec<String> = table.iter().map(|c| c.to_lowercase()).collect();
    let match_count = stored
        .iter()
        .filter(|col| table_lower.contains(&col.to_lowercase()))
        .count();

    match_count as f64 / stored.len() as f64
}

/// Generate a unique ID from a name
fn generate_id(name: &str) -> RegistryResult<String> {
    let slug = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        return Err(RegistryError::InvalidName(name.to_string()));
    }

    let timestamp = chrono::Utc::now().timestamp_millis();
    Ok(format!("{}-{}", slug, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueMap;
    use tempfile::tempdir;

    fn likert_set() -> MappingSet {
        let map = ValueMap::from_pairs(vec![("Agree", "1"), ("Disagree", "0")]);
        let mut set = MappingSet::new();
        set.insert("Q1", map.clone());
        set.insert("Q2", map.clone());
        set.insert("Q3", map);
        set
    }

    #[test]
    fn test_compatibility_score() {
        let stored = vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()];
        let score = calculate_compatibility(&stored, &["Q1", "Q2", "Other"]);
        assert!((score - 0.666).abs() < 0.01); // 2/3 match
    }

    #[test]
    fn test_case_insensitive_match() {
        let stored = vec!["status".to_string(), "Q1".to_string()];
        let score = calculate_compatibility(&stored, &["Status", "q1"]);
        assert!((score - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let id = {
            let mut registry = MappingRegistry::with_dir(dir.path());
            registry.save(likert_set(), "Wave 1 Likert").unwrap()
        };

        assert!(id.starts_with("wave-1-likert-"));

        let registry = MappingRegistry::with_dir(dir.path());
        let stored = registry.get(&id).unwrap();
        assert_eq!(stored.name, "Wave 1 Likert");
        assert_eq!(stored.columns, vec!["Q1", "Q2", "Q3"]);
        assert_eq!(stored.mappings, likert_set());
    }

    #[test]
    fn test_find_compatible_threshold() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        registry.save(likert_set(), "likert").unwrap();

        assert_eq!(registry.find_compatible(&["Q1", "Q2"]).len(), 1);
        assert!(registry.find_compatible(&["Q1", "Other"]).is_empty());
    }

    #[test]
    fn test_import_export_roundtrip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("likert.json");
        crate::store::save(&likert_set(), Some(source.as_path())).unwrap();

        let mut registry = MappingRegistry::with_dir(dir.path().join("registry"));
        let id = registry.import(&source, None).unwrap();
        assert_eq!(registry.get(&id).unwrap().name, "likert");

        let exported = dir.path().join("exported.json");
        registry.export(&id, &exported).unwrap();
        assert_eq!(crate::store::load(&exported).unwrap(), likert_set());
    }

    #[test]
    fn test_record_use_persists() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        let id = registry.save(likert_set(), "likert").unwrap();

        registry.record_use(&id).unwrap();

        let reloaded = MappingRegistry::with_dir(dir.path());
        let stored = reloaded.get(&id).unwrap();
        assert_eq!(stored.use_count, 1);
        assert!(stored.last_used.is_some());
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        let id = registry.save(likert_set(), "likert").unwrap();

        registry.delete(&id).unwrap();

        assert!(matches!(registry.get(&id), Err(RegistryError::NotFound(_))));
        assert!(matches!(
            registry.delete(&id),
            Err(RegistryError::NotFound(_))
        ));
        assert!(MappingRegistry::with_dir(dir.path()).list().is_empty());
    }

    #[test]
    fn test_invalid_name() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        assert!(matches!(
            registry.save(likert_set(), "!!!"),
            Err(RegistryError::InvalidName(_))
        ));
    }
}
