//! Table registry bootstrap
//!
//! Builds the registry from the configured table list and applies the
//! optional seed file (`{ "<table>": [records...] }`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use super::config::{ConfigError, ConfigResult, ServerConfig};
use crate::observability::{log_event_with_fields, Event};
use crate::rest_api::{MemoryTable, TableRegistry};

/// Read a seed file
pub fn load_seed(path: &Path) -> ConfigResult<BTreeMap<String, Vec<Value>>> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// One in-memory table per configured name, seeded when a seed file is set
pub fn build_registry(config: &ServerConfig) -> ConfigResult<TableRegistry> {
    let mut seed = match &config.seed_path {
        Some(path) => load_seed(path)?,
        None => BTreeMap::new(),
    };

    if let Some(unknown) = seed.keys().find(|t| !config.tables.contains(t)) {
        return Err(ConfigError::Invalid(format!(
            "seed references unregistered table '{}'",
            unknown
        )));
    }

    let mut registry = TableRegistry::new();
    let mut seeded = 0usize;

    for name in &config.tables {
        let rows = seed.remove(name).unwrap_or_default();
        seeded += rows.len();

        let table = MemoryTable::with_rows(rows)
            .map_err(|e| ConfigError::Invalid(format!("seed for '{}': {}", name, e)))?;
        registry.register(name.clone(), Arc::new(table));
    }

    if config.seed_path.is_some() {
        let seeded = seeded.to_string();
        log_event_with_fields(Event::SeedLoaded, &[("records", seeded.as_str())]);
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_api::{QuerySpec, RecordId};
    use std::io::Write;

    fn seed_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_registry_without_seed() {
        let registry = build_registry(&ServerConfig::default()).unwrap();
        assert_eq!(registry.len(), ServerConfig::default().tables.len());
        let rows = registry
            .resolve("patients")
            .unwrap()
            .find_many(&QuerySpec::default())
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_registry_with_seed() {
        let file = seed_file(r#"{"patients": [{"id": 42, "name": "Ana"}, {"id": 43, "name": "Bruno"}]}"#);
        let config = ServerConfig {
            tables: vec!["patients".to_string(), "appointments".to_string()],
            seed_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };

        let registry = build_registry(&config).unwrap();
        let patients = registry.resolve("patients").unwrap();
        assert!(patients.find_unique(&RecordId::Int(42)).unwrap().is_some());
        assert_eq!(patients.find_many(&QuerySpec::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_seed_for_unknown_table_rejected() {
        let file = seed_file(r#"{"ghosts": []}"#);
        let config = ServerConfig {
            seed_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(build_registry(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_seed_with_duplicate_ids_rejected() {
        let file = seed_file(r#"{"patients": [{"id": 1}, {"id": 1}]}"#);
        let config = ServerConfig {
            seed_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(matches!(build_registry(&config), Err(ConfigError::Invalid(_))));
    }
}
