//! Registry configuration
//!
//! Loaded from a JSON file. Every key is optional:
//!
//! ```json
//! { "refresh_on_connect": true, "metadata_keys": ["name", "_id"] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SisError, SisResult};
use crate::schema::NAME_KEY;

/// Configuration for a `SisDb` registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SisConfig {
    /// List schemas from the service as soon as the registry connects
    #[serde(default = "default_refresh_on_connect")]
    pub refresh_on_connect: bool,

    /// Top-level keys of a flat descriptor that are never fields.
    ///
    /// Ignored when fields are nested under `definition`.
    #[serde(default = "default_metadata_keys")]
    pub metadata_keys: Vec<String>,
}

fn default_refresh_on_connect() -> bool {
    true
}

/// Only the schema name is excluded by default: a flat descriptor may
/// declare fields such as `owner` or `_id`.
fn default_metadata_keys() -> Vec<String> {
    vec![NAME_KEY.to_string()]
}

impl Default for SisConfig {
    fn default() -> Self {
        Self {
            refresh_on_connect: default_refresh_on_connect(),
            metadata_keys: default_metadata_keys(),
        }
    }
}

impl SisConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> SisResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SisError::config(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> SisResult<Self> {
        let config: SisConfig = serde_json::from_str(content)
            .map_err(|e| SisError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Config without an initial refresh
    pub fn lazy() -> Self {
        Self {
            refresh_on_connect: false,
            ..Self::default()
        }
    }

    /// The schema name key must stay out of the field set
    pub fn validate(&self) -> SisResult<()> {
        if !self.metadata_keys.iter().any(|key| key == NAME_KEY) {
            return Err(SisError::config(format!(
                "metadata_keys must contain '{}'",
                NAME_KEY
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_defaults() {
        let config = SisConfig::from_json("{}").unwrap();
        assert!(config.refresh_on_connect);
        assert_eq!(config, SisConfig::default());
        assert_eq!(config.metadata_keys, vec!["name".to_string()]);
    }

    #[test]
    fn test_config_lazy() {
        assert!(!SisConfig::lazy().refresh_on_connect);
    }

    #[test]
    fn test_config_rejects_missing_name_key() {
        let result = SisConfig::from_json(r#"{"metadata_keys": ["_id"]}"#);
        assert!(matches!(result, Err(SisError::Config(_))));
    }

    #[test]
    fn test_config_rejects_bad_json() {
        let result = SisConfig::from_json("{not json");
        assert!(matches!(result, Err(SisError::Config(_))));
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"refresh_on_connect": false, "metadata_keys": ["name"]}}"#
        )
        .unwrap();

        let config = SisConfig::load(file.path()).unwrap();
        assert!(!config.refresh_on_connect);
        assert_eq!(config.metadata_keys, vec!["name".to_string()]);
    }

    #[test]
    fn test_config_load_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = SisConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(SisError::Config(_))));
    }
}
