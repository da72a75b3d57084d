//! Export policy settings, loadable from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Which declarations survive [`Document::exported`](crate::model::Document::exported).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Keep undocumented declarations too.
    #[serde(default)]
    pub show_all: bool,
    #[serde(default)]
    pub document_protected: bool,
    #[serde(default)]
    pub document_private: bool,
    /// Sort declarations and members by name instead of source order.
    #[serde(default)]
    pub sort_by_name: bool,
}

impl Settings {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();
        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
            config_path: config_path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "show_all = true\ndocument_private = true").unwrap();

        let settings = Settings::load_from_path(file.path()).unwrap();
        assert!(settings.show_all);
        assert!(settings.document_private);
        assert!(!settings.document_protected);
        assert!(!settings.sort_by_name);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = Settings::load_from_path("/nonexistent/headerdoc.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigReadError { .. }));
    }

    #[test]
    fn load_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "show_all = maybe").unwrap();

        let err = Settings::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().starts_with("Failed to parse config file"));
    }

    #[test]
    fn settings_serialization_roundtrip() {
        let original = Settings {
            document_protected: true,
            sort_by_name: true,
            ..Settings::default()
        };
        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(original, deserialized);
    }
}
