//! Store configuration.

use pathstore_path::{MAX_ARRAY_INDEX, MAX_PATH_LENGTH};
use serde::{Deserialize, Serialize};

use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Warn at construction when no devtools port is supplied.
    #[serde(default)]
    pub devtools: bool,

    /// Paths deeper than this are rejected by every store operation.
    #[serde(default = "default_max_path_depth")]
    pub max_path_depth: usize,

    /// Largest array position a path may address. Writing past the end of
    /// an array fills the gap with `null`, so this bounds that growth.
    #[serde(default = "default_max_array_index")]
    pub max_array_index: usize,

    /// Catch subscriber panics and keep dispatching to the others.
    #[serde(default = "default_true")]
    pub catch_panics: bool,
}

fn default_max_path_depth() -> usize {
    MAX_PATH_LENGTH
}

fn default_max_array_index() -> usize {
    MAX_ARRAY_INDEX
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            devtools: false,
            max_path_depth: default_max_path_depth(),
            max_array_index: default_max_array_index(),
            catch_panics: true,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON config object. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// [`StoreError::Config`] when the text is not a valid config object.
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(StoreError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = StoreConfig::from_json_str(r#"{"devtools": true}"#).unwrap();
        assert!(config.devtools);
        assert_eq!(config.max_path_depth, 256);
        assert_eq!(config.max_array_index, 1 << 20);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(StoreConfig::from_json_str("{}").unwrap(), StoreConfig::default());
    }

    #[test]
    fn test_bad_config_is_error() {
        let err = StoreConfig::from_json_str(r#"{"max_path_depth": "deep"}"#).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
