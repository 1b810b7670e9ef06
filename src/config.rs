use crate::fields::{BUILTIN_FIELDS, FieldCatalog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// Bounds of the quiet period before an authoritative check is sent.
pub const MIN_DEBOUNCE_MS: u64 = 300;
pub const MAX_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub api: ApiSettings,
    pub editor: EditorSettings,
    pub fields: FieldSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL the `/filters/*` paths are appended to
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Which kind of source an expression is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Stream,
    Epg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub debounce_ms: u64,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub is_inverse: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 400,
            source_type: SourceType::Stream,
            source_id: None,
            is_inverse: false,
        }
    }
}

impl EditorSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSettings {
    /// Catalog used when the server's field list cannot be fetched
    pub builtin: Vec<String>,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            builtin: BUILTIN_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FieldSettings {
    pub fn catalog(&self) -> FieldCatalog {
        if self.builtin.is_empty() {
            FieldCatalog::builtin()
        } else {
            FieldCatalog::from_names(self.builtin.iter().cloned())
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<FilterConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<FilterConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    toml::from_str::<FilterConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn default_config() -> &'static FilterConfig {
    static DEFAULT_CONFIG: LazyLock<FilterConfig> = LazyLock::new(FilterConfig::default);
    &DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: FilterConfig = toml::from_str(
            r#"
            [editor]
            source_type = "epg"
            "#,
        )
        .unwrap();
        assert_eq!(config.editor.source_type, SourceType::Epg);
        assert_eq!(config.editor.debounce_ms, 400);
        assert_eq!(config.api.timeout_secs, 10);
        assert!(config.fields.builtin.contains(&"channel_name".to_string()));
    }

    #[test]
    fn test_debounce_is_clamped() {
        let mut editor = EditorSettings {
            debounce_ms: 50,
            ..EditorSettings::default()
        };
        assert_eq!(editor.debounce(), Duration::from_millis(MIN_DEBOUNCE_MS));
        editor.debounce_ms = 10_000;
        assert_eq!(editor.debounce(), Duration::from_millis(MAX_DEBOUNCE_MS));
    }

    #[test]
    fn test_empty_builtin_list_falls_back() {
        let fields = FieldSettings {
            builtin: Vec::new(),
        };
        assert_eq!(fields.catalog(), FieldCatalog::builtin());
    }
}
