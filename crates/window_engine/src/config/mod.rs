//! Configuration files
//!
//! Creation hints and engine settings can be kept in TOML or RON files. The
//! format is picked from the file extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Loadable and savable configuration
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Format::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Load configuration, falling back to defaults if the file is missing or broken
    fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load_from_file(path).unwrap_or_else(|e| {
            log::warn!("Using default configuration instead of {}: {e}", path.display());
            Self::default()
        })
    }

    /// Save configuration to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Process-wide settings read before the platform comes up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// `env_logger` filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Creation hints file applied after init
    pub hints_path: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            hints_path: None,
        }
    }
}

impl Config for EngineSettings {}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("window_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_settings_round_trip_toml() {
        let path = temp_path("settings.toml");
        let settings = EngineSettings {
            log_level: "debug".to_string(),
            hints_path: Some("hints.ron".to_string()),
        };
        settings.save_to_file(&path).unwrap();
        let loaded = EngineSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_settings_round_trip_ron() {
        let path = temp_path("settings.ron");
        let settings = EngineSettings::default();
        settings.save_to_file(&path).unwrap();
        let loaded = EngineSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let path = temp_path("partial.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();
        let loaded = EngineSettings::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.log_level, "warn");
        assert_eq!(loaded.hints_path, None);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineSettings::default().save_to_file(temp_path("settings.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
        assert!(EngineSettings::load_or_default(temp_path("missing.toml")) == EngineSettings::default());
    }
}
