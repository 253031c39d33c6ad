//! Application configuration for compdef.
//!
//! User config lives at `~/.compdef/compdef.toml`. Missing file or missing
//! keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CompdefError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "compdef.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".compdef";

// ---------------------------------------------------------------------------
// Config structs (matching compdef.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub coordinator: CoordinatorSection,

    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub storage: StorageSection,
}

/// `[coordinator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorSection {
    /// Maximum concurrent `get` calls during a batch lookup.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    10
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSection {
    /// Re-raise store read failures other than "not found" instead of
    /// recomputing.
    #[serde(default)]
    pub strict_reads: bool,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// Path of the libSQL definitions database. `~/` is expanded.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "~/.compdef/definitions.db".into()
}

impl StorageSection {
    /// Resolve the configured path, expanding a leading `~/`.
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match self.path.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    CompdefError::config("could not determine home directory")
                })?;
                Ok(home.join(rest))
            }
            None => Ok(PathBuf::from(&self.path)),
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator config (runtime)
// ---------------------------------------------------------------------------

/// Runtime settings for the definition coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Batch fan-out limit.
    pub concurrency: usize,
    /// See [`CacheSection::strict_reads`].
    pub strict_reads: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CoordinatorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            concurrency: config.coordinator.concurrency,
            strict_reads: config.cache.strict_reads,
        }
    }
}

impl CoordinatorConfig {
    /// Reject settings the coordinator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CompdefError::config("coordinator.concurrency must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.compdef/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CompdefError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.compdef/compdef.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CompdefError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| CompdefError::config(format!("failed to parse {}: {e}", path.display())))?;

    CoordinatorConfig::from(&config).validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CompdefError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| CompdefError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CompdefError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("concurrency = 10"));
        assert!(toml_str.contains("strict_reads = false"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[cache]
strict_reads = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let runtime = CoordinatorConfig::from(&config);
        assert!(runtime.strict_reads);
        assert_eq!(runtime.concurrency, 10);
    }

    #[test]
    fn store_tool_is_not_configurable() {
        let toml_str = r#"
[coordinator]
concurrency = 3
tool = "other"
tool_version = "9"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let serialized = toml::to_string_pretty(&config).expect("serialize");
        assert!(!serialized.contains("tool"));
        assert_eq!(CoordinatorConfig::from(&config).concurrency, 3);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = CoordinatorConfig {
            concurrency: 0,
            ..CoordinatorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn load_from_file_validates() {
        let path = std::env::temp_dir().join(format!("compdef_cfg_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[coordinator]\nconcurrency = 0\n").unwrap();
        assert!(load_config_from(&path).is_err());

        std::fs::write(&path, "[coordinator]\nconcurrency = 4\n").unwrap();
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.coordinator.concurrency, 4);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn storage_path_expands_home() {
        let section = StorageSection {
            path: "/var/lib/compdef/defs.db".into(),
        };
        assert_eq!(
            section.resolved_path().unwrap(),
            PathBuf::from("/var/lib/compdef/defs.db")
        );

        let section = StorageSection::default();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                section.resolved_path().unwrap(),
                home.join(".compdef/definitions.db")
            );
        }
    }
}
