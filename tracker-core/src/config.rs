use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, TrackerError};

/// Name of the per-user config directory under `$HOME`.
const CONFIG_DIR_NAME: &str = ".daily-tracker";

/// Local config file, overrides the global one.
pub const LOCAL_CONFIG_FILE: &str = "tracker.toml";

/// Load environment variables from .env files in multiple locations
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.daily-tracker/.env
pub fn load_dotenv() -> anyhow::Result<()> {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(format!("current directory ({})", path.display()));
        debug!("Loaded .env from current directory: {}", path.display());
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            // dotenvy doesn't overwrite existing vars
            match dotenvy::from_path(&env_file) {
                Ok(_) => {
                    loaded_from.push(env_file.display().to_string());
                    debug!("Loaded .env from {}", env_file.display());
                }
                Err(e) => {
                    debug!("Failed to load {}: {}", env_file.display(), e);
                }
            }
        }
    }

    if loaded_from.is_empty() {
        info!("Using environment variables only (no .env file found)");
    } else {
        info!("Loaded configuration from: {}", loaded_from.join(", "));
    }

    Ok(())
}

/// Get the tracker config directory path (~/.daily-tracker)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

/// Config files consulted by [`TrackerConfig::load`], lowest priority first.
pub fn config_paths() -> Vec<PathBuf> {
    config_dir()
        .map(|d| d.join("config.toml"))
        .into_iter()
        .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
        .collect()
}

// ============================================================================
// TOML Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub database: DatabaseSection,

    #[serde(default)]
    pub ai: AiSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Allow any CORS origin instead of localhost only
    #[serde(default)]
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiSection {
    #[serde(default = "default_ai_model")]
    pub model: String,

    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// Seconds a failed key is skipped before it is tried again
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// API keys, rotated round-robin. Usually supplied via GEMINI_API_KEYS.
    #[serde(default, skip_serializing)]
    pub keys: Vec<String>,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            model: default_ai_model(),
            base_url: default_ai_base_url(),
            cooldown_secs: default_cooldown_secs(),
            keys: Vec::new(),
        }
    }
}

// Default value functions for serde
fn default_bind() -> String {
    "127.0.0.1:3030".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_ai_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_ai_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_cooldown_secs() -> u64 {
    60
}

impl TrackerConfig {
    /// Load config from TOML files, then apply environment overrides.
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment (DATABASE_URL, TRACKER_BIND, GEMINI_API_KEYS, GEMINI_MODEL)
    /// 2. ./tracker.toml
    /// 3. ~/.daily-tracker/config.toml
    /// 4. Built-in defaults
    ///
    /// Unreadable or malformed files are logged and skipped.
    pub fn load() -> Self {
        let mut config = TrackerConfig::default();

        for path in config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(&path) {
                Ok(loaded) => {
                    debug!("Loaded config from {}", path.display());
                    config = loaded;
                }
                Err(e) => warn!("{}", e),
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Parse a single TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| TrackerError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(bind) = lookup("TRACKER_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = bind;
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|v| !v.is_empty()) {
            self.ai.model = model;
        }
        if let Some(keys) = lookup("GEMINI_API_KEYS") {
            let parsed = parse_key_list(&keys);
            if !parsed.is_empty() {
                self.ai.keys = parsed;
            }
        }
    }

    /// Database URL, or a configuration error naming every way to set it.
    pub fn database_url(&self) -> Result<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            TrackerError::config(
                "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or [database] url in tracker.toml",
            )
        })
    }
}

/// Split a comma-separated key list, dropping blanks and surrounding spaces.
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_config_dir_returns_path() {
        if let Some(path) = config_dir() {
            assert!(path.ends_with(".daily-tracker"));
        }
    }

    #[test]
    fn test_load_dotenv_doesnt_panic() {
        assert!(load_dotenv().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:3030");
        assert!(!config.server.cors_permissive);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.ai.cooldown_secs, 60);
        assert!(config.ai.keys.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\ncors_permissive = true\n\n[ai]\nmodel = \"gemini-pro\"").unwrap();

        let config = TrackerConfig::load_from_path(file.path()).unwrap();
        assert!(config.server.cors_permissive);
        assert_eq!(config.server.bind, "127.0.0.1:3030");
        assert_eq!(config.ai.model, "gemini-pro");
        assert_eq!(config.ai.cooldown_secs, 60);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();

        let err = TrackerConfig::load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigParse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "postgres://localhost/tracker"),
            ("GEMINI_API_KEYS", " k1, ,k2 ,"),
        ]
        .into_iter()
        .collect();

        let mut config = TrackerConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_url().unwrap(), "postgres://localhost/tracker");
        assert_eq!(config.ai.keys, vec!["k1", "k2"]);
        assert_eq!(config.server.bind, "127.0.0.1:3030");
    }

    #[test]
    fn test_missing_database_url() {
        let config = TrackerConfig::default();
        assert!(matches!(config.database_url(), Err(TrackerError::Config { .. })));
    }
}
