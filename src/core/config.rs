//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.lens/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::tools::LAW_SEARCH_TOOL;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LensConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Arbitrary keys merged into every chat request body.
    #[serde(default)]
    pub extra_params: toml::Table,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub user_id: Option<String>,
    pub sources_tool: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub stream_path: Option<String>,
    pub session_path: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STREAM_PATH: &str = "/chat/stream";
pub const DEFAULT_SESSION_PATH: &str = "/api/chat";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub stream_path: String,
    pub session_path: String,
    pub user_id: Option<String>,
    pub sources_tool: String,
    pub request_timeout: Duration,
    pub extra_params: Map<String, Value>,
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.lens/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".lens").join("config.toml"))
}

/// Load config from `~/.lens/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `LensConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<LensConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(LensConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(LensConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<LensConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: LensConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Lens Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# user_id = "u-123"                  # Or set LENS_USER_ID env var
# sources_tool = "search_laws"       # Tool whose results back an answer
# request_timeout_secs = 600         # Or set LENS_REQUEST_TIMEOUT_SECS

# [api]
# base_url = "http://localhost:8000" # Or set LENS_API_BASE_URL
# stream_path = "/chat/stream"
# session_path = "/api/chat"

# [extra_params]                     # Merged into every chat request body
# include_rag = true
# lang = "tw"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &LensConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env<F>(config: &LensConfig, cli: &CliOverrides, env: F) -> ResolvedConfig
where
    F: Fn(&str) -> Option<String>,
{
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("LENS_API_BASE_URL"))
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // User: CLI → env → config
    let user_id = cli
        .user_id
        .clone()
        .or_else(|| env("LENS_USER_ID"))
        .or_else(|| config.general.user_id.clone());

    // Timeout: env → config → default
    let timeout_secs = env("LENS_REQUEST_TIMEOUT_SECS")
        .and_then(|s| match s.parse::<u64>() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring LENS_REQUEST_TIMEOUT_SECS={}: {}", s, e);
                None
            }
        })
        .or(config.general.request_timeout_secs)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

    ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        stream_path: config
            .api
            .stream_path
            .clone()
            .unwrap_or_else(|| DEFAULT_STREAM_PATH.to_string()),
        session_path: config
            .api
            .session_path
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_PATH.to_string()),
        user_id,
        sources_tool: config
            .general
            .sources_tool
            .clone()
            .unwrap_or_else(|| LAW_SEARCH_TOOL.to_string()),
        request_timeout: Duration::from_secs(timeout_secs),
        extra_params: extra_params_to_json(&config.extra_params),
    }
}

/// Converts the `[extra_params]` table into a JSON object.
fn extra_params_to_json(table: &toml::Table) -> Map<String, Value> {
    let mut params = Map::new();
    for (key, value) in table {
        match serde_json::to_value(value) {
            Ok(json) => {
                params.insert(key.clone(), json);
            }
            Err(e) => warn!("Skipping extra param {}: {}", key, e),
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_default_config_parses() {
        let config = LensConfig::default();
        assert!(config.extra_params.is_empty());
        assert!(config.general.user_id.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&LensConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.stream_path, DEFAULT_STREAM_PATH);
        assert_eq!(resolved.session_path, DEFAULT_SESSION_PATH);
        assert_eq!(resolved.sources_tool, "search_laws");
        assert_eq!(resolved.request_timeout, Duration::from_secs(600));
        assert!(resolved.user_id.is_none());
    }

    #[test]
    fn test_toml_values_override_defaults() {
        let toml_str = r#"
[general]
user_id = "u-1"
sources_tool = "search_cases"
request_timeout_secs = 30

[api]
base_url = "https://law.example.com/"
stream_path = "/legal/stream"

[extra_params]
include_rag = false
lang = "tw"
"#;
        let config: LensConfig = toml::from_str(toml_str).unwrap();
        let resolved = resolve_with_env(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.base_url, "https://law.example.com");
        assert_eq!(resolved.stream_path, "/legal/stream");
        assert_eq!(resolved.session_path, DEFAULT_SESSION_PATH);
        assert_eq!(resolved.user_id.as_deref(), Some("u-1"));
        assert_eq!(resolved.sources_tool, "search_cases");
        assert_eq!(resolved.request_timeout, Duration::from_secs(30));
        assert_eq!(resolved.extra_params["include_rag"], json!(false));
        assert_eq!(resolved.extra_params["lang"], json!("tw"));
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let config: LensConfig = toml::from_str(
            r#"
[general]
user_id = "file-user"
[api]
base_url = "http://file"
"#,
        )
        .unwrap();
        let env = |key: &str| match key {
            "LENS_API_BASE_URL" => Some("http://env".to_string()),
            "LENS_USER_ID" => Some("env-user".to_string()),
            "LENS_REQUEST_TIMEOUT_SECS" => Some("not-a-number".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, &CliOverrides::default(), env);
        assert_eq!(resolved.base_url, "http://env");
        assert_eq!(resolved.user_id.as_deref(), Some("env-user"));
        assert_eq!(resolved.request_timeout, Duration::from_secs(600));

        let cli = CliOverrides {
            base_url: Some("http://cli".into()),
            user_id: Some("cli-user".into()),
        };
        let resolved = resolve_with_env(&config, &cli, env);
        assert_eq!(resolved.base_url, "http://cli");
        assert_eq!(resolved.user_id.as_deref(), Some("cli-user"));
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: LensConfig = toml::from_str("[general]\nuser_id = \"u\"\n").unwrap();
        assert_eq!(config.general.user_id.as_deref(), Some("u"));
        assert!(config.api.base_url.is_none());
        assert!(config.extra_params.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("lens-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "[general\nuser_id = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
        fs::remove_dir_all(&dir).unwrap();
    }
}
