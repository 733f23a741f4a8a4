//! Application configuration for bookmirror.
//!
//! User config lives at `~/.bookmirror/bookmirror.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookmirror.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookmirror";

// ---------------------------------------------------------------------------
// Config structs (matching bookmirror.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Content/auth API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default output directory for mirrored books.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// How many section subtrees may be in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output_dir() -> String {
    ".".into()
}
fn default_concurrency() -> u32 {
    10
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL for the content API (book editions, exercises).
    #[serde(default = "default_content_base_url")]
    pub content_base_url: String,

    /// Base URL for the auth API (session token → jwt exchange).
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,

    /// `origin` header sent with every request.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// `referer` header sent with every request.
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Name of the env var holding the session token (never store the token itself).
    #[serde(default = "default_session_token_env")]
    pub session_token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            content_base_url: default_content_base_url(),
            auth_base_url: default_auth_base_url(),
            origin: default_origin(),
            referer: default_referer(),
            session_token_env: default_session_token_env(),
        }
    }
}

fn default_content_base_url() -> String {
    "https://content.respondeai.com.br".into()
}
fn default_auth_base_url() -> String {
    "https://www.respondeai.com.br".into()
}
fn default_origin() -> String {
    "https://app.respondeai.com.br".into()
}
fn default_referer() -> String {
    "https://app.respondeai.com.br/".into()
}
fn default_session_token_env() -> String {
    "BOOKMIRROR_SESSION_TOKEN".into()
}

// ---------------------------------------------------------------------------
// Mirror config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime mirror configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Output root under which the book directory is created.
    pub output_dir: PathBuf,
    /// Maximum concurrently processed section subtrees.
    pub concurrency: u32,
}

impl From<&AppConfig> for MirrorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&config.defaults.output_dir),
            concurrency: config.defaults.concurrency,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookmirror/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MirrorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookmirror/bookmirror.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| MirrorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| MirrorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| MirrorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| MirrorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| MirrorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the session token from the configured env var. Errors if unset or empty.
pub fn resolve_session_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.api.session_token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(MirrorError::config(format!(
            "session token not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("BOOKMIRROR_SESSION_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.concurrency, 10);
        assert_eq!(parsed.api.session_token_env, "BOOKMIRROR_SESSION_TOKEN");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
concurrency = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.concurrency, 4);
        assert_eq!(config.defaults.output_dir, ".");
        assert!(config.api.content_base_url.starts_with("https://"));
    }

    #[test]
    fn mirror_config_from_app_config() {
        let app = AppConfig::default();
        let mirror = MirrorConfig::from(&app);
        assert_eq!(mirror.concurrency, 10);
        assert_eq!(mirror.output_dir, PathBuf::from("."));
    }

    #[test]
    fn session_token_resolution() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.api.session_token_env = "BM_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = resolve_session_token(&config);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("session token not found")
        );
    }
}
