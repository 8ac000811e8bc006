//! Roadmapper configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::llm::LlmError;
use crate::progress::AnimationKind;

/// Main Roadmapper configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Pipeline presentation settings
    pub pipeline: PipelineConfig,

    /// Where saved roadmaps go
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::search_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; the full `load` reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::search_paths(),
        };
        candidates
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    /// Project-local config first, then the user config directory
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".roadmapper.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("roadmapper").join("roadmapper.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// File containing the API key; takes precedence over the env var
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<PathBuf>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Extended reasoning budget for draft and refine (0 disables)
    #[serde(rename = "thinking-budget")]
    pub thinking_budget: u32,

    /// Request incremental responses
    pub stream: bool,

    /// Request timeout in milliseconds; unset means wait indefinitely
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-7-sonnet-20250219".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key_file: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 16000,
            thinking_budget: 10000,
            stream: true,
            timeout_ms: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the key file or the environment
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        debug!(api_key_env = %self.api_key_env, api_key_file = ?self.api_key_file, "get_api_key: called");
        if let Some(ref path) = self.api_key_file {
            let expanded = expand_home(path);
            debug!(?expanded, "get_api_key: reading key file");
            let key = fs::read_to_string(&expanded)
                .map_err(|e| LlmError::MissingApiKey(format!("cannot read {}: {}", expanded.display(), e)))?;
            let key = key.trim().to_string();
            if key.is_empty() {
                return Err(LlmError::MissingApiKey(format!("{} is empty", expanded.display())));
            }
            return Ok(key);
        }

        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => {
                debug!("get_api_key: env var missing or empty");
                Err(LlmError::MissingApiKey(format!(
                    "set the {} environment variable or api-key-file",
                    self.api_key_env
                )))
            }
        }
    }
}

/// Pipeline presentation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Progress animation shown while a stage waits on the service
    pub animation: AnimationKind,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the `save` command writes into
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("roadmaps"),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
