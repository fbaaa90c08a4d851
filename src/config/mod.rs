//! Configuration system
//!
//! Loads ~/.config/gitgloss/config.yaml with support for:
//! - The generation API credential (and an optional GitHub token)
//! - Cache sizing, sweep interval and per-tier TTLs
//! - Generation backend endpoint and sampling parameters
//!
//! The config file is the persistent settings store at the edge of the
//! system: it is read once at session start and rewritten on explicit
//! updates (`gitgloss login`). Cached AI output is invalidated whenever the
//! credential changes; see [`crate::session::Session::update_credential`].

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credential block: the generation API key plus an optional GitHub token
/// for authenticated (higher-quota) repository reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Generation backend API key
    pub api_key: Option<String>,

    /// GitHub token for the remote-fetch strategy (optional; anonymous
    /// requests work within GitHub's unauthenticated rate limits)
    pub github_token: Option<String>,

    /// When the credential was last updated (RFC 3339)
    pub updated_at: Option<String>,
}

impl CredentialConfig {
    /// Check if a generation API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Clear all stored credentials
    pub fn clear(&mut self) {
        self.api_key = None;
        self.github_token = None;
        self.updated_at = None;
    }
}

/// Cache sizing and freshness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Maximum number of live entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Seconds between background sweeps of expired entries
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// TTL for raw page/file content, in seconds
    #[serde(default = "default_content_ttl_secs")]
    pub content_ttl_secs: u64,

    /// TTL for aggregated project metadata, in seconds
    #[serde(default = "default_project_ttl_secs")]
    pub project_ttl_secs: u64,

    /// TTL for generated analysis text, in seconds
    #[serde(default = "default_analysis_ttl_secs")]
    pub analysis_ttl_secs: u64,
}

fn default_capacity() -> usize {
    50
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_content_ttl_secs() -> u64 {
    900
}

fn default_project_ttl_secs() -> u64 {
    1800
}

fn default_analysis_ttl_secs() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
            content_ttl_secs: default_content_ttl_secs(),
            project_ttl_secs: default_project_ttl_secs(),
            analysis_ttl_secs: default_analysis_ttl_secs(),
        }
    }
}

impl CacheSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn content_ttl(&self) -> Duration {
        Duration::from_secs(self.content_ttl_secs)
    }

    pub fn project_ttl(&self) -> Duration {
        Duration::from_secs(self.project_ttl_secs)
    }

    pub fn analysis_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis_ttl_secs)
    }
}

/// Generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Base endpoint of the generation API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens per request
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_max_output_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// gitgloss configuration
///
/// Represents the complete ~/.config/gitgloss/config.yaml file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitGlossConfig {
    /// Stored credentials
    #[serde(default)]
    pub credential: CredentialConfig,

    /// Cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl GitGlossConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default path (~/.config/gitgloss/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::GitGlossError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading gitgloss configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save_default(&self) -> Result<()> {
        self.save(Self::default_path())
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving gitgloss configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/gitgloss/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("gitgloss");
        path.push("config.yaml");
        path
    }

    /// Store a new generation API key, stamping the update time
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        self.credential.api_key = Some(key.into());
        self.credential.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Store a GitHub token
    pub fn set_github_token(&mut self, token: impl Into<String>) {
        self.credential.github_token = Some(token.into());
        self.credential.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = GitGlossConfig::new();
        assert!(!config.credential.is_configured());
        assert_eq!(config.cache.capacity, 50);
        assert_eq!(config.cache.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.cache.content_ttl(), Duration::from_secs(900));
        assert_eq!(config.cache.project_ttl(), Duration::from_secs(1800));
        assert_eq!(config.cache.analysis_ttl(), Duration::from_secs(3600));
        assert_eq!(config.generation.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_set_api_key() {
        let mut config = GitGlossConfig::new();
        config.set_api_key("AIza-test");

        assert!(config.credential.is_configured());
        assert!(config.credential.updated_at.is_some());
    }

    #[test]
    fn test_credential_clear() {
        let mut config = GitGlossConfig::new();
        config.set_api_key("AIza-test");
        config.set_github_token("ghp_test");

        config.credential.clear();
        assert!(!config.credential.is_configured());
        assert!(config.credential.github_token.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let mut config = GitGlossConfig::new();
        config.set_api_key("AIza-test");
        config.cache.capacity = 10;

        config.save(&path).unwrap();

        let loaded = GitGlossConfig::load(&path).unwrap();
        assert_eq!(loaded.credential.api_key.as_deref(), Some("AIza-test"));
        assert_eq!(loaded.cache.capacity, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let result = GitGlossConfig::load("/nonexistent/config.yaml");
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "credential:\n  api_key: AIza-test\n").unwrap();

        let loaded = GitGlossConfig::load(&path).unwrap();
        assert!(loaded.credential.is_configured());
        assert_eq!(loaded.cache.capacity, 50);
        assert_eq!(loaded.generation.max_output_tokens, 4096);
    }

    #[test]
    fn test_default_path() {
        let path = GitGlossConfig::default_path();
        assert!(path.ends_with("gitgloss/config.yaml"));
    }
}
