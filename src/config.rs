//! User configuration from ~/.verdigris/config.toml
//!
//! A default file is written on first load. The provider API key is
//! never stored in the file; it comes from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::answers::ResolverConfig;
use crate::applicator::EngineConfig;
use crate::retry::RetryPolicy;

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "VERDIGRIS_API_KEY";

const DEFAULT_CONFIG: &str = r#"# Verdigris Configuration

[matching]
# Only near-duplicate questions are auto-answered; lower thresholds
# risk answering a different question with a stale value
similarity_threshold = 0.95

[apply]
# Step ceiling per application session
max_steps = 10

[providers]
embeddings_url = "https://api.deepinfra.com/v1/inference/BAAI/bge-large-en-v1.5"
embeddings_model = "BAAI/bge-large-en-v1.5"
embeddings_dimension = 1024
completions_url = "https://api.deepinfra.com/v1/openai/chat/completions"
completions_model = "meta-llama/Meta-Llama-3.1-8B-Instruct"

[retry]
max_attempts = 4
base_delay_ms = 500

[profile]
user_information = ""
keywords = []

[storage]
data_dir = "~/.verdigris"
"#;

/// User configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingSection,
    pub apply: ApplySection,
    pub providers: ProvidersSection,
    pub retry: RetrySection,
    pub profile: ProfileSection,
    pub storage: StorageSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    pub similarity_threshold: f32,
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.95,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplySection {
    pub max_steps: u32,
}

impl Default for ApplySection {
    fn default() -> Self {
        Self { max_steps: 10 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersSection {
    pub embeddings_url: String,
    pub embeddings_model: String,
    pub embeddings_dimension: usize,
    pub completions_url: String,
    pub completions_model: String,
}

impl Default for ProvidersSection {
    fn default() -> Self {
        Self {
            embeddings_url: "https://api.deepinfra.com/v1/inference/BAAI/bge-large-en-v1.5"
                .to_string(),
            embeddings_model: "BAAI/bge-large-en-v1.5".to_string(),
            embeddings_dimension: 1024,
            completions_url: "https://api.deepinfra.com/v1/openai/chat/completions".to_string(),
            completions_model: "meta-llama/Meta-Llama-3.1-8B-Instruct".to_string(),
        }
    }
}

impl ProvidersSection {
    /// Provider API key from the environment
    pub fn api_key(&self) -> Result<String> {
        std::env::var(API_KEY_ENV)
            .with_context(|| format!("Set {API_KEY_ENV} to your provider API key"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
        }
    }
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProfileSection {
    /// Free-form candidate background handed to the fallback provider
    pub user_information: String,
    /// Keywords for relevance screening
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "~/.verdigris".to_string(),
        }
    }
}

impl Config {
    /// Load user configuration, writing the default file on first use
    pub fn load() -> Result<Self> {
        let config_path = config_path();

        if !config_path.exists() {
            return Self::create_default();
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
        let config: Config = toml::from_str(&content).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn create_default() -> Result<Self> {
        let home = verdigris_home();
        std::fs::create_dir_all(&home)
            .with_context(|| format!("Failed to create {}", home.display()))?;
        std::fs::write(home.join("config.toml"), DEFAULT_CONFIG)?;

        toml::from_str(DEFAULT_CONFIG).context("Failed to parse default config TOML")
    }

    /// Reject values the end-to-end scenarios cannot hold under
    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("similarity_threshold must be between 0.0 and 1.0 (got {threshold})");
        }
        if self.apply.max_steps == 0 {
            bail!("max_steps must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry max_attempts must be at least 1");
        }
        if self.providers.embeddings_dimension == 0 {
            bail!("embeddings_dimension must be at least 1");
        }
        Ok(())
    }

    pub fn resolver(&self) -> ResolverConfig {
        ResolverConfig {
            similarity_threshold: self.matching.similarity_threshold,
            dimension: self.providers.embeddings_dimension,
        }
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            resolver: self.resolver(),
            max_steps: self.apply.max_steps,
        }
    }

    /// Resolved data directory (tilde expanded)
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.data_dir).as_ref())
    }
}

/// User's verdigris home directory: `~/.verdigris/`
pub fn verdigris_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".verdigris")
}

fn config_path() -> PathBuf {
    verdigris_home().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses_and_validates() -> Result<()> {
        let config: Config = toml::from_str(DEFAULT_CONFIG)?;
        config.validate()?;
        assert_eq!(config.matching.similarity_threshold, 0.95);
        assert_eq!(config.apply.max_steps, 10);
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.providers.embeddings_dimension, 1024);
        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [matching]
            similarity_threshold = 0.9

            [profile]
            keywords = ["rust", "backend"]
            "#,
        )?;
        config.validate()?;
        assert_eq!(config.matching.similarity_threshold, 0.9);
        assert_eq!(config.apply.max_steps, 10);
        assert_eq!(config.profile.keywords, vec!["rust", "backend"]);
        Ok(())
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let config: Config = toml::from_str(
            r#"
            [matching]
            similarity_threshold = 1.5
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let config: Config = toml::from_str(
            r#"
            [apply]
            max_steps = 0
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_dir_tilde_expansion() {
        let config = Config::default();
        let dir = config.data_dir();
        assert!(!dir.to_string_lossy().starts_with('~'));
        assert!(dir.to_string_lossy().ends_with(".verdigris"));
    }

    #[test]
    fn test_resolver_config_mirrors_sections() {
        let config = Config::default();
        let resolver = config.resolver();
        assert_eq!(resolver.similarity_threshold, 0.95);
        assert_eq!(resolver.dimension, 1024);
    }
}
