use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::llm::ChatOptions;
use crate::retry::RetryConfig;
use crate::review::ReviewOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-reviewer.toml.
/// All fields are optional — the tool works with zero config plus env
/// vars for the two tokens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Review run settings
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider API key. If None, falls back to LLM_API_KEY, then
    /// OPENAI_API_KEY.
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint base URL.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Per-request timeout in seconds; expiry classifies as timeout.
    pub request_timeout_secs: u64,
    /// Response token cap per request.
    pub max_response_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 120,
            max_response_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Token budget for one outbound request.
    pub token_limit: usize,
    /// Concurrent LLM calls.
    pub llm_concurrency: usize,
    /// Concurrent GitHub calls.
    pub github_concurrency: usize,
    /// Continue a prior run for the same commit when possible.
    pub resume: bool,
    /// Directory for persisted review state. Defaults to .pr-reviewer
    /// in the current directory.
    pub state_dir: Option<PathBuf>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            token_limit: 6000,
            llm_concurrency: 4,
            github_concurrency: 4,
            resume: true,
            state_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from .pr-reviewer.toml in the current
    /// directory. Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(".pr-reviewer.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token: config file value takes precedence,
    /// falls back to GITHUB_TOKEN env var.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }

    /// Resolve the LLM API key: config file, then LLM_API_KEY, then
    /// OPENAI_API_KEY.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .api_key
            .clone()
            .or_else(|| std::env::var("LLM_API_KEY").ok())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }

    /// Where the persisted state for a PR lives.
    pub fn state_path(&self, pr_number: u64) -> PathBuf {
        let dir = self
            .review
            .state_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".pr-reviewer"));
        dir.join(format!("review-state-{pr_number}.json"))
    }

    /// Assemble run options from the config, honoring a CLI resume
    /// override.
    pub fn review_options(&self, resume_override: Option<bool>) -> ReviewOptions {
        ReviewOptions {
            token_limit: self.review.token_limit,
            llm_concurrency: self.review.llm_concurrency.max(1),
            github_concurrency: self.review.github_concurrency.max(1),
            resume: resume_override.unwrap_or(self.review.resume),
            request_timeout: std::time::Duration::from_secs(self.llm.request_timeout_secs),
            chat: ChatOptions {
                model: self.llm.model.clone(),
                max_tokens: self.llm.max_response_tokens,
                temperature: 0.0,
            },
            retry: RetryConfig::default(),
        }
    }
}
