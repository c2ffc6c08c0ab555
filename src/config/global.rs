//! Application configuration.
//!
//! Loaded from --config, .ready4uni.yml or ~/.config/ready4uni/ready4uni.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::llm::anthropic::{ANTHROPIC_BASE_URL, DEFAULT_API_KEY_ENV, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::llm::{AnthropicConfig, RetryPolicy};
use crate::services::grades::GradingScale;

/// Upper bound for `session.timeout-minutes` (one week).
pub const MAX_SESSION_TIMEOUT_MINUTES: i64 = 7 * 24 * 60;

/// Configuration for Ready4Uni.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider settings.
    pub llm: LlmConfig,

    /// Agent loop limits.
    pub agent: AgentConfig,

    /// Majors dataset location.
    pub data: DataConfig,

    /// Transcript upload rules.
    pub uploads: UploadConfig,

    /// Chat session settings.
    pub session: SessionConfig,

    /// Grade scale thresholds.
    pub grading: GradingScale,
}

impl Config {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .ready4uni.yml in current directory
    /// 3. ~/.config/ready4uni/ready4uni.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            let config = Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
            config.validate()?;
            return Ok(config);
        }

        let project_config = PathBuf::from(".ready4uni.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .ready4uni.yml");
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .ready4uni.yml: {}", e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ready4uni").join("ready4uni.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        config.validate()?;
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            eyre::bail!("llm.model must not be empty");
        }
        if self.llm.max_tokens == 0 {
            eyre::bail!("llm.max-tokens must be > 0");
        }
        if self.llm.timeout_ms == 0 {
            eyre::bail!("llm.timeout-ms must be > 0");
        }
        if self.agent.max_iterations == 0 {
            eyre::bail!("agent.max-iterations must be > 0");
        }
        if self.agent.max_tool_calls == 0 {
            eyre::bail!("agent.max-tool-calls must be > 0");
        }
        if self.uploads.max_size_mb == 0 {
            eyre::bail!("uploads.max-size-mb must be > 0");
        }
        if self.uploads.allowed_extensions.is_empty() {
            eyre::bail!("uploads.allowed-extensions must not be empty");
        }
        if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&self.session.timeout_minutes) {
            eyre::bail!(
                "session.timeout-minutes must be between 1 and {}",
                MAX_SESSION_TIMEOUT_MINUTES
            );
        }
        let g = &self.grading;
        if !(0.0 < g.passing_grade && g.passing_grade <= g.strength_threshold && g.strength_threshold <= g.max_grade) {
            eyre::bail!("grading thresholds must satisfy 0 < passing-grade <= strength-threshold <= max-grade");
        }
        Ok(())
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier.
    pub model: String,

    /// Environment variable holding the API key.
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Base URL for the API.
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response.
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Timeout per LLM call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Attempts per API call, including the first.
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Linear backoff step in milliseconds.
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: ANTHROPIC_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

impl LlmConfig {
    pub fn anthropic(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            timeout: Duration::from_millis(self.timeout_ms),
            base_url: self.base_url.clone(),
            api_key_env: self.api_key_env.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Agent loop limits.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool-decision rounds per message.
    #[serde(rename = "max-iterations")]
    pub max_iterations: usize,

    /// Maximum tool executions per message.
    #[serde(rename = "max-tool-calls")]
    pub max_tool_calls: usize,

    /// Past messages shown to the intent router.
    #[serde(rename = "history-window")]
    pub history_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_tool_calls: 10,
            history_window: 3,
        }
    }
}

/// Majors dataset location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to a majors JSON file; the bundled dataset is used when unset.
    #[serde(rename = "majors-path")]
    pub majors_path: Option<PathBuf>,
}

/// Transcript upload rules.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum file size in megabytes.
    #[serde(rename = "max-size-mb")]
    pub max_size_mb: u64,

    /// Accepted file extensions, without the dot.
    #[serde(rename = "allowed-extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 10,
            allowed_extensions: vec!["pdf".to_string()],
        }
    }
}

impl UploadConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb * 1024 * 1024
    }
}

/// Chat session settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity timeout before a session is considered expired.
    #[serde(rename = "timeout-minutes")]
    pub timeout_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { timeout_minutes: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.max_tool_calls, 10);
        assert_eq!(config.uploads.max_size_mb, 10);
        assert_eq!(config.uploads.allowed_extensions, vec!["pdf"]);
        assert_eq!(config.session.timeout_minutes, 30);
        assert_eq!(config.grading.passing_grade, 10.0);
        assert!(config.data.majors_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_partial_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        std::fs::write(
            &path,
            "llm:\n  model: claude-3-5-haiku-20241022\n  max-retries: 2\nagent:\n  max-tool-calls: 4\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "claude-3-5-haiku-20241022");
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.llm.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.agent.max_tool_calls, 4);
        assert_eq!(config.agent.max_iterations, 5);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/ready4uni.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "agent:\n  max-iterations: 0\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("max-iterations"));
    }

    #[test]
    fn test_validate_llm_timeout() {
        let mut config = Config::default();
        config.llm.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout-ms"));
    }

    #[test]
    fn test_validate_session_timeout_bounds() {
        let mut config = Config::default();
        for minutes in [0, -5, MAX_SESSION_TIMEOUT_MINUTES + 1, i64::MAX] {
            config.session.timeout_minutes = minutes;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("timeout-minutes"), "{} accepted", minutes);
        }

        config.session.timeout_minutes = MAX_SESSION_TIMEOUT_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_zero_session_timeout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(&path, "session:\n  timeout-minutes: 0\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_grading_order() {
        let mut config = Config::default();
        config.grading.passing_grade = 15.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.grading.strength_threshold = 21.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_llm_conversions() {
        let config = LlmConfig {
            timeout_ms: 5_000,
            max_retries: 2,
            retry_delay_ms: 250,
            ..Default::default()
        };
        let anthropic = config.anthropic();
        assert_eq!(anthropic.timeout, Duration::from_secs(5));
        assert_eq!(anthropic.model, DEFAULT_MODEL);

        let retry = config.retry_policy();
        assert_eq!(retry.max_attempts, 2);
        assert_eq!(retry.delay, Duration::from_millis(250));
    }

    #[test]
    fn test_upload_size_bytes() {
        assert_eq!(UploadConfig::default().max_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_yaml_roundtrip_uses_kebab_keys() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("max-tool-calls"));
        assert!(yaml.contains("api-key-env"));
        assert!(yaml.contains("passing-grade"));
    }
}
