use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::BaselineReducer;

const DEFAULT_REPORTS_DIR: &str = "/reports";
const DEFAULT_SUMMARIZER_ENDPOINT: &str = "https://api-inference.huggingface.co/models/gpt-4";
const DEFAULT_API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";

/// Report configuration, passed explicitly into the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub comparison: ComparisonConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.reports_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidGeneral(
                "reports_dir cannot be empty".to_string(),
            ));
        }

        if self.source.path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidSource(
                "path cannot be empty".to_string(),
            ));
        }

        if self.comparison.enabled && self.comparison.baseline_span.is_zero() {
            log::warn!("comparison.baseline_span is zero; every baseline comparison will be undefined");
        }

        if self.summarizer.enabled {
            if self.summarizer.endpoint.trim().is_empty() {
                return Err(ValidationError::InvalidSummarizer(
                    "endpoint cannot be empty when the summarizer is enabled".to_string(),
                ));
            }
            if self.summarizer.timeout.is_zero() {
                return Err(ValidationError::InvalidSummarizer(
                    "timeout must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Fill in secrets from the process environment.
    pub fn resolve_secrets(&mut self) {
        self.resolve_secrets_with(|name| std::env::var(name).ok());
    }

    /// Fill in secrets using an arbitrary lookup, e.g. a fixed map in tests.
    pub fn resolve_secrets_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.summarizer.api_key.is_none() {
            self.summarizer.api_key = lookup(self.summarizer.api_key_env.as_str()).filter(|k| !k.is_empty());
        }
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory receiving JSON, text and HTML reports
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Where sample rows are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSON dump of sample rows joined with meter metadata
    pub path: PathBuf,
}

/// Baseline comparison settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Length of the baseline window, ending with the current day
    #[serde(default = "default_baseline_span", with = "humantime_serde")]
    pub baseline_span: Duration,
    /// How baseline energy is reduced before comparison
    #[serde(default)]
    pub reducer: BaselineReducer,
}

/// Narrative summarization service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid source configuration: {0}")]
    InvalidSource(String),
    #[error("Invalid summarizer configuration: {0}")]
    InvalidSummarizer(String),
}

fn default_true() -> bool {
    true
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from(DEFAULT_REPORTS_DIR)
}

fn default_baseline_span() -> Duration {
    Duration::from_secs(365 * 86_400)
}

fn default_endpoint() -> String {
    DEFAULT_SUMMARIZER_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            log_level: None,
        }
    }
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            baseline_span: default_baseline_span(),
            reducer: BaselineReducer::DailyMean,
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            api_key: None,
            timeout: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let yaml = r#"
source:
  path: "samples.json"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.general.reports_dir, PathBuf::from("/reports"));
        assert!(config.comparison.enabled);
        assert_eq!(config.comparison.baseline_span, Duration::from_secs(365 * 86_400));
        assert_eq!(config.comparison.reducer, BaselineReducer::DailyMean);
        assert!(!config.summarizer.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_general_defaults_match_empty_section() {
        let yaml = r#"
general:
  reports_dir: "/reports"
source:
  path: "samples.json"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let defaults = GeneralConfig::default();
        assert_eq!(config.general.log_level, defaults.log_level);
        assert_eq!(config.general.log_level, None);
        assert_eq!(config.general.reports_dir, defaults.reports_dir);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
general:
  reports_dir: "/tmp/reports"
  log_level: debug
source:
  path: "dump.json"
comparison:
  enabled: true
  baseline_span: "30days"
  reducer: sum
summarizer:
  enabled: true
  endpoint: "http://localhost:8080/generate"
  api_key_env: "SUMMARY_KEY"
  timeout: "5s"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.comparison.baseline_span, Duration::from_secs(30 * 86_400));
        assert_eq!(config.comparison.reducer, BaselineReducer::Sum);
        assert_eq!(config.summarizer.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_summarizer() {
        let yaml = r#"
source:
  path: "dump.json"
summarizer:
  enabled: true
  endpoint: ""
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidSummarizer(_))
        ));
    }

    #[test]
    fn test_empty_source_path() {
        let yaml = r#"
source:
  path: ""
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidSource(_))));
    }

    #[test]
    fn test_resolve_secrets_with_lookup() {
        let yaml = r#"
source:
  path: "dump.json"
summarizer:
  api_key_env: "SUMMARY_KEY"
"#;
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.resolve_secrets_with(|name| (name == "SUMMARY_KEY").then(|| "secret".to_string()));
        assert_eq!(config.summarizer.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let mut config: Config = serde_yaml::from_str("source:\n  path: dump.json\n").unwrap();
        config.summarizer.api_key = Some("secret".to_string());
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
    }
}
