//! Narrative summarization of a finished report.
//!
//! The summarizer is an optional collaborator: any failure is logged and
//! replaced by [`NO_SUMMARY`] so the report is still produced.

use std::time::Duration;

use crate::analysis::ReportSummary;
use crate::config::SummarizerConfig;

/// Narrative recorded when no summary could be produced
pub const NO_SUMMARY: &str = "No summary available";

/// Narrative recorded when the service answered without generated text
pub const NO_OUTPUT: &str = "No output";

/// Summarization errors
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Summarizer is disabled in configuration")]
    Disabled,

    #[error("Failed to serialize report for summarization: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),
}

/// Turns a report into free text
pub trait Summarizer {
    fn summarize(&self, date: &str, summary: &ReportSummary) -> Result<String, SummarizeError>;
}

/// Prompt sent to the text-generation service
pub fn build_prompt(date: &str, summary: &ReportSummary) -> Result<String, SummarizeError> {
    let data = serde_json::to_string(summary)?;
    Ok(format!(
        "Summarize energy data for {} in plain English:\n{}",
        date, data
    ))
}

/// Extract the generated text from a text-generation response.
///
/// Responses are expected as `[{"generated_text": "..."}]`; anything else
/// yields [`NO_OUTPUT`].
pub fn extract_generated_text(response: &serde_json::Value) -> String {
    response
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("generated_text"))
        .and_then(|text| text.as_str())
        .map(String::from)
        .unwrap_or_else(|| NO_OUTPUT.to_string())
}

/// Summarizer backed by an HTTP text-generation endpoint
pub struct HttpSummarizer {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        if !config.enabled {
            return Err(SummarizeError::Disabled);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizeError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            client,
        })
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, date: &str, summary: &ReportSummary) -> Result<String, SummarizeError> {
        let prompt = build_prompt(date, summary)?;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "inputs": prompt }));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                SummarizeError::Timeout(self.timeout)
            } else {
                SummarizeError::Http(format!("Request failed: {}", e))
            }
        })?;

        if !response.status().is_success() {
            return Err(SummarizeError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                self.endpoint
            )));
        }

        let body: serde_json::Value = response
            .json()
            .map_err(|e| SummarizeError::Http(format!("Failed to parse response: {}", e)))?;

        Ok(extract_generated_text(&body))
    }
}

/// Run an optional summarizer, degrading to [`NO_SUMMARY`] on any failure.
pub fn summarize_or_sentinel(
    summarizer: Option<&dyn Summarizer>,
    date: &str,
    summary: &ReportSummary,
) -> String {
    let Some(summarizer) = summarizer else {
        return NO_SUMMARY.to_string();
    };

    match summarizer.summarize(date, summary) {
        Ok(text) => {
            log::info!("Received narrative summary ({} chars)", text.len());
            text
        }
        Err(e) => {
            log::warn!("Summarization failed, continuing without narrative: {}", e);
            NO_SUMMARY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ReportPeriod, TimeWindow};

    struct FixedSummarizer(&'static str);

    impl Summarizer for FixedSummarizer {
        fn summarize(&self, _date: &str, _summary: &ReportSummary) -> Result<String, SummarizeError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _date: &str, _summary: &ReportSummary) -> Result<String, SummarizeError> {
            Err(SummarizeError::Http("connection refused".to_string()))
        }
    }

    fn empty_summary() -> ReportSummary {
        ReportSummary {
            period: ReportPeriod {
                current: TimeWindow::new(0, 86_399).unwrap(),
                baseline: None,
            },
            system_totals: Vec::new(),
            group_totals: Vec::new(),
            comparisons: Vec::new(),
            spikes: Vec::new(),
        }
    }

    #[test]
    fn test_summary_passthrough() {
        let text = summarize_or_sentinel(Some(&FixedSummarizer("All quiet.") as &dyn Summarizer), "1970-01-01", &empty_summary());
        assert_eq!(text, "All quiet.");
    }

    #[test]
    fn test_failure_yields_sentinel() {
        let text = summarize_or_sentinel(Some(&FailingSummarizer as &dyn Summarizer), "1970-01-01", &empty_summary());
        assert_eq!(text, NO_SUMMARY);
    }

    #[test]
    fn test_absent_summarizer_yields_sentinel() {
        assert_eq!(summarize_or_sentinel(None, "1970-01-01", &empty_summary()), NO_SUMMARY);
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_prompt("2024-03-14", &empty_summary()).unwrap();
        assert!(prompt.starts_with("Summarize energy data for 2024-03-14 in plain English:\n"));
        assert!(prompt.contains("\"comparisons\":[]"));
    }

    #[test]
    fn test_extract_generated_text() {
        let ok = serde_json::json!([{ "generated_text": "Usage rose." }]);
        assert_eq!(extract_generated_text(&ok), "Usage rose.");

        let error = serde_json::json!({ "error": "Model is loading" });
        assert_eq!(extract_generated_text(&error), NO_OUTPUT);

        let empty = serde_json::json!([]);
        assert_eq!(extract_generated_text(&empty), NO_OUTPUT);
    }

    #[test]
    fn test_disabled_config_is_rejected() {
        let config = SummarizerConfig::default();
        assert!(matches!(HttpSummarizer::new(&config), Err(SummarizeError::Disabled)));
    }
}
