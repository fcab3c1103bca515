//! Configuration types, built from environment variables.

use secrecy::SecretString;

/// Analysis tunables.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Maximum messages the generative analyzer scores in detail.
    pub sampling_budget: usize,
    /// Model name for the generative analyzer.
    pub model: String,
    /// Output-token budget for the generation call.
    pub max_tokens: u32,
    /// Sampling temperature (kept low for consistency).
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sampling_budget: 50,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 2048,
            temperature: 0.2,
        }
    }
}

impl AnalysisConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sampling_budget = std::env::var("INSIGHT_SAMPLING_BUDGET")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.sampling_budget);

        let model = std::env::var("INSIGHT_MODEL").unwrap_or(defaults.model);

        let max_tokens = std::env::var("INSIGHT_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let temperature = std::env::var("INSIGHT_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.temperature);

        Self {
            sampling_budget,
            model,
            max_tokens,
            temperature,
        }
    }
}

/// Mail provider connection settings.
///
/// The access token comes from the out-of-process auth layer; this crate
/// never refreshes or stores credentials.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub access_token: SecretString,
    /// Override for tests; `None` uses the public Gmail endpoint.
    pub base_url: Option<String>,
    /// Listing cap per analysis request.
    pub max_results: u32,
}

impl MailConfig {
    /// Build config from environment variables.
    /// Returns `None` if `INSIGHT_MAIL_TOKEN` is not set.
    pub fn from_env() -> Option<Self> {
        let token = std::env::var("INSIGHT_MAIL_TOKEN").ok()?;

        let max_results = std::env::var("INSIGHT_MAIL_MAX_RESULTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Some(Self {
            access_token: SecretString::from(token),
            base_url: std::env::var("INSIGHT_MAIL_BASE_URL").ok(),
            max_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.sampling_budget, 50);
        assert!(config.temperature < 0.5);
    }
}
