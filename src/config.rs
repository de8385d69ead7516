use crate::models::{EndpointStyle, ModelCandidate};
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

static TEXT_CANDIDATES: Lazy<Vec<ModelCandidate>> = Lazy::new(|| {
    vec![
        ModelCandidate::new("gemini-2.5-flash", 0),
        ModelCandidate::new("gemini-1.5-flash", 1),
        ModelCandidate::new("gemini-1.5-pro", 2),
        ModelCandidate::new("gemini-pro", 3).legacy(),
    ]
});

static IMAGE_CANDIDATES: Lazy<Vec<ModelCandidate>> = Lazy::new(|| {
    vec![
        ModelCandidate::new("gemini-2.5-flash-image", 0),
        ModelCandidate::new("imagen-3.0-generate-002", 1).with_endpoint(EndpointStyle::Predict),
    ]
});

/// Text models tried for the prompt stage, in priority order.
pub fn default_text_candidates() -> &'static [ModelCandidate] {
    &TEXT_CANDIDATES
}

/// Image models tried for the optional render stage.
pub fn default_image_candidates() -> &'static [ModelCandidate] {
    &IMAGE_CANDIDATES
}

#[derive(Debug, Clone)]
pub struct AdaptConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub request_timeout: Duration,
    pub retry_delay: Duration,
    pub temperature: Option<f32>,
    pub output_dir: PathBuf,
}

impl Default for AdaptConfig {
    fn default() -> Self {
        AdaptConfig {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            temperature: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl AdaptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"));
        let api_base = non_empty_env("VISUALADAPT_API_BASE")
            .map(|base| normalize_base(&base))
            .unwrap_or(defaults.api_base);
        let request_timeout = non_empty_env("VISUALADAPT_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let retry_delay = non_empty_env("VISUALADAPT_RETRY_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);
        let temperature = non_empty_env("VISUALADAPT_TEMPERATURE").and_then(|s| s.parse().ok());
        let output_dir = non_empty_env("VISUALADAPT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        AdaptConfig {
            api_key,
            api_base,
            request_timeout,
            retry_delay,
            temperature,
            output_dir,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = normalize_base(&api_base.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

fn normalize_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_candidates() {
        let text = default_text_candidates();
        assert_eq!(text[0].identifier, "gemini-2.5-flash");
        assert!(text.iter().any(|c| !c.supports_system_instruction));

        let image = default_image_candidates();
        assert!(image.iter().any(|c| c.endpoint == EndpointStyle::Predict));
        assert!(image.iter().any(|c| c.endpoint == EndpointStyle::GenerateContent));
    }

    #[test]
    fn test_builder() {
        let config = AdaptConfig::new()
            .with_api_key("k")
            .with_api_base("http://localhost:9000/v1beta/")
            .with_retry_delay(Duration::ZERO)
            .with_temperature(0.4);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(config.retry_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.temperature, Some(0.4));
    }

    #[test]
    fn test_env_base_drops_trailing_slashes() {
        std::env::set_var("VISUALADAPT_API_BASE", "http://localhost:9000/v1beta//");
        let config = AdaptConfig::from_env();
        std::env::remove_var("VISUALADAPT_API_BASE");
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
        assert_eq!(normalize_base(DEFAULT_API_BASE), DEFAULT_API_BASE);
    }
}
