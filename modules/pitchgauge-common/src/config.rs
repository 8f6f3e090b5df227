use std::env;

use tracing::info;

const DEFAULT_MODEL: &str = "claude-haiku-4-5";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Inference
    pub anthropic_api_key: String,
    pub model: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    /// How many evaluations the HTTP shell admits at once. The 4-wide
    /// fan-out inside each evaluation is fixed and not configurable.
    pub max_concurrent_evaluations: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: required_env("ANTHROPIC_API_KEY"),
            model: env::var("EVAL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            max_concurrent_evaluations: env::var("MAX_CONCURRENT_EVALUATIONS")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .expect("MAX_CONCURRENT_EVALUATIONS must be a number"),
        }
    }

    /// Log the effective configuration without leaking credentials.
    pub fn log_redacted(&self) {
        info!(
            model = %self.model,
            web_host = %self.web_host,
            web_port = self.web_port,
            max_concurrent_evaluations = self.max_concurrent_evaluations,
            api_key_set = !self.anthropic_api_key.is_empty(),
            "configuration loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
