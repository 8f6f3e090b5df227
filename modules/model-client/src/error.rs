use thiserror::Error;

/// Failures at the inference boundary.
///
/// `Transport` and retryable `Api` statuses may be retried a bounded number
/// of times inside the client; `Shape` and `MissingOutput` are logical
/// failures and always propagate to the caller unchanged.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no structured output in model response")]
    MissingOutput,

    #[error("malformed model output: {0}")]
    Shape(String),

    #[error("client configuration error: {0}")]
    Config(String),
}

impl ModelError {
    /// Whether one more attempt below the adapter boundary could help.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Transport(_) => true,
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelError::MissingOutput | ModelError::Shape(_) | ModelError::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        assert!(ModelError::Api {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(ModelError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_retryable());
    }

    #[test]
    fn logical_failures_are_not_retryable() {
        assert!(!ModelError::Shape("score out of range".into()).is_retryable());
        assert!(!ModelError::MissingOutput.is_retryable());
        assert!(!ModelError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
    }
}
