//! Anthropic Messages API client.
//!
//! Structured output works by forcing a `structured_response` tool call
//! whose input schema is the caller's expected shape; the tool input block
//! in the reply is the payload. Transport failures and retryable API
//! statuses are retried a bounded number of times with a short backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ModelError;
use crate::traits::{ModelClient, ModelRequest};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const STRUCTURED_TOOL_NAME: &str = "structured_response";

const DEFAULT_MAX_RETRIES: u32 = 2;
const RETRY_BASE_DELAY_MS: u64 = 250;

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ModelError::Config("ANTHROPIC_API_KEY environment variable not set".into())
        })?;
        Ok(Self::new(api_key, model))
    }

    /// Point the client at a different endpoint (tests, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bound on transport-level retries. Zero disables retrying.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, ModelError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| ModelError::Config("API key is not a valid header value".into()))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send_once(&self, body: &MessagesRequest) -> Result<MessagesResponse, ModelError> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ModelClient for Claude {
    async fn invoke(&self, request: ModelRequest) -> Result<Value, ModelError> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            // Structured extraction must be deterministic.
            temperature: 0.0,
            system: request.system,
            messages: vec![WireMessage::user(request.user)],
            tools: vec![ToolDefinitionWire {
                name: STRUCTURED_TOOL_NAME.to_string(),
                description: "Record the structured result of the analysis.".to_string(),
                input_schema: request.schema,
            }],
            tool_choice: serde_json::json!({
                "type": "tool",
                "name": STRUCTURED_TOOL_NAME,
            }),
        };

        debug!(model = %self.model, "model request");

        let mut attempt = 0;
        let response = loop {
            match self.send_once(&body).await {
                Ok(response) => break response,
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS << attempt);
                    warn!(attempt, error = %e, "retrying model request");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(usage) = &response.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "model response"
            );
        }

        for block in response.content {
            if let ContentBlock::ToolUse { input, .. } = block {
                return Ok(input);
            }
        }

        Err(ModelError::MissingOutput)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
struct WireMessage {
    role: Role,
    content: String,
}

impl WireMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ToolDefinitionWire {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<WireMessage>,
    tools: Vec<ToolDefinitionWire>,
    tool_choice: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        #[allow(dead_code)]
        text: String,
    },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[allow(dead_code)]
        id: String,
        #[allow(dead_code)]
        name: String,
        input: Value,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_defaults() {
        let client = Claude::new("sk-ant-test", "claude-haiku-4-5");
        assert_eq!(client.model(), "claude-haiku-4-5");
        assert_eq!(client.base_url, ANTHROPIC_API_URL);
        assert_eq!(client.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn base_url_override() {
        let client =
            Claude::new("sk-ant-test", "claude-haiku-4-5").with_base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn tool_use_block_deserializes() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "thinking..."},
                {"type": "tool_use", "id": "t1", "name": "structured_response",
                 "input": {"problem": "x"}}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content.len(), 2);
        assert!(matches!(
            &response.content[1],
            ContentBlock::ToolUse { input, .. } if input["problem"] == "x"
        ));
    }
}
