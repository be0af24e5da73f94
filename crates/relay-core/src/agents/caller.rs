//! LLM Agent: invokes a hosted model via HTTP API (OpenAI-compatible / Anthropic).
//!
//! Each chain agent owns its own instruction and model identifier. The
//! agent's input text becomes the single user message; the instruction
//! becomes the system prompt.
//!
//! Failures are classified for the retry governor: connection problems,
//! HTTP 408/429 and 5xx responses are transient; everything else is fatal.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{AgentCapability, AgentError};

/// Wire protocol spoken by the model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmAdapter {
    /// `POST {base_url}/chat/completions`
    OpenAi,
    /// `POST {base_url}/v1/messages`
    Anthropic,
}

impl LlmAdapter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "opencode" => Some(Self::OpenAi),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }
}

/// An agent backed by a hosted model.
pub struct LlmAgent {
    name: String,
    adapter: LlmAdapter,
    base_url: String,
    api_key: String,
    model: String,
    instruction: String,
    temperature: Option<f64>,
    client: reqwest::Client,
}

impl LlmAgent {
    pub fn new(
        name: impl Into<String>,
        adapter: LlmAdapter,
        model: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            adapter,
            base_url: adapter.default_base_url().to_string(),
            api_key: String::new(),
            model: model.into(),
            instruction: instruction.into(),
            temperature: None,
            // No client-side timeout: the step timeout guard owns the bound.
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model name as sent to the provider: `openai/gpt-4o` → `gpt-4o`.
    fn wire_model(&self) -> &str {
        match self.model.split_once('/') {
            Some((_, model)) if !model.is_empty() => model,
            _ => &self.model,
        }
    }

    fn request(&self, input: &str) -> (String, serde_json::Value) {
        let base = self.base_url.trim_end_matches('/');
        match self.adapter {
            LlmAdapter::OpenAi => {
                let mut messages = vec![];
                if !self.instruction.is_empty() {
                    messages.push(serde_json::json!({
                        "role": "system",
                        "content": self.instruction
                    }));
                }
                messages.push(serde_json::json!({
                    "role": "user",
                    "content": input
                }));

                let mut body = serde_json::json!({
                    "model": self.wire_model(),
                    "messages": messages
                });
                if let Some(temp) = self.temperature {
                    body["temperature"] = serde_json::json!(temp);
                }
                (format!("{}/chat/completions", base), body)
            }
            LlmAdapter::Anthropic => {
                let mut body = serde_json::json!({
                    "model": self.wire_model(),
                    "max_tokens": 8192,
                    "messages": [
                        {
                            "role": "user",
                            "content": input
                        }
                    ]
                });
                if !self.instruction.is_empty() {
                    body["system"] = serde_json::Value::String(self.instruction.clone());
                }
                if let Some(temp) = self.temperature {
                    body["temperature"] = serde_json::json!(temp);
                }
                (format!("{}/v1/messages", base), body)
            }
        }
    }
}

#[async_trait]
impl AgentCapability for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &str) -> Result<String, AgentError> {
        let (url, body) = self.request(input);

        tracing::debug!(
            agent = %self.name,
            model = %self.model,
            url = %url,
            "Calling model API"
        );

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body);
        request = match self.adapter {
            LlmAdapter::OpenAi => request.bearer_auth(&self.api_key),
            LlmAdapter::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::transient(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            AgentError::transient(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(classify_status(status, &response_text));
        }

        let json: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| AgentError::fatal(format!("Failed to parse response JSON: {}", e)))?;

        let content = match self.adapter {
            LlmAdapter::OpenAi => extract_openai_content(&json),
            LlmAdapter::Anthropic => extract_anthropic_content(&json),
        };

        match content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AgentError::fatal(format!(
                "{} returned an empty response",
                self.name
            ))),
        }
    }
}

/// Map a non-success HTTP status to a classified failure.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> AgentError {
    let detail = format!("API returned {}: {}", status, body);
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        AgentError::transient(detail)
    } else {
        AgentError::fatal(detail)
    }
}

fn extract_openai_content(json: &serde_json::Value) -> Option<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
}

fn extract_anthropic_content(json: &serde_json::Value) -> Option<String> {
    json.get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| {
            arr.iter()
                .filter_map(|block| {
                    if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                        block.get("text").and_then(|t| t.as_str()).map(|s| s.to_string())
                    } else {
                        None
                    }
                })
                .reduce(|a, b| format!("{}\n{}", a, b))
        })
}
