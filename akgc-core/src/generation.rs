//! Generation collaborator: produces the candidate response for a prompt.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// Text generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a continuation of `prompt`, bounded by `max_tokens`.
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError>;

    /// Model identifier, for logs and reports.
    fn model_name(&self) -> &str;
}

/// Ollama `/api/generate` backend (non-streaming).
pub struct OllamaGenerator {
    client: reqwest::Client,
    model: String,
    base_url: String,
    timeout: Duration,
    use_gpu: bool,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            use_gpu: config.use_gpu,
        }
    }

    fn request_body(&self, prompt: &str, max_tokens: usize) -> Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": max_tokens },
        });
        if !self.use_gpu {
            body["options"]["num_gpu"] = json!(0);
        }
        body
    }

    fn parse_response(json: &Value) -> Result<String, GenerationError> {
        json["response"]
            .as_str()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| GenerationError::InvalidResponse {
                message: "missing 'response' field".into(),
            })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.request_body(prompt, max_tokens);

        debug!(url = %url, model = %self.model, max_tokens, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.timeout.as_secs(),
                    }
                } else {
                    GenerationError::Unavailable {
                        message: format!("Request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| GenerationError::InvalidResponse {
                message: format!("Failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(GenerationError::Unavailable {
                message: format!("HTTP {status}: {response_body}"),
            });
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| GenerationError::InvalidResponse {
                message: format!("Invalid JSON: {e}"),
            })?;

        Self::parse_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Returns the prompt unchanged; useful offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str, _max_tokens: usize) -> Result<String, GenerationError> {
        Ok(prompt.to_string())
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Build the configured generator.
pub fn create_generator(config: &GenerationConfig) -> Arc<dyn Generator> {
    match config.provider.as_str() {
        "echo" => Arc::new(EchoGenerator),
        "ollama" => Arc::new(OllamaGenerator::new(config)),
        other => {
            tracing::warn!(provider = other, "Unknown generation provider, using ollama");
            Arc::new(OllamaGenerator::new(config))
        }
    }
}
