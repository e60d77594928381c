//! LLM client for API communication

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response from LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Number of tokens used
    pub tokens_used: Option<usize>,
}

/// Completion backend used by LLM-assisted card generation
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for a prompt
    async fn complete(&self, prompt: &str) -> Result<LlmResponse>;

    /// Model identifier, for diagnostics
    fn model(&self) -> &str;
}

/// Configuration for LLM client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Maximum tokens for response
    pub max_tokens: usize,
    /// Temperature for generation
    pub temperature: f32,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            max_tokens: 2048,
            temperature: 0.3,
            timeout: Duration::from_secs(120),
        }
    }
}

/// HTTP client for Ollama and OpenAI-compatible endpoints
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
    retries: usize,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(mut config: LlmConfig) -> Result<Self> {
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            retries: 1,
        })
    }

    /// Ollama listens on 11434; everything else is treated as OpenAI-compatible
    fn is_ollama(&self) -> bool {
        self.config.endpoint.contains(":11434")
    }

    /// Generate a completion
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        if self.is_ollama() {
            let request = OllamaGenerateRequest {
                model: &self.config.model,
                prompt,
                stream: false,
                options: OllamaOptions {
                    temperature: self.config.temperature,
                    num_predict: self.config.max_tokens,
                },
            };
            let result: OllamaGenerateResponse =
                self.post_json("api/generate", &request, "Ollama").await?;

            Ok(LlmResponse {
                content: result.response,
                tokens_used: result.eval_count,
            })
        } else {
            let request = ChatRequest {
                model: &self.config.model,
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                }],
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            };
            let result: ChatResponse = self
                .post_json("v1/chat/completions", &request, "OpenAI-compatible API")
                .await?;

            let content = result
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .ok_or_else(|| anyhow::anyhow!("OpenAI-compatible API returned no choices"))?;

            Ok(LlmResponse {
                content,
                tokens_used: result.usage.map(|u| u.total_tokens),
            })
        }
    }

    /// POST a JSON body to `route` and decode the JSON reply
    async fn post_json<B, R>(&self, route: &str, body: &B, backend: &str) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.endpoint, route);
        let mut request = self.client.post(&url).json(body);

        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", backend))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} request failed: {} - {}", backend, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", backend))
    }

    /// Generate completion with retry
    pub async fn complete_with_retry(
        &self,
        prompt: &str,
        max_retries: usize,
    ) -> Result<LlmResponse> {
        let attempts = max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match self.complete(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("LLM request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(e);

                    if attempt + 1 < attempts {
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }

    /// Configured retry budget, used by [`CompletionProvider::complete`]
    pub fn with_retries(mut self, max_retries: usize) -> Self {
        self.retries = max_retries;
        self
    }
}

#[async_trait::async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        self.complete_with_retry(prompt, self.retries).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    eval_count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: usize,
}

/// Mock LLM client for testing
pub struct MockLlmClient {
    responses: Vec<(String, String)>,
    failure: Option<String>,
}

impl MockLlmClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            failure: None,
        }
    }

    /// A mock whose every completion fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Vec::new(),
            failure: Some(message.to_string()),
        }
    }

    /// Add a mock response, matched by substring of the prompt
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_string(), response.to_string()));
    }
}

#[async_trait::async_trait]
impl CompletionProvider for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        if let Some(ref message) = self.failure {
            anyhow::bail!("{}", message);
        }

        for (key, response) in &self.responses {
            if prompt.contains(key.as_str()) {
                return Ok(LlmResponse {
                    content: response.clone(),
                    tokens_used: Some(100),
                });
            }
        }

        // Default response
        Ok(LlmResponse {
            content: "[]".to_string(),
            tokens_used: Some(1),
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}
