use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Failed to reach model service: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

/// A hosted or local language model answering one prompt at a time.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run a single completion. `system` is sent as a separate instruction
    /// turn when present.
    async fn generate(&self, system: Option<&str>, prompt: &str) -> LlmResult<String>;

    fn model_name(&self) -> &str;
}

/// Map a non-success response into the matching error.
async fn ensure_success(response: reqwest::Response) -> LlmResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(LlmError::RateLimited(body));
    }

    Err(LlmError::Service {
        status: status.as_u16(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Ollama
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    json_output: bool,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>, // "json" for structured output
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            json_output: false,
            client: reqwest::Client::new(),
        }
    }

    /// Ask the server to constrain output to valid JSON
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            format: self.json_output.then_some("json"),
            options: OllamaOptions { temperature: 0.0 },
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending Ollama request");

        let response = self.client.post(&url).json(&request).send().await?;
        let response = ensure_success(response).await?;

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(ollama_response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Groq (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: String,
}

impl GroqClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";

    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LanguageModel for GroqClient {
    async fn generate(&self, system: Option<&str>, prompt: &str) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
