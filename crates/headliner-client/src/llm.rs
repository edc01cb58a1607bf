use std::time::Duration;

use headliner_core::error::BackendError;
use headliner_core::models::TitleOutput;
use headliner_core::traits::TitleBackend;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional blog headline writer. Write titles that are SEO optimized and attention-grabbing, and that make people want to click and read the post.";

/// OpenAI-compatible chat-completions client that writes headlines.
///
/// Works with any OpenAI-compatible API, including:
/// - OpenAI directly (`https://api.openai.com/v1`)
/// - Groq (`https://api.groq.com/openai/v1`)
/// - A local inference server exposing the same endpoint
///
/// The model answers with a numbered list, returned as
/// [`TitleOutput::Raw`] for the caller to split.
#[derive(Clone)]
pub struct OpenAiTitleBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
    system_prompt: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for OpenAiTitleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiTitleBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl OpenAiTitleBackend {
    pub fn new(api_key: &str, model: &str) -> Result<Self, BackendError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, BackendError> {
        Self::build(api_key, model, base_url, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, BackendError> {
        let mut rebuilt = Self::build(&self.api_key, &self.model, &self.base_url, timeout)?;
        rebuilt.system_prompt = self.system_prompt;
        rebuilt.temperature = self.temperature;
        Ok(rebuilt)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn build(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        if api_key.trim().is_empty() {
            return Err(BackendError::Init("API key is empty".into()));
        }
        if model.trim().is_empty() {
            return Err(BackendError::Init("model name is empty".into()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(BackendError::Init(format!(
                "base URL must be http(s), got '{base_url}'"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Init(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: timeout.as_secs(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: None,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn user_prompt(text: &str, max_candidates: usize) -> String {
    format!(
        "Generate at most {max_candidates} titles as a numbered list, one title per line, with no other commentary.\n---\nThe blog post is about the following content:\n{text}\n---"
    )
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl TitleBackend for OpenAiTitleBackend {
    async fn generate(
        &self,
        text: &str,
        max_candidates: usize,
    ) -> Result<TitleOutput, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt(text, max_candidates),
                },
            ],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, %url, "Requesting title candidates");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    BackendError::Network(format!("Connection failed: {e}"))
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            if status_code == 429 {
                return Err(BackendError::RateLimited);
            }

            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            return Err(BackendError::Api {
                message,
                status_code,
                retryable: status_code >= 500,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to read LLM response: {e}")))?;
        let chat_response: ChatResponse = serde_json::from_str(&body)?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .map(TitleOutput::Raw)
            .ok_or(BackendError::EmptyResponse)
    }
}
