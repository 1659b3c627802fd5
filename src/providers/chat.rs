//! OpenAI-compatible chat/completions client.
//! Connection pooling via reqwest, simple request pacing, no retries: a
//! failed call is reported once and the caller falls back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationProvider, TranslationProvider};
use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::normalize::strip_code_fences;

/// Chat completions client used for both recipe generation and translation.
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Tracks the next allowed request time.
    next_allowed: Arc<tokio::sync::Mutex<Instant>>,
    /// Minimum interval between requests.
    min_interval: Duration,
}

const GENERATION_SYSTEM_PROMPT: &str =
    "You are a professional chef. Reply with a single JSON value that matches the given schema, nothing else.";
const TRANSLATION_SYSTEM_PROMPT: &str =
    "You are a culinary translator. Output only the translation, nothing else.";

impl ChatClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(45))
            .build()
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            next_allowed: Arc::new(tokio::sync::Mutex::new(Instant::now())),
            min_interval: Duration::from_millis(100), // 10 req/s
        })
    }

    /// Build from settings; fails with `MissingCredential` when no key is set.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let key = settings
            .llm_api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("RECIPE_LLM_API_KEY"))?;
        Self::new(key, &settings.llm_base_url, &settings.llm_model)
    }

    /// Wait until the pacing window allows a request.
    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        json_mode: bool,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        self.rate_limit_wait().await;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let start = Instant::now();
        let resp = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion rejected");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body_text.chars().take(200).collect(),
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("no choices in response".into()))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "chat completion received"
        );
        Ok(content)
    }
}

impl GenerationProvider for ChatClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        schema: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<serde_json::Value, ProviderError>> {
        async move {
            let user = format!("{prompt}\n\nJSON schema:\n{schema}");
            let reply = self.chat(GENERATION_SYSTEM_PROMPT, &user, true, 0.7).await?;
            Ok(serde_json::from_str(strip_code_fences(&reply))?)
        }
        .boxed()
    }
}

impl TranslationProvider for ChatClient {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        self.chat(TRANSLATION_SYSTEM_PROMPT, prompt, false, 0.1).boxed()
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}
