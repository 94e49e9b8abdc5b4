//! The model collaborator: one `invoke` call, a prompt in, text out.
//!
//! Everything the assistant asks of an LLM goes through [`ModelClient`]. The
//! workflows never see a provider type directly, which keeps them testable
//! with a scripted client and keeps provider quirks in one place:
//! [`LlmClient`] adapts an `edgequake_llm` provider and is the only code that
//! has to recognise a throttling response. It reports it as
//! [`ModelErrorKind::RateLimited`] so every caller matches on a kind rather
//! than on error text.
//!
//! There are no retries at this layer or above. A failed call is reported
//! once and the user decides whether to try again.

use crate::config::{AssistantConfig, DEFAULT_MODEL};
use crate::error::PostcraftError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

// ── Request / reply types ────────────────────────────────────────────────

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged turn of a conversation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// What is sent to the model: a bare instruction or an ordered conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelRequest {
    Prompt(String),
    Messages(Vec<Message>),
}

impl ModelRequest {
    /// The request as a message sequence. A bare prompt is a single user turn.
    pub fn to_messages(&self) -> Vec<Message> {
        match self {
            ModelRequest::Prompt(p) => vec![Message::user(p.clone())],
            ModelRequest::Messages(m) => m.clone(),
        }
    }

    /// Total characters across all turns, for logging.
    pub fn char_len(&self) -> usize {
        match self {
            ModelRequest::Prompt(p) => p.len(),
            ModelRequest::Messages(m) => m.iter().map(|m| m.content.len()).sum(),
        }
    }
}

/// The model's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl ModelReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

// ── Errors ───────────────────────────────────────────────────────────────

/// Coarse classification of a failed model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelErrorKind {
    /// HTTP 429 or a provider quota message.
    RateLimited,
    /// The call exceeded `api_timeout_secs`.
    Timeout,
    /// 401/403: retrying will not help.
    Auth,
    Other,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelErrorKind::RateLimited => "rate limited",
            ModelErrorKind::Timeout => "timed out",
            ModelErrorKind::Auth => "authentication failed",
            ModelErrorKind::Other => "request failed",
        };
        f.write_str(s)
    }
}

/// A failed model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model {kind}: {detail}")]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub detail: String,
}

impl ModelError {
    pub fn new(kind: ModelErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ModelErrorKind::RateLimited
    }
}

/// Classify a failed provider call.
///
/// Structured `LlmError` variants decide the kind. Only the catch-all
/// variants, which carry a provider's raw error body, fall back to
/// [`classify_error_text`].
pub fn classify_llm_error(err: &LlmError) -> ModelErrorKind {
    match err {
        LlmError::RateLimited(_) => ModelErrorKind::RateLimited,
        LlmError::AuthError(_) => ModelErrorKind::Auth,
        LlmError::Timeout => ModelErrorKind::Timeout,
        LlmError::ApiError(text)
        | LlmError::ProviderError(text)
        | LlmError::NetworkError(text)
        | LlmError::Unknown(text) => classify_error_text(text),
        _ => ModelErrorKind::Other,
    }
}

static RE_RATE_LIMIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b429\b|rate.?limit|too many requests|resource_exhausted|quota exceeded").unwrap()
});
static RE_AUTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b40[13]\b|unauthorized|forbidden|invalid api key|incorrect api key").unwrap()
});
static RE_TIMEOUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)timed out|\btimeout\b").unwrap());

/// Classify an unstructured provider error body.
///
/// Status codes only count as whole numbers, so "4290" is not a 429.
pub fn classify_error_text(text: &str) -> ModelErrorKind {
    if RE_RATE_LIMIT.is_match(text) {
        ModelErrorKind::RateLimited
    } else if RE_AUTH.is_match(text) {
        ModelErrorKind::Auth
    } else if RE_TIMEOUT.is_match(text) {
        ModelErrorKind::Timeout
    } else {
        ModelErrorKind::Other
    }
}

// ── Collaborator trait ───────────────────────────────────────────────────

/// A hosted text-generation endpoint.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError>;
}

/// [`ModelClient`] backed by an `edgequake_llm` provider.
pub struct LlmClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    api_timeout: Duration,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AssistantConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            api_timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

impl fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout", &self.api_timeout)
            .finish()
    }
}

#[async_trait]
impl ModelClient for LlmClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        let start = Instant::now();
        let messages: Vec<ChatMessage> = request
            .to_messages()
            .into_iter()
            .map(|m| match m.role {
                Role::System => ChatMessage::system(m.content),
                Role::User => ChatMessage::user(m.content),
            })
            .collect();
        let options = self.build_options();

        let call = self.provider.chat(&messages, Some(&options));
        match timeout(self.api_timeout, call).await {
            Ok(Ok(response)) => {
                debug!(
                    "Model call: {} chars in, {} input tokens, {} output tokens, {:?}",
                    request.char_len(),
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(ModelReply {
                    content: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                })
            }
            Ok(Err(e)) => {
                let kind = classify_llm_error(&e);
                let detail = e.to_string();
                warn!("Model call failed ({}) — {}", kind, detail);
                Err(ModelError::new(kind, detail))
            }
            Err(_) => {
                warn!("Model call timed out after {:?}", self.api_timeout);
                Err(ModelError::new(
                    ModelErrorKind::Timeout,
                    format!("no reply within {}s", self.api_timeout.as_secs()),
                ))
            }
        }
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Build the client the workflows should use for this configuration.
///
/// A pre-built client on the config wins; otherwise a provider is resolved
/// (see [`resolve_provider`]) and wrapped in an [`LlmClient`].
pub fn resolve_client(config: &AssistantConfig) -> Result<Arc<dyn ModelClient>, PostcraftError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }
    let provider = resolve_provider(config)?;
    Ok(Arc::new(LlmClient::new(provider, config)))
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, PostcraftError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PostcraftError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. `config.provider` — used as-is.
/// 2. `config.provider_name` (+ `config.model`).
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. `OPENAI_API_KEY` present → OpenAI.
/// 5. `ProviderFactory::from_env()` auto-detection.
pub fn resolve_provider(config: &AssistantConfig) -> Result<Arc<dyn LLMProvider>, PostcraftError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PostcraftError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
