use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// One chat-completions call. Model and sampling settings belong to the
/// client, not the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub json_object: bool,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, json_object: false, max_tokens: None }
    }

    pub fn expect_json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Every way the external analysis call can fail. Only ever logged.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http client could not be built: {0}")]
    Client(String),
    #[error("credential rejected by analysis service (status {status})")]
    Authentication { status: u16 },
    #[error("analysis service rate limit reached")]
    RateLimited,
    #[error("network failure: {0}")]
    Network(String),
    #[error("analysis service did not answer in time")]
    Timeout,
    #[error("analysis service returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("analysis response could not be read: {0}")]
    MalformedResponse(String),
    #[error("analysis response does not match the report contract: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),
}

impl LlmError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Client(_) => "client_init_failed",
            Self::Authentication { .. } => "authentication_failed",
            Self::RateLimited => "rate_limited",
            Self::Network(_) => "network_failure",
            Self::Timeout => "timeout",
            Self::Provider { .. } => "provider_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::SchemaViolation(_) => "schema_violation",
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Returns the raw assistant message content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
