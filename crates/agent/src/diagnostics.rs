//! Credential readiness checks for the analysis service.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};

use crate::llm::{ChatMessage, CompletionRequest, LlmClient, LlmError};
use crate::openai::OpenAiClient;

const KEY_PREFIX: &str = "sk-";
const MIN_KEY_LEN: usize = 20;
const COMPLETION_PROBE_MAX_TOKENS: u32 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialStatus {
    Missing,
    InvalidFormat,
    WellFormed,
}

impl CredentialStatus {
    pub fn detail(&self) -> &'static str {
        match self {
            Self::Missing => "no analysis credential configured; reports use the fallback generator",
            Self::InvalidFormat => "credential should start with `sk-` and be longer than 20 characters",
            Self::WellFormed => "credential is present and well formed",
        }
    }
}

/// Offline shape check. Says nothing about whether the service accepts it.
pub fn check_credential(api_key: Option<&SecretString>) -> CredentialStatus {
    let Some(key) = api_key else {
        return CredentialStatus::Missing;
    };

    let key = key.expose_secret().trim();
    if key.is_empty() {
        CredentialStatus::Missing
    } else if key.starts_with(KEY_PREFIX) && key.chars().count() > MIN_KEY_LEN {
        CredentialStatus::WellFormed
    } else {
        CredentialStatus::InvalidFormat
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    pub models: Vec<String>,
    pub elapsed: Duration,
}

impl ProbeReport {
    pub fn lists_model(&self, model: &str) -> bool {
        self.models.iter().any(|candidate| candidate == model)
    }
}

/// Live round trip against the model listing endpoint.
pub async fn probe(client: &OpenAiClient) -> Result<ProbeReport, LlmError> {
    let started = Instant::now();
    let models = client.list_models().await?;
    Ok(ProbeReport { models, elapsed: started.elapsed() })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionProbe {
    pub reply: String,
    pub elapsed: Duration,
}

/// A minimal chat completion, proving the credential can do more than list
/// models.
pub async fn probe_completion<C>(client: &C) -> Result<CompletionProbe, LlmError>
where
    C: LlmClient + ?Sized,
{
    let request = CompletionRequest::new(vec![
        ChatMessage::system("你是一個測試助手。"),
        ChatMessage::user("請回應 'API 測試成功'"),
    ])
    .with_max_tokens(COMPLETION_PROBE_MAX_TOKENS);

    let started = Instant::now();
    let reply = client.complete(&request).await?;
    Ok(CompletionProbe { reply: reply.trim().to_string(), elapsed: started.elapsed() })
}

/// Operator-facing wording for a failed probe.
pub fn describe_probe_failure(error: &LlmError) -> String {
    match error {
        LlmError::Authentication { status } => {
            format!("credential was rejected (status {status})")
        }
        LlmError::RateLimited => "rate limit reached while probing".to_string(),
        LlmError::Network(_) | LlmError::Timeout => {
            format!("could not reach the analysis service: {error}")
        }
        other => format!("probe failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use async_trait::async_trait;

    use super::{
        check_credential, describe_probe_failure, probe_completion, CredentialStatus, ProbeReport,
    };
    use crate::llm::{ChatRole, CompletionRequest, LlmClient, LlmError};

    struct EchoClient;

    #[async_trait]
    impl LlmClient for EchoClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
            assert_eq!(request.max_tokens, Some(20));
            assert!(!request.json_object);
            assert_eq!(request.messages[0].role, ChatRole::System);
            Ok("  API 測試成功\n".to_string())
        }
    }

    struct RejectingClient;

    #[async_trait]
    impl LlmClient for RejectingClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            Err(LlmError::Authentication { status: 401 })
        }
    }

    fn secret(value: &str) -> SecretString {
        value.to_string().into()
    }

    #[test]
    fn credential_shape_checks() {
        assert_eq!(check_credential(None), CredentialStatus::Missing);
        assert_eq!(check_credential(Some(&secret("   "))), CredentialStatus::Missing);
        assert_eq!(check_credential(Some(&secret("sk-short"))), CredentialStatus::InvalidFormat);
        assert_eq!(
            check_credential(Some(&secret("pk-0123456789012345678901"))),
            CredentialStatus::InvalidFormat
        );
        assert_eq!(
            check_credential(Some(&secret("sk-0123456789012345678901"))),
            CredentialStatus::WellFormed
        );
    }

    #[test]
    fn exactly_twenty_characters_is_too_short() {
        let key = "sk-01234567890123456";
        assert_eq!(key.len(), 20);
        assert_eq!(check_credential(Some(&secret(key))), CredentialStatus::InvalidFormat);
    }

    #[test]
    fn probe_report_finds_configured_model() {
        let report = ProbeReport {
            models: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
            elapsed: Duration::from_millis(12),
        };
        assert!(report.lists_model("gpt-4o-mini"));
        assert!(!report.lists_model("gpt-3.5-turbo"));
    }

    #[test]
    fn probe_failures_are_classified() {
        assert!(describe_probe_failure(&LlmError::Authentication { status: 401 })
            .contains("rejected"));
        assert!(describe_probe_failure(&LlmError::RateLimited).contains("rate limit"));
        assert!(describe_probe_failure(&LlmError::Timeout).contains("could not reach"));
    }

    #[tokio::test]
    async fn completion_round_trip_returns_trimmed_reply() {
        let probe = probe_completion(&EchoClient).await.expect("completion should succeed");
        assert_eq!(probe.reply, "API 測試成功");
    }

    #[tokio::test]
    async fn completion_round_trip_surfaces_client_errors() {
        let error = probe_completion(&RejectingClient).await.expect_err("credential rejected");
        assert!(describe_probe_failure(&error).contains("rejected"));
    }
}
