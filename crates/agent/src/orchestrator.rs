use std::sync::Arc;

use brandlens_core::domain::brand::BrandInfo;
use brandlens_core::report::fallback::fallback;
use brandlens_core::report::{AnalysisFragment, AnalysisScope, AudienceProfile};
use tracing::{debug, info, warn};

use crate::llm::{LlmClient, LlmError};
use crate::prompt::build_request;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrchestratorState {
    Unconfigured,
    Requesting,
    Succeeded,
    FallenBack,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Requesting => "requesting",
            Self::Succeeded => "succeeded",
            Self::FallenBack => "fallen_back",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    Model,
    FallbackOnly,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::FallbackOnly => "fallback_only",
        }
    }
}

/// Result of one orchestration. `failure_reason` is for logs and
/// diagnostics only; the fragment is always complete.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisOutcome {
    pub fragment: AnalysisFragment,
    pub state: OrchestratorState,
    pub failure_reason: Option<&'static str>,
}

/// Drives the external analysis call: one attempt, then fallback.
#[derive(Clone, Default)]
pub struct AnalysisOrchestrator {
    client: Option<Arc<dyn LlmClient>>,
}

impl AnalysisOrchestrator {
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        Self { client }
    }

    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self { client: Some(client) }
    }

    pub fn fallback_only() -> Self {
        Self { client: None }
    }

    pub fn mode(&self) -> AnalysisMode {
        if self.client.is_some() {
            AnalysisMode::Model
        } else {
            AnalysisMode::FallbackOnly
        }
    }

    pub async fn analyze(
        &self,
        brand: &BrandInfo,
        profile: &AudienceProfile,
        correlation_id: &str,
    ) -> AnalysisOutcome {
        let Some(client) = &self.client else {
            debug!(
                event_name = "analysis.state",
                correlation_id = %correlation_id,
                state = OrchestratorState::Unconfigured.as_str(),
                "no analysis credential configured, using fallback"
            );
            return AnalysisOutcome {
                fragment: fallback(brand, profile),
                state: OrchestratorState::Unconfigured,
                failure_reason: None,
            };
        };

        info!(
            event_name = "analysis.state",
            correlation_id = %correlation_id,
            state = OrchestratorState::Requesting.as_str(),
            "requesting structured analysis"
        );

        let scope = profile.scope();
        let result = match client.complete(&build_request(brand, profile)).await {
            Ok(raw) => parse_fragment(&raw, scope),
            Err(error) => Err(error),
        };

        match result {
            Ok(fragment) => {
                info!(
                    event_name = "analysis.state",
                    correlation_id = %correlation_id,
                    state = OrchestratorState::Succeeded.as_str(),
                    "structured analysis accepted"
                );
                AnalysisOutcome {
                    fragment,
                    state: OrchestratorState::Succeeded,
                    failure_reason: None,
                }
            }
            Err(error) => {
                warn!(
                    event_name = "analysis.fallback",
                    correlation_id = %correlation_id,
                    state = OrchestratorState::FallenBack.as_str(),
                    reason_code = error.reason_code(),
                    error = %error,
                    "analysis service failed, using fallback"
                );
                AnalysisOutcome {
                    fragment: fallback(brand, profile),
                    state: OrchestratorState::FallenBack,
                    failure_reason: Some(error.reason_code()),
                }
            }
        }
    }
}

/// Strict parse of the service output; no text salvage.
pub fn parse_fragment(raw: &str, scope: AnalysisScope) -> Result<AnalysisFragment, LlmError> {
    let fragment: AnalysisFragment = serde_json::from_str(raw)
        .map_err(|error| LlmError::MalformedResponse(error.to_string()))?;

    let violations = fragment.violations(scope);
    if violations.is_empty() {
        Ok(fragment)
    } else {
        Err(LlmError::SchemaViolation(violations))
    }
}
