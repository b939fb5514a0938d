//! Analysis Agent - external analysis calls with a deterministic fallback
//!
//! This crate drives the one outbound call brandlens makes:
//! - Builds the structured analysis prompt from locally derived summaries
//! - Sends it to an OpenAI-compatible chat-completions endpoint
//! - Validates the structured response against the report contract
//! - Substitutes the rule-based fallback on any failure
//!
//! # Architecture
//!
//! 1. **Ingest** (`brandlens_core`) - uploads become an `AudienceProfile`
//! 2. **Prompt** (`prompt`) - profile + brand become a `CompletionRequest`
//! 3. **Orchestration** (`orchestrator`) - single attempt, then fallback
//! 4. **Assembly** (`runtime`) - fragment + profile become the final report
//!
//! # Key Types
//!
//! - `AudiencePipeline` - end-to-end entry point (see `runtime` module)
//! - `LlmClient` - pluggable completion trait; `OpenAiClient` is the HTTP one
//! - `AnalysisOrchestrator` - the `Unconfigured/Requesting/Succeeded/FallenBack` machine
//!
//! # Failure Principle
//!
//! Service failures never reach the caller. Only input errors do; everything
//! else degrades to a complete fallback report.

pub mod diagnostics;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod runtime;

pub use llm::{ChatMessage, ChatRole, CompletionRequest, LlmClient, LlmError};
pub use openai::OpenAiClient;
pub use orchestrator::{AnalysisMode, AnalysisOrchestrator, AnalysisOutcome, OrchestratorState};
pub use runtime::AudiencePipeline;
