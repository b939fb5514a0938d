use std::sync::Arc;

use brandlens_core::config::AppConfig;
use brandlens_core::dataset::loader::TabularLoader;
use brandlens_core::dataset::source::DatasetSource;
use brandlens_core::domain::request::AnalysisRequest;
use brandlens_core::errors::ApplicationError;
use brandlens_core::report::assemble::assemble;
use brandlens_core::report::AnalysisReport;
use tracing::{error, info};

use crate::llm::{LlmClient, LlmError};
use crate::openai::OpenAiClient;
use crate::orchestrator::{AnalysisMode, AnalysisOrchestrator};

/// Ingest, analyze, assemble. Analysis failures never escape; input errors
/// and a lost ingest task do.
#[derive(Clone, Default)]
pub struct AudiencePipeline {
    loader: TabularLoader,
    orchestrator: AnalysisOrchestrator,
}

impl AudiencePipeline {
    pub fn new(loader: TabularLoader, orchestrator: AnalysisOrchestrator) -> Self {
        Self { loader, orchestrator }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let client = OpenAiClient::from_config(&config.llm)?
            .map(|client| Arc::new(client) as Arc<dyn LlmClient>);

        Ok(Self::new(
            TabularLoader::new(config.ingest.load_mode()),
            AnalysisOrchestrator::new(client),
        ))
    }

    pub fn mode(&self) -> AnalysisMode {
        self.orchestrator.mode()
    }

    pub async fn run<S>(
        &self,
        request: AnalysisRequest<S>,
        correlation_id: &str,
    ) -> Result<AnalysisReport, ApplicationError>
    where
        S: DatasetSource + Send + 'static,
    {
        // File reads and CSV parsing block, so they run on the blocking pool.
        let loader = self.loader;
        let ingest_id = correlation_id.to_string();
        let (brand, profile) =
            tokio::task::spawn_blocking(move || request.ingest(&loader, &ingest_id))
                .await
                .map_err(|join_error| {
                    error!(
                        event_name = "analysis.ingest.aborted",
                        correlation_id = %correlation_id,
                        error = %join_error,
                        "ingest task did not complete"
                    );
                    ApplicationError::Internal(format!("ingest task failed: {join_error}"))
                })??;
        let outcome = self.orchestrator.analyze(&brand, &profile, correlation_id).await;

        info!(
            event_name = "analysis.completed",
            correlation_id = %correlation_id,
            state = outcome.state.as_str(),
            time_series = profile.time_series.is_some(),
            product_preference = profile.preferences.is_some(),
            "audience report assembled"
        );

        Ok(assemble(brand, profile, outcome.fragment))
    }
}
