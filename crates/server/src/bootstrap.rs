use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use brandlens_agent::{AudiencePipeline, LlmError};
use brandlens_core::config::{AppConfig, ConfigError, LoadOptions};
use thiserror::Error;
use tracing::info;

use crate::analyze::{self, AnalyzeState};
use crate::health::{self, HealthState};

pub struct Application {
    pub config: AppConfig,
    pub pipeline: Arc<AudiencePipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("analysis client setup failed: {0}")]
    AnalysisClient(#[source] LlmError),
    #[error("upload directory `{path}` could not be created: {source}")]
    UploadDir { path: PathBuf, source: std::io::Error },
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    tokio::fs::create_dir_all(&config.server.upload_dir).await.map_err(|source| {
        BootstrapError::UploadDir { path: config.server.upload_dir.clone(), source }
    })?;

    let pipeline =
        AudiencePipeline::from_config(&config).map_err(BootstrapError::AnalysisClient)?;
    info!(
        event_name = "system.bootstrap.analysis_mode",
        correlation_id = "bootstrap",
        mode = pipeline.mode().as_str(),
        model = %config.llm.model,
        strict_ingest = config.ingest.strict,
        "analysis pipeline initialized"
    );

    Ok(Application { config, pipeline: Arc::new(pipeline) })
}

impl Application {
    pub fn router(&self) -> Router {
        let upload_dir = self.config.server.upload_dir.clone();

        analyze::router(
            AnalyzeState::new(self.pipeline.clone(), upload_dir.clone()),
            self.config.server.max_upload_bytes,
        )
        .merge(health::router(HealthState::new(self.pipeline.mode(), upload_dir)))
    }
}
