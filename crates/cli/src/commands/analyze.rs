use std::path::PathBuf;

use brandlens_agent::AudiencePipeline;
use brandlens_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use brandlens_core::dataset::source::LocalFile;
use brandlens_core::dataset::DatasetKind;
use brandlens_core::domain::brand::BrandInfo;
use brandlens_core::domain::request::{AnalysisRequest, UploadSet};
use brandlens_core::errors::ApplicationError;
use clap::Args;
use uuid::Uuid;

use crate::commands::CommandResult;

#[derive(Debug, Clone, Default, Args)]
pub struct AnalyzeArgs {
    #[arg(long, default_value = "", help = "Brand name (required)")]
    pub brand_name: String,
    #[arg(long, default_value = "", help = "Short brand description")]
    pub brand_description: String,
    #[arg(long, default_value = "", help = "Product information")]
    pub product_info: String,
    #[arg(long, value_name = "CSV", help = "Gender distribution dataset")]
    pub gender: Option<PathBuf>,
    #[arg(long, value_name = "CSV", help = "Age distribution dataset")]
    pub age: Option<PathBuf>,
    #[arg(long, value_name = "CSV", help = "Product category preference dataset")]
    pub product_pref: Option<PathBuf>,
    #[arg(long, value_name = "CSV", help = "Consumption time series by gender")]
    pub time_series_gender: Option<PathBuf>,
    #[arg(long, value_name = "CSV", help = "Consumption time series by age group")]
    pub time_series_age: Option<PathBuf>,
    #[arg(long, help = "Skip required-column checks and tolerate empty datasets")]
    pub lenient: bool,
}

impl AnalyzeArgs {
    fn into_request(self) -> AnalysisRequest<LocalFile> {
        let brand = BrandInfo::new(self.brand_name)
            .with_description(self.brand_description)
            .with_product_info(self.product_info);

        let mut uploads = UploadSet::default();
        let files = [
            self.gender.map(|path| (DatasetKind::Gender, path)),
            self.age.map(|path| (DatasetKind::Age, path)),
            self.product_pref.map(|path| (DatasetKind::ProductPreference, path)),
            self.time_series_gender.map(|path| (DatasetKind::GenderTimeSeries, path)),
            self.time_series_age.map(|path| (DatasetKind::AgeTimeSeries, path)),
        ];
        for (kind, path) in files.into_iter().flatten() {
            uploads.insert(kind, LocalFile(path));
        }

        AnalysisRequest::new(brand, uploads)
    }
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let overrides = ConfigOverrides {
        strict_ingest: args.lenient.then_some(false),
        ..ConfigOverrides::default()
    };
    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let pipeline = match AudiencePipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(error) => {
            return CommandResult::failure("analyze", "analysis_client", error.to_string(), 4);
        }
    };

    let correlation_id = Uuid::new_v4().to_string();
    let request = args.into_request();
    match runtime.block_on(pipeline.run(request, &correlation_id)) {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("analyze", "serialization", error.to_string(), 6),
        },
        Err(ApplicationError::Input(error)) => {
            CommandResult::failure("analyze", "input_validation", error.to_string(), 5)
        }
        Err(error) => CommandResult::failure("analyze", "internal", error.to_string(), 7),
    }
}
