pub mod config;
pub mod dataset;
pub mod domain;
pub mod errors;
pub mod report;

pub use dataset::fields::{resolve, SemanticField};
pub use dataset::loader::{LoadMode, LoaderError, TabularLoader};
pub use dataset::preference::{normalize, PreferenceEntry, PREFERENCE_SCALE_MAX};
pub use dataset::source::{DatasetSource, InlineBytes, LocalFile, TransientUpload};
pub use dataset::summary::{summarize, DistributionSummary, UNKNOWN_CATEGORY};
pub use dataset::timeseries::{reshape, TimeSeriesPoint};
pub use dataset::{Dataset, DatasetKind, Row};
pub use domain::brand::BrandInfo;
pub use domain::request::{AnalysisRequest, UploadSet};
pub use errors::{ApplicationError, InputError, InterfaceError};
pub use report::assemble::assemble;
pub use report::fallback::fallback;
pub use report::{
    AnalysisFragment, AnalysisReport, AnalysisScope, AudienceProfile, HighValueSegment,
    SegmentStats, TimeSeriesData,
};
