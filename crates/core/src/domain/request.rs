//! Inbound analysis requests.
//!
//! A request is validated as a whole before any upload is read; invalid
//! requests drop their sources untouched (transient uploads clean themselves
//! up on drop).

use tracing::{debug, info};

use crate::dataset::fields::SemanticField;
use crate::dataset::loader::TabularLoader;
use crate::dataset::preference::normalize;
use crate::dataset::source::DatasetSource;
use crate::dataset::summary::summarize;
use crate::dataset::timeseries::reshape;
use crate::dataset::{Dataset, DatasetKind};
use crate::domain::brand::BrandInfo;
use crate::errors::InputError;
use crate::report::{AudienceProfile, TimeSeriesData};

/// Zero to five uploaded datasets, one slot per [`DatasetKind`].
#[derive(Debug)]
pub struct UploadSet<S> {
    pub gender: Option<S>,
    pub age: Option<S>,
    pub product_preference: Option<S>,
    pub gender_time_series: Option<S>,
    pub age_time_series: Option<S>,
}

impl<S> Default for UploadSet<S> {
    fn default() -> Self {
        Self {
            gender: None,
            age: None,
            product_preference: None,
            gender_time_series: None,
            age_time_series: None,
        }
    }
}

impl<S> UploadSet<S> {
    fn slot(&mut self, kind: DatasetKind) -> &mut Option<S> {
        match kind {
            DatasetKind::Gender => &mut self.gender,
            DatasetKind::Age => &mut self.age,
            DatasetKind::ProductPreference => &mut self.product_preference,
            DatasetKind::GenderTimeSeries => &mut self.gender_time_series,
            DatasetKind::AgeTimeSeries => &mut self.age_time_series,
        }
    }

    /// Stores `source` for `kind`, returning whatever it replaced.
    pub fn insert(&mut self, kind: DatasetKind, source: S) -> Option<S> {
        self.slot(kind).replace(source)
    }

    pub fn with(mut self, kind: DatasetKind, source: S) -> Self {
        self.insert(kind, source);
        self
    }

    pub fn take(&mut self, kind: DatasetKind) -> Option<S> {
        self.slot(kind).take()
    }

    pub fn contains(&self, kind: DatasetKind) -> bool {
        match kind {
            DatasetKind::Gender => self.gender.is_some(),
            DatasetKind::Age => self.age.is_some(),
            DatasetKind::ProductPreference => self.product_preference.is_some(),
            DatasetKind::GenderTimeSeries => self.gender_time_series.is_some(),
            DatasetKind::AgeTimeSeries => self.age_time_series.is_some(),
        }
    }

    pub fn kinds(&self) -> Vec<DatasetKind> {
        DatasetKind::ALL.into_iter().filter(|kind| self.contains(*kind)).collect()
    }
}

#[derive(Debug)]
pub struct AnalysisRequest<S> {
    pub brand: BrandInfo,
    pub uploads: UploadSet<S>,
}

impl<S> AnalysisRequest<S> {
    pub fn new(brand: BrandInfo, uploads: UploadSet<S>) -> Self {
        Self { brand, uploads }
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if !self.brand.has_name() {
            return Err(InputError::MissingBrandName);
        }
        if !self.uploads.contains(DatasetKind::Gender) && !self.uploads.contains(DatasetKind::Age)
        {
            return Err(InputError::MissingAudienceData);
        }
        Ok(())
    }
}

impl<S: DatasetSource> AnalysisRequest<S> {
    /// Validates, parses every upload and derives the local audience profile.
    ///
    /// Every source is consumed (and so released) even when an earlier one
    /// fails to parse.
    pub fn ingest(
        mut self,
        loader: &TabularLoader,
        correlation_id: &str,
    ) -> Result<(BrandInfo, AudienceProfile), InputError> {
        self.validate()?;

        let mut datasets = Vec::with_capacity(DatasetKind::ALL.len());
        for kind in DatasetKind::ALL {
            if let Some(source) = self.uploads.take(kind) {
                debug!(
                    event_name = "ingest.dataset.loading",
                    correlation_id = %correlation_id,
                    dataset = %kind,
                    source = %source.describe(),
                    "loading dataset"
                );
                let loaded = source
                    .load(loader, kind)
                    .map_err(|error| InputError::from_loader(kind, error));
                datasets.push((kind, loaded));
            }
        }

        let mut loaded = LoadedDatasets::default();
        for (kind, result) in datasets {
            let dataset = result?;
            info!(
                event_name = "ingest.dataset.parsed",
                correlation_id = %correlation_id,
                dataset = %kind,
                rows = dataset.len(),
                "dataset parsed"
            );
            loaded.put(dataset);
        }

        let brand = BrandInfo {
            name: self.brand.name.trim().to_string(),
            description: self.brand.description.trim().to_string(),
            product_info: self.brand.product_info.trim().to_string(),
        };
        Ok((brand, loaded.into_profile()))
    }
}

#[derive(Default)]
struct LoadedDatasets {
    gender: Option<Dataset>,
    age: Option<Dataset>,
    product_preference: Option<Dataset>,
    gender_time_series: Option<Dataset>,
    age_time_series: Option<Dataset>,
}

impl LoadedDatasets {
    fn put(&mut self, dataset: Dataset) {
        let slot = match dataset.kind {
            DatasetKind::Gender => &mut self.gender,
            DatasetKind::Age => &mut self.age,
            DatasetKind::ProductPreference => &mut self.product_preference,
            DatasetKind::GenderTimeSeries => &mut self.gender_time_series,
            DatasetKind::AgeTimeSeries => &mut self.age_time_series,
        };
        *slot = Some(dataset);
    }

    fn into_profile(self) -> AudienceProfile {
        let gender = self.gender.unwrap_or_else(|| Dataset::empty(DatasetKind::Gender));
        let age = self.age.unwrap_or_else(|| Dataset::empty(DatasetKind::Age));

        // Optional sections follow the supplied datasets, not what was derived.
        let time_series = TimeSeriesData::from_series(
            supplied(self.gender_time_series)
                .map(|dataset| reshape(&dataset, SemanticField::Gender)),
            supplied(self.age_time_series).map(|dataset| reshape(&dataset, SemanticField::Age)),
        );
        let preferences = supplied(self.product_preference).map(|dataset| normalize(&dataset));

        AudienceProfile {
            gender: summarize(&gender, SemanticField::Gender, SemanticField::Ratio),
            age: summarize(&age, SemanticField::Age, SemanticField::Ratio),
            time_series,
            preferences,
        }
    }
}

fn supplied(dataset: Option<Dataset>) -> Option<Dataset> {
    dataset.filter(|dataset| !dataset.is_empty())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{AnalysisRequest, UploadSet};
    use crate::dataset::loader::{LoadMode, TabularLoader};
    use crate::dataset::source::{InlineBytes, TransientUpload};
    use crate::dataset::DatasetKind;
    use crate::domain::brand::BrandInfo;
    use crate::errors::InputError;

    fn inline(text: &str) -> InlineBytes {
        InlineBytes(text.as_bytes().to_vec())
    }

    const GENDER: &str = "性別,比例\n男,40\n女,60\n";
    const AGE: &str = "年齡,比例\n18-24,30\n25-34,70\n";

    #[test]
    fn missing_brand_name_is_rejected_before_parsing() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("gender.csv");
        fs::write(&path, "not,a,valid\n").expect("write upload");

        let request = AnalysisRequest::new(
            BrandInfo::new("   "),
            UploadSet::default().with(DatasetKind::Gender, TransientUpload::new(&path, "req")),
        );

        let error = request.ingest(&TabularLoader::default(), "req").expect_err("should fail");
        assert_eq!(error, InputError::MissingBrandName);
        assert!(!path.exists(), "rejected uploads are still cleaned up");
    }

    #[test]
    fn missing_gender_and_age_is_rejected_even_with_preferences() {
        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default()
                .with(DatasetKind::ProductPreference, inline("商品類別,權重分數\n品質,120\n")),
        );

        let error = request.ingest(&TabularLoader::default(), "req").expect_err("should fail");
        assert_eq!(error, InputError::MissingAudienceData);
    }

    #[test]
    fn ingests_gender_and_age_into_profile() {
        let request = AnalysisRequest::new(
            BrandInfo::new(" Acme "),
            UploadSet::default()
                .with(DatasetKind::Gender, inline(GENDER))
                .with(DatasetKind::Age, inline(AGE)),
        );

        let (brand, profile) =
            request.ingest(&TabularLoader::default(), "req").expect("ingest should succeed");

        assert_eq!(brand.name, "Acme");
        assert_eq!(profile.gender.dominant_category, "女");
        assert_eq!(profile.age.dominant_category, "25-34");
        assert!(profile.time_series.is_none());
        assert!(profile.preferences.is_none());
    }

    #[test]
    fn absent_age_dataset_summarizes_as_unknown() {
        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default().with(DatasetKind::Gender, inline(GENDER)),
        );

        let (_, profile) = request.ingest(&TabularLoader::default(), "req").expect("ingest");
        assert!(profile.age.is_unknown());
        assert!(profile.age.raw_data.is_empty());
    }

    #[test]
    fn optional_datasets_populate_optional_sections() {
        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default()
                .with(DatasetKind::Gender, inline(GENDER))
                .with(
                    DatasetKind::GenderTimeSeries,
                    inline("日期,性別,平均訂單金額\n2023-02,男,120\n2023-01,女,150\n"),
                )
                .with(DatasetKind::ProductPreference, inline("商品類別,權重分數\n品質,120\n")),
        );

        let (_, profile) = request.ingest(&TabularLoader::default(), "req").expect("ingest");
        let series = profile.time_series.expect("time series section");
        let gender_series = series.gender.expect("gender series");
        assert_eq!(gender_series[0].label, "2023-01");
        assert!(series.age.is_none());
        assert_eq!(profile.preferences.map(|entries| entries.len()), Some(1));
    }

    #[test]
    fn strict_parse_failure_is_a_client_error_and_cleans_all_uploads() {
        let dir = TempDir::new().expect("temp dir");
        let gender_path = dir.path().join("gender.csv");
        let age_path = dir.path().join("age.csv");
        fs::write(&gender_path, "性別,比例\n").expect("write gender");
        fs::write(&age_path, AGE).expect("write age");

        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default()
                .with(DatasetKind::Gender, TransientUpload::new(&gender_path, "req"))
                .with(DatasetKind::Age, TransientUpload::new(&age_path, "req")),
        );

        let error = request.ingest(&TabularLoader::default(), "req").expect_err("should fail");
        assert!(matches!(error, InputError::MalformedDataset { kind: DatasetKind::Gender, .. }));
        assert!(!gender_path.exists());
        assert!(!age_path.exists());
    }

    #[test]
    fn lenient_mode_treats_empty_optional_dataset_as_absent() {
        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default()
                .with(DatasetKind::Age, inline(AGE))
                .with(DatasetKind::AgeTimeSeries, inline("日期,年齡,平均訂單金額\n")),
        );

        let (_, profile) =
            request.ingest(&TabularLoader::new(LoadMode::Lenient), "req").expect("ingest");
        assert!(profile.time_series.is_none());
    }

    #[test]
    fn lenient_mode_keeps_sections_for_supplied_datasets_without_known_columns() {
        let request = AnalysisRequest::new(
            BrandInfo::new("Acme"),
            UploadSet::default()
                .with(DatasetKind::Gender, inline("gender,ratio\nm,40\n"))
                .with(DatasetKind::ProductPreference, inline("item,weight\nq,120\n"))
                .with(DatasetKind::GenderTimeSeries, inline("when,gender,amount\n2023-01,m,5\n")),
        );

        let (_, profile) =
            request.ingest(&TabularLoader::new(LoadMode::Lenient), "req").expect("ingest");

        let preferences = profile.preferences.expect("preference section");
        assert_eq!(preferences.len(), 1);
        assert_eq!(preferences[0].category, "");
        let series = profile.time_series.expect("time series section");
        assert_eq!(series.gender, Some(vec![]));
        assert!(series.age.is_none());
    }

    #[test]
    fn upload_set_reports_present_kinds_in_canonical_order() {
        let uploads = UploadSet::default()
            .with(DatasetKind::AgeTimeSeries, inline(""))
            .with(DatasetKind::Gender, inline(""));
        assert_eq!(uploads.kinds(), vec![DatasetKind::Gender, DatasetKind::AgeTimeSeries]);
    }
}
