//! Tabular audience datasets.
//!
//! Every uploaded file becomes one [`Dataset`]: an ordered list of [`Row`]s
//! keyed by the file's header line. Column names are not normalized here;
//! downstream code resolves them through [`fields::SemanticField`].

pub mod fields;
pub mod loader;
pub mod preference;
pub mod source;
pub mod summary;
pub mod timeseries;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::fields::SemanticField;

/// One data record: column name to trimmed cell value.
pub type Row = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatasetKind {
    Gender,
    Age,
    ProductPreference,
    GenderTimeSeries,
    AgeTimeSeries,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Gender,
        DatasetKind::Age,
        DatasetKind::ProductPreference,
        DatasetKind::GenderTimeSeries,
        DatasetKind::AgeTimeSeries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Age => "age",
            Self::ProductPreference => "productPref",
            Self::GenderTimeSeries => "timeSeriesGender",
            Self::AgeTimeSeries => "timeSeriesAge",
        }
    }

    /// Multipart field name the upload arrives under.
    pub fn upload_field(&self) -> &'static str {
        match self {
            Self::Gender => "genderFile",
            Self::Age => "ageFile",
            Self::ProductPreference => "productPrefFile",
            Self::GenderTimeSeries => "timeSeriesGenderFile",
            Self::AgeTimeSeries => "timeSeriesAgeFile",
        }
    }

    pub fn from_upload_field(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.upload_field() == name)
    }

    /// Semantic columns a header must carry for strict loading to accept it.
    pub fn required_fields(&self) -> &'static [SemanticField] {
        match self {
            Self::Gender => &[SemanticField::Gender, SemanticField::Ratio],
            Self::Age => &[SemanticField::Age, SemanticField::Ratio],
            Self::ProductPreference => &[SemanticField::Category, SemanticField::Score],
            Self::GenderTimeSeries => {
                &[SemanticField::Date, SemanticField::Gender, SemanticField::Amount]
            }
            Self::AgeTimeSeries => &[SemanticField::Date, SemanticField::Age, SemanticField::Amount],
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dataset {
    pub kind: DatasetKind,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn empty(kind: DatasetKind) -> Self {
        Self { kind, headers: Vec::new(), rows: Vec::new() }
    }

    pub fn from_rows(kind: DatasetKind, rows: Vec<Row>) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }
        Self { kind, headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect()
}
