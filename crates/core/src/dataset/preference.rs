use serde::Serialize;

use crate::dataset::fields::{resolve, resolve_number, SemanticField};
use crate::dataset::Dataset;

/// Upper bound of the radar chart axis every score is plotted against.
pub const PREFERENCE_SCALE_MAX: f64 = 150.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceEntry {
    pub category: String,
    /// `NaN` when the cell did not parse; serializes as `null`.
    pub score: f64,
    pub scale_max: f64,
}

impl PreferenceEntry {
    pub fn has_score(&self) -> bool {
        self.score.is_finite()
    }
}

/// One entry per row; an unresolved category is the empty string.
pub fn normalize(dataset: &Dataset) -> Vec<PreferenceEntry> {
    dataset
        .rows
        .iter()
        .map(|row| PreferenceEntry {
            category: resolve(row, SemanticField::Category).unwrap_or_default().to_string(),
            score: resolve_number(row, SemanticField::Score).unwrap_or(f64::NAN),
            scale_max: PREFERENCE_SCALE_MAX,
        })
        .collect()
}
