use serde::Serialize;

use crate::dataset::fields::{resolve, resolve_number, SemanticField};
use crate::dataset::{Dataset, Row};

pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSummary {
    pub raw_data: Vec<Row>,
    /// Empty when no row carried a positive, parseable ratio.
    pub dominant_category: String,
}

impl DistributionSummary {
    pub fn is_unknown(&self) -> bool {
        self.dominant_category.is_empty()
    }

    /// Dominant category, or [`UNKNOWN_CATEGORY`] when there is none.
    pub fn dominant_label(&self) -> &str {
        if self.is_unknown() {
            UNKNOWN_CATEGORY
        } else {
            &self.dominant_category
        }
    }
}

/// Linear scan for the row with the largest ratio.
///
/// Only a strictly greater value replaces the current leader, so ties keep the
/// earliest row. The running maximum starts at zero.
pub fn summarize(
    dataset: &Dataset,
    category_field: SemanticField,
    ratio_field: SemanticField,
) -> DistributionSummary {
    let mut max_value = 0.0_f64;
    let mut dominant = String::new();

    for row in &dataset.rows {
        let Some(value) = resolve_number(row, ratio_field) else {
            continue;
        };
        if value > max_value {
            max_value = value;
            dominant = resolve(row, category_field).unwrap_or_default().to_string();
        }
    }

    DistributionSummary { raw_data: dataset.rows.clone(), dominant_category: dominant }
}
