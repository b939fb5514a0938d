//! Audience report shapes.
//!
//! [`AnalysisFragment`] is what the analysis service (or the fallback
//! generator) produces; [`AnalysisReport`] is the merged value handed back to
//! the caller.

pub mod assemble;
pub mod fallback;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dataset::preference::PreferenceEntry;
use crate::dataset::summary::DistributionSummary;
use crate::dataset::timeseries::TimeSeriesPoint;

pub const MIN_MARKETING_SUGGESTIONS: usize = 5;
pub const MIN_HIGH_VALUE_SEGMENTS: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
    #[serde(deserialize_with = "text_or_number")]
    pub average_order_value: String,
    #[serde(deserialize_with = "text_or_number")]
    pub purchase_frequency: String,
    #[serde(deserialize_with = "text_or_number")]
    pub repurchase_rate: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighValueSegment {
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub percentage: String,
    pub description: String,
    pub stats: SegmentStats,
}

/// Structured analysis output, required fields first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFragment {
    pub industry_category: String,
    pub target_audience: String,
    pub brand_characteristics: String,
    pub gender_analysis: String,
    pub age_analysis: String,
    pub marketing_suggestions: Vec<String>,
    pub high_value_segments: Vec<HighValueSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_series_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_preference_analysis: Option<String>,
}

/// Which optional analyses a fragment is expected to carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnalysisScope {
    pub time_series: bool,
    pub product_preference: bool,
}

impl AnalysisFragment {
    /// Lists every way the fragment falls short of the response contract.
    pub fn violations(&self, scope: AnalysisScope) -> Vec<String> {
        let mut violations = Vec::new();

        let required_text = [
            ("industryCategory", &self.industry_category),
            ("targetAudience", &self.target_audience),
            ("brandCharacteristics", &self.brand_characteristics),
            ("genderAnalysis", &self.gender_analysis),
            ("ageAnalysis", &self.age_analysis),
        ];
        for (name, value) in required_text {
            if value.trim().is_empty() {
                violations.push(format!("{name} is empty"));
            }
        }

        let suggestions =
            self.marketing_suggestions.iter().filter(|item| !item.trim().is_empty()).count();
        if suggestions < MIN_MARKETING_SUGGESTIONS {
            violations.push(format!(
                "marketingSuggestions has {suggestions} entries, expected at least {MIN_MARKETING_SUGGESTIONS}"
            ));
        }

        if self.high_value_segments.len() < MIN_HIGH_VALUE_SEGMENTS {
            violations.push(format!(
                "highValueSegments has {} entries, expected at least {MIN_HIGH_VALUE_SEGMENTS}",
                self.high_value_segments.len()
            ));
        }
        if self.high_value_segments.iter().any(|segment| segment.name.trim().is_empty()) {
            violations.push("highValueSegments contains an unnamed segment".to_string());
        }

        if scope.time_series && is_blank(self.time_series_analysis.as_deref()) {
            violations.push("timeSeriesAnalysis is missing".to_string());
        }
        if scope.product_preference && is_blank(self.product_preference_analysis.as_deref()) {
            violations.push("productPreferenceAnalysis is missing".to_string());
        }

        violations
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|text| text.trim().is_empty()).unwrap_or(true)
}

/// Accepts `"18%"` as well as `18` for display-only statistics.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}

/// Pivoted consumption series; either side may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeriesData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Vec<TimeSeriesPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Vec<TimeSeriesPoint>>,
}

impl TimeSeriesData {
    /// `None` only when neither side was supplied. A supplied side is kept
    /// even if reshaping produced no points.
    pub fn from_series(
        gender: Option<Vec<TimeSeriesPoint>>,
        age: Option<Vec<TimeSeriesPoint>>,
    ) -> Option<Self> {
        if gender.is_none() && age.is_none() {
            None
        } else {
            Some(Self { gender, age })
        }
    }
}

/// Everything derived locally from the uploaded datasets.
#[derive(Clone, Debug, PartialEq)]
pub struct AudienceProfile {
    pub gender: DistributionSummary,
    pub age: DistributionSummary,
    pub time_series: Option<TimeSeriesData>,
    pub preferences: Option<Vec<PreferenceEntry>>,
}

impl AudienceProfile {
    pub fn scope(&self) -> AnalysisScope {
        AnalysisScope {
            time_series: self.time_series.is_some(),
            product_preference: self.preferences.is_some(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionSection {
    #[serde(flatten)]
    pub summary: DistributionSummary,
    pub analysis: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeriesSection {
    #[serde(flatten)]
    pub data: TimeSeriesData,
    pub analysis: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductPreferenceSection {
    pub categories: Vec<PreferenceEntry>,
    pub analysis: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub brand_name: String,
    pub brand_description: String,
    pub product_info: String,
    pub industry_category: String,
    pub target_audience: String,
    pub brand_characteristics: String,
    pub gender_distribution: DistributionSection,
    pub age_distribution: DistributionSection,
    pub marketing_suggestions: Vec<String>,
    pub high_value_segments: Vec<HighValueSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<TimeSeriesSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_preference: Option<ProductPreferenceSection>,
}
