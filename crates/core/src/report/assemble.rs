use crate::domain::brand::BrandInfo;
use crate::report::{
    AnalysisFragment, AnalysisReport, AudienceProfile, DistributionSection,
    ProductPreferenceSection, TimeSeriesSection,
};

/// Merges an analysis fragment with the locally derived profile.
///
/// Structural only: narratives come from the fragment, data from the profile,
/// and optional sections exist exactly when the profile carries their data.
pub fn assemble(
    brand: BrandInfo,
    profile: AudienceProfile,
    fragment: AnalysisFragment,
) -> AnalysisReport {
    let AudienceProfile { gender, age, time_series, preferences } = profile;

    let time_series = time_series.map(|data| TimeSeriesSection {
        data,
        analysis: fragment.time_series_analysis.unwrap_or_default(),
    });
    let product_preference = preferences.map(|categories| ProductPreferenceSection {
        categories,
        analysis: fragment.product_preference_analysis.unwrap_or_default(),
    });

    AnalysisReport {
        brand_name: brand.name,
        brand_description: brand.description,
        product_info: brand.product_info,
        industry_category: fragment.industry_category,
        target_audience: fragment.target_audience,
        brand_characteristics: fragment.brand_characteristics,
        gender_distribution: DistributionSection {
            summary: gender,
            analysis: fragment.gender_analysis,
        },
        age_distribution: DistributionSection { summary: age, analysis: fragment.age_analysis },
        marketing_suggestions: fragment.marketing_suggestions,
        high_value_segments: fragment.high_value_segments,
        time_series,
        product_preference,
    }
}
