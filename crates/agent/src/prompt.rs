use brandlens_core::domain::brand::BrandInfo;
use brandlens_core::report::{AnalysisScope, AudienceProfile};
use serde::Serialize;

use crate::llm::{ChatMessage, CompletionRequest};

const SYSTEM_PREAMBLE: &str = "請你擔任資深市場分析師和品牌顧問，分析以下品牌資訊並提供詳細的受眾分析和行銷建議。\n\
請以JSON格式提供以下詳細分析：";

const REQUIRED_FIELDS: [&str; 7] = [
    "1. \"industryCategory\": [行業類別]",
    "2. \"targetAudience\": [目標受眾的詳細特徵描述]",
    "3. \"brandCharacteristics\": [品牌特點摘要]",
    "4. \"genderAnalysis\": [詳細的性別分布分析，包含洞察和趨勢]",
    "5. \"ageAnalysis\": [詳細的年齡分布分析，包含洞察和趨勢]",
    "6. \"marketingSuggestions\": [至少五點針對性的行銷建議數組]",
    "7. \"highValueSegments\": [高價值客群陣列，至少兩個，每個含 name、percentage、description 與 stats（averageOrderValue、purchaseFrequency、repurchaseRate）]",
];

const TIME_SERIES_FIELD: &str = "8. \"timeSeriesAnalysis\": [消費行為時間趨勢分析]";
const PRODUCT_PREFERENCE_FIELD: &str = "9. \"productPreferenceAnalysis\": [商品類別偏好深度分析]";

/// Builds the single structured-analysis request for a brand and its profile.
pub fn build_request(brand: &BrandInfo, profile: &AudienceProfile) -> CompletionRequest {
    CompletionRequest::new(vec![
        ChatMessage::system(system_prompt(profile.scope())),
        ChatMessage::user(user_prompt(brand, profile)),
    ])
    .expect_json_object()
}

fn system_prompt(scope: AnalysisScope) -> String {
    let mut lines = vec![SYSTEM_PREAMBLE];
    lines.extend(REQUIRED_FIELDS);
    if scope.time_series {
        lines.push(TIME_SERIES_FIELD);
    }
    if scope.product_preference {
        lines.push(PRODUCT_PREFERENCE_FIELD);
    }
    lines.join("\n")
}

fn user_prompt(brand: &BrandInfo, profile: &AudienceProfile) -> String {
    let mut prompt = format!(
        "品牌名稱：{}\n品牌簡介：{}\n產品資訊：{}\n\n性別分布數據：\n{}\n\n年齡分布數據：\n{}",
        brand.name,
        brand.description,
        brand.product_info,
        to_json(&profile.gender.raw_data),
        to_json(&profile.age.raw_data),
    );

    if let Some(series) = &profile.time_series {
        prompt.push_str("\n\n時間序列消費行為數據：\n");
        prompt.push_str(&to_json(series));
    }
    if let Some(preferences) = &profile.preferences {
        prompt.push_str("\n\n商品類別偏好數據：\n");
        prompt.push_str(&to_json(preferences));
    }

    prompt
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}
