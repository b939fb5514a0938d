//! Column aliasing.
//!
//! Producers label the same column differently (Traditional/Simplified
//! Chinese or English). Each [`SemanticField`] owns an ordered alias list and
//! resolution returns the first alias present in a row.

use serde::Serialize;

use crate::dataset::Row;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticField {
    Gender,
    Age,
    Ratio,
    Date,
    Amount,
    Category,
    Score,
}

const GENDER_ALIASES: &[&str] = &["性別", "性别", "gender"];
const AGE_ALIASES: &[&str] = &["年齡", "年龄", "age", "age_group"];
const RATIO_ALIASES: &[&str] = &["比例", "percentage", "ratio"];
const DATE_ALIASES: &[&str] = &["日期", "date"];
const AMOUNT_ALIASES: &[&str] =
    &["平均訂單金額", "平均订单金额", "amount", "avg_order_value", "average_order_value"];
const CATEGORY_ALIASES: &[&str] = &["商品類別", "商品类别", "category"];
const SCORE_ALIASES: &[&str] = &["權重分數", "权重分数", "score", "weight"];

impl SemanticField {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Gender => GENDER_ALIASES,
            Self::Age => AGE_ALIASES,
            Self::Ratio => RATIO_ALIASES,
            Self::Date => DATE_ALIASES,
            Self::Amount => AMOUNT_ALIASES,
            Self::Category => CATEGORY_ALIASES,
            Self::Score => SCORE_ALIASES,
        }
    }

    /// Primary (first) alias, used in error messages.
    pub fn label(&self) -> &'static str {
        self.aliases()[0]
    }

    pub fn matches_header(&self, header: &str) -> bool {
        self.aliases().contains(&header)
    }
}

/// Value of the first alias of `field` present in `row`.
///
/// `None` means the feature is absent for this row, not an error.
pub fn resolve<'a>(row: &'a Row, field: SemanticField) -> Option<&'a str> {
    field.aliases().iter().find_map(|alias| row.get(*alias)).map(String::as_str)
}

/// Parses a numeric cell. A trailing `%` and thousands separators are
/// tolerated; non-finite results are treated as unparseable.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned: String = trimmed.chars().filter(|ch| *ch != ',').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn resolve_number(row: &Row, field: SemanticField) -> Option<f64> {
    resolve(row, field).and_then(parse_number)
}
