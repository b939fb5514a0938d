//! Pivoting of row-per-(date, category) records into row-per-date points.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::dataset::fields::{resolve, resolve_number, SemanticField};
use crate::dataset::Dataset;

const LABEL_KEY: &str = "name";

/// One chart row: the date label plus a value for every category.
///
/// Serializes flat, e.g. `{"name":"2023-01","男":100.0,"女":150.0}`. A
/// category spelled `name`, `name_`, `name__`, ... gains one trailing `_` so
/// it never shadows the label or another category.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesPoint {
    pub label: String,
    /// Category values in first-seen category order.
    pub values: Vec<(String, f64)>,
}

impl TimeSeriesPoint {
    pub fn value(&self, category: &str) -> Option<f64> {
        self.values.iter().find(|(name, _)| name == category).map(|(_, value)| *value)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for TimeSeriesPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(LABEL_KEY, &self.label)?;
        for (category, value) in &self.values {
            map.serialize_entry(&category_key(category), value)?;
        }
        map.end()
    }
}

fn category_key(category: &str) -> String {
    let shadows_label = category
        .strip_prefix(LABEL_KEY)
        .is_some_and(|rest| rest.chars().all(|c| c == '_'));
    if shadows_label {
        format!("{category}_")
    } else {
        category.to_string()
    }
}

/// Pivots `dataset` on `category_field`.
///
/// Rows without a date or category are skipped. A missing or unparseable
/// amount counts as 0, and a repeated (date, category) pair keeps the last
/// value. Every point carries every category seen anywhere in the dataset.
pub fn reshape(dataset: &Dataset, category_field: SemanticField) -> Vec<TimeSeriesPoint> {
    let mut categories: Vec<String> = Vec::new();
    let mut dates: Vec<String> = Vec::new();
    let mut cells: HashMap<(usize, usize), f64> = HashMap::new();

    for row in &dataset.rows {
        let (Some(date), Some(category)) =
            (resolve(row, SemanticField::Date), resolve(row, category_field))
        else {
            continue;
        };
        if date.is_empty() || category.is_empty() {
            continue;
        }

        let amount = resolve_number(row, SemanticField::Amount).unwrap_or(0.0);
        let date_index = index_of(&mut dates, date);
        let category_index = index_of(&mut categories, category);
        cells.insert((date_index, category_index), amount);
    }

    let mut points: Vec<TimeSeriesPoint> = dates
        .iter()
        .enumerate()
        .map(|(date_index, label)| TimeSeriesPoint {
            label: label.clone(),
            values: categories
                .iter()
                .enumerate()
                .map(|(category_index, category)| {
                    let value =
                        cells.get(&(date_index, category_index)).copied().unwrap_or(0.0);
                    (category.clone(), value)
                })
                .collect(),
        })
        .collect();

    points.sort_by_cached_key(|point| date_sort_key(&point.label));
    points
}

fn index_of(values: &mut Vec<String>, value: &str) -> usize {
    match values.iter().position(|existing| existing == value) {
        Some(index) => index,
        None => {
            values.push(value.to_string());
            values.len() - 1
        }
    }
}

/// Parsed dates first in calendar order, then unparseable labels in
/// lexicographic order.
fn date_sort_key(label: &str) -> (bool, Option<NaiveDate>, String) {
    let parsed = parse_date(label);
    (parsed.is_none(), parsed, label.to_string())
}

pub fn parse_date(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    const FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    if let Some(date) =
        FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(label, format).ok())
    {
        return Some(date);
    }

    // Month-only labels are anchored to the first of the month.
    let with_day = if label.contains('/') { format!("{label}/01") } else { format!("{label}-01") };
    FORMATS.iter().find_map(|format| NaiveDate::parse_from_str(&with_day, format).ok())
}
