use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_A_THRESHOLD: f64 = 0.80;
pub const DEFAULT_B_THRESHOLD: f64 = 0.95;
pub const DEFAULT_ALPHA: f64 = 0.3;
pub const MAX_FORECAST_HORIZON: u32 = 52;

/// One product line fed into an ABC analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcItem {
    pub product_id: String,
    pub annual_units: f64,
    pub unit_cost: f64,
}

impl AbcItem {
    pub fn annual_value(&self) -> f64 {
        self.annual_units * self.unit_cost
    }
}

/// Input of an ABC analysis. Also hashed into the cache key, so every field
/// that changes the result must live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbcInput {
    pub items: Vec<AbcItem>,
    pub a_threshold: f64,
    pub b_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub const ALL: [AbcClass; 3] = [AbcClass::A, AbcClass::B, AbcClass::C];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedItem {
    pub product_id: String,
    pub class: AbcClass,
    pub annual_value: f64,
    /// Fraction of the total annual value, in `[0, 1]`
    pub share: f64,
    /// Running share including this item
    pub cumulative_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class: AbcClass,
    pub item_count: usize,
    pub total_value: f64,
}

/// Result of an ABC analysis, items ordered by descending annual value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbcReport {
    pub items: Vec<ClassifiedItem>,
    pub classes: Vec<ClassSummary>,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInput {
    pub product_id: String,
    pub history: Vec<f64>,
    pub horizon: u32,
    pub alpha: f64,
}

/// Simple exponential smoothing forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub product_id: String,
    pub alpha: f64,
    /// Smoothed level after the last observation
    pub level: f64,
    pub forecast: Vec<f64>,
    /// `None` when the history has a single observation
    pub mean_absolute_error: Option<f64>,
}
