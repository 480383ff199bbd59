//! Analytics request DTOs. Reports are returned as the model types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{
    AbcInput, AbcItem, DEFAULT_A_THRESHOLD, DEFAULT_ALPHA, DEFAULT_B_THRESHOLD, ForecastInput,
    MAX_FORECAST_HORIZON,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbcItemRequest {
    pub product_id: String,
    pub annual_units: f64,
    pub unit_cost: f64,
}

/// Request body of an ABC analysis.
///
/// Per-item checks (unique ids, non-negative numbers) and the threshold
/// ordering are enforced by the analytics service.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AbcRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<AbcItemRequest>,
    #[serde(default = "default_a_threshold")]
    #[validate(range(exclusive_min = 0.0, max = 1.0, message = "aThreshold must be in (0, 1]"))]
    #[schema(default = 0.8)]
    pub a_threshold: f64,
    #[serde(default = "default_b_threshold")]
    #[validate(range(exclusive_min = 0.0, max = 1.0, message = "bThreshold must be in (0, 1]"))]
    #[schema(default = 0.95)]
    pub b_threshold: f64,
}

fn default_a_threshold() -> f64 {
    DEFAULT_A_THRESHOLD
}

fn default_b_threshold() -> f64 {
    DEFAULT_B_THRESHOLD
}

impl AbcRequest {
    pub fn into_input(self) -> AbcInput {
        AbcInput {
            items: self
                .items
                .into_iter()
                .map(|item| AbcItem {
                    product_id: item.product_id,
                    annual_units: item.annual_units,
                    unit_cost: item.unit_cost,
                })
                .collect(),
            a_threshold: self.a_threshold,
            b_threshold: self.b_threshold,
        }
    }
}

/// Request body of a demand forecast.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    #[validate(length(min = 1, message = "productId must not be empty"))]
    pub product_id: String,
    #[validate(length(min = 1, message = "at least one observation is required"))]
    pub history: Vec<f64>,
    #[validate(range(min = 1, max = MAX_FORECAST_HORIZON, message = "horizon must be between 1 and 52"))]
    pub horizon: u32,
    #[serde(default = "default_alpha")]
    #[validate(range(exclusive_min = 0.0, max = 1.0, message = "alpha must be in (0, 1]"))]
    #[schema(default = 0.3)]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl ForecastRequest {
    pub fn into_input(self) -> ForecastInput {
        ForecastInput {
            product_id: self.product_id,
            history: self.history,
            horizon: self.horizon,
            alpha: self.alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_defaults_applied() {
        let request: AbcRequest = serde_json::from_str(
            r#"{"items":[{"productId":"p1","annualUnits":3,"unitCost":2.5}]}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let input = request.into_input();
        assert_eq!(input.a_threshold, DEFAULT_A_THRESHOLD);
        assert_eq!(input.b_threshold, DEFAULT_B_THRESHOLD);
        assert_eq!(input.items[0].annual_value(), 7.5);
    }

    #[test]
    fn test_forecast_horizon_bounds() {
        let request: ForecastRequest =
            serde_json::from_str(r#"{"productId":"p1","history":[1,2],"horizon":53}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("horizon"));
        assert_eq!(request.alpha, DEFAULT_ALPHA);
    }

    #[test]
    fn test_forecast_alpha_zero_rejected() {
        let request: ForecastRequest = serde_json::from_str(
            r#"{"productId":"p1","history":[1],"horizon":4,"alpha":0}"#,
        )
        .unwrap();
        assert!(request.validate().unwrap_err().field_errors().contains_key("alpha"));
    }

    #[test]
    fn test_abc_empty_items_rejected() {
        let request: AbcRequest = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(request.validate().unwrap_err().field_errors().contains_key("items"));
    }
}
