//! Inventory analytics computed from request payloads.
//!
//! Results depend only on the tenant and the input, so both operations are
//! cached per tenant under a digest of the input.

use std::collections::{BTreeMap, HashSet};

use crate::cache::{TenantCache, tenant_cached};
use crate::error::{AppError, AppResult};
use crate::models::{
    AbcClass, AbcInput, AbcReport, ClassSummary, ClassifiedItem, ForecastInput, ForecastReport,
    MAX_FORECAST_HORIZON,
};

#[derive(Clone)]
pub struct AnalyticsService {
    cache: TenantCache,
}

impl AnalyticsService {
    pub fn new(cache: TenantCache) -> Self {
        Self { cache }
    }

    /// Classify items into A/B/C by their share of total annual value.
    #[tenant_cached(namespace = "abc", ttl = 600, tenant = tenant, digest = input)]
    pub async fn abc_analysis(&self, tenant: &str, input: AbcInput) -> AppResult<AbcReport> {
        tracing::debug!(tenant, items = input.items.len(), "Computing ABC analysis");
        classify(&input)
    }

    /// Exponential smoothing forecast for one product.
    #[tenant_cached(
        namespace = "forecast",
        ttl = 300,
        tenant = tenant,
        key = product_id,
        digest = input
    )]
    pub async fn forecast(
        &self,
        tenant: &str,
        product_id: &str,
        input: ForecastInput,
    ) -> AppResult<ForecastReport> {
        tracing::debug!(tenant, product_id, periods = input.history.len(), "Computing forecast");
        smooth(&input)
    }
}

fn validate_abc(input: &AbcInput) -> AppResult<()> {
    if input.items.is_empty() {
        return Err(AppError::validation("items", "at least one item is required"));
    }

    let mut seen = HashSet::with_capacity(input.items.len());
    for item in &input.items {
        if item.product_id.trim().is_empty() {
            return Err(AppError::validation("productId", "must not be empty"));
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(AppError::validation(
                "productId",
                format!("duplicate product '{}'", item.product_id),
            ));
        }
        for (field, value) in [("annualUnits", item.annual_units), ("unitCost", item.unit_cost)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::validation(
                    field,
                    format!("must be a non-negative number for '{}'", item.product_id),
                ));
            }
        }
        if !item.annual_value().is_finite() {
            return Err(AppError::validation(
                "items",
                format!("annual value of '{}' is out of range", item.product_id),
            ));
        }
    }

    let total: f64 = input.items.iter().map(|item| item.annual_value()).sum();
    if !total.is_finite() {
        return Err(AppError::validation("items", "total annual value is out of range"));
    }

    let (a, b) = (input.a_threshold, input.b_threshold);
    if !(a > 0.0 && a < b && b <= 1.0) {
        return Err(AppError::validation(
            "thresholds",
            format!("expected 0 < aThreshold < bThreshold <= 1, got {} and {}", a, b),
        ));
    }
    Ok(())
}

fn classify(input: &AbcInput) -> AppResult<AbcReport> {
    validate_abc(input)?;

    let mut valued: Vec<(&str, f64)> = input
        .items
        .iter()
        .map(|item| (item.product_id.as_str(), item.annual_value()))
        .collect();
    valued.sort_by(|(id_a, v_a), (id_b, v_b)| v_b.total_cmp(v_a).then_with(|| id_a.cmp(id_b)));

    let total_value: f64 = valued.iter().map(|(_, v)| v).sum();
    let mut cumulative = 0.0;
    let mut summary: BTreeMap<AbcClass, (usize, f64)> =
        AbcClass::ALL.iter().map(|c| (*c, (0, 0.0))).collect();

    let items = valued
        .into_iter()
        .map(|(product_id, annual_value)| {
            let share = if total_value > 0.0 {
                annual_value / total_value
            } else {
                0.0
            };
            // the class depends on the share accumulated before this item
            let class = if total_value <= 0.0 {
                AbcClass::C
            } else if cumulative < input.a_threshold {
                AbcClass::A
            } else if cumulative < input.b_threshold {
                AbcClass::B
            } else {
                AbcClass::C
            };
            cumulative += share;

            let entry = summary.entry(class).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += annual_value;

            ClassifiedItem {
                product_id: product_id.to_string(),
                class,
                annual_value,
                share,
                cumulative_share: cumulative,
            }
        })
        .collect();

    Ok(AbcReport {
        items,
        classes: summary
            .into_iter()
            .map(|(class, (item_count, total_value))| ClassSummary {
                class,
                item_count,
                total_value,
            })
            .collect(),
        total_value,
    })
}

fn validate_forecast(input: &ForecastInput) -> AppResult<()> {
    if input.history.is_empty() {
        return Err(AppError::validation("history", "at least one observation is required"));
    }
    if input.history.iter().any(|x| !x.is_finite() || *x < 0.0) {
        return Err(AppError::validation("history", "observations must be non-negative numbers"));
    }
    if input.horizon == 0 || input.horizon > MAX_FORECAST_HORIZON {
        return Err(AppError::validation(
            "horizon",
            format!("must be between 1 and {}", MAX_FORECAST_HORIZON),
        ));
    }
    if !(input.alpha > 0.0 && input.alpha <= 1.0) {
        return Err(AppError::validation("alpha", "must be in (0, 1]"));
    }
    Ok(())
}

fn smooth(input: &ForecastInput) -> AppResult<ForecastReport> {
    validate_forecast(input)?;

    let alpha = input.alpha;
    let mut level = input.history[0];
    let mut abs_error_sum = 0.0;
    for &observed in &input.history[1..] {
        // one-step-ahead fit is the level before this observation
        abs_error_sum += (observed - level).abs();
        level = alpha * observed + (1.0 - alpha) * level;
    }

    let fitted = input.history.len() - 1;
    Ok(ForecastReport {
        product_id: input.product_id.clone(),
        alpha,
        level,
        forecast: vec![level; input.horizon as usize],
        mean_absolute_error: (fitted > 0).then(|| abs_error_sum / fitted as f64),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::{CacheKey, MemoryStore};
    use crate::config::settings::CacheConfig;
    use crate::models::{AbcItem, DEFAULT_A_THRESHOLD, DEFAULT_B_THRESHOLD};

    fn item(id: &str, units: f64, cost: f64) -> AbcItem {
        AbcItem {
            product_id: id.to_string(),
            annual_units: units,
            unit_cost: cost,
        }
    }

    fn abc_input(items: Vec<AbcItem>) -> AbcInput {
        AbcInput {
            items,
            a_threshold: DEFAULT_A_THRESHOLD,
            b_threshold: DEFAULT_B_THRESHOLD,
        }
    }

    fn forecast_input(history: Vec<f64>) -> ForecastInput {
        ForecastInput {
            product_id: "sku-1".to_string(),
            history,
            horizon: 3,
            alpha: 0.5,
        }
    }

    fn service() -> (AnalyticsService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let cache = TenantCache::new(store.clone(), &CacheConfig::default()).unwrap();
        (AnalyticsService::new(cache), store)
    }

    #[test]
    fn test_classify_orders_and_classes() {
        let report = classify(&abc_input(vec![
            item("c", 10.0, 1.0),
            item("a", 31.0, 2.0),
            item("e", 2.0, 1.0),
            item("b", 20.0, 1.0),
            item("d", 3.0, 2.0),
        ]))
        .unwrap();

        let ids: Vec<&str> = report.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        // share before each item: 0, .62, .82, .92, .98
        let classes: Vec<AbcClass> = report.items.iter().map(|i| i.class).collect();
        assert_eq!(
            classes,
            [AbcClass::A, AbcClass::A, AbcClass::B, AbcClass::B, AbcClass::C]
        );
        assert_eq!(report.total_value, 100.0);
        assert!((report.items[4].cumulative_share - 1.0).abs() < 1e-9);

        let a = &report.classes[0];
        assert_eq!((a.class, a.item_count, a.total_value), (AbcClass::A, 2, 82.0));
        assert_eq!(report.classes[1].item_count, 2);
        assert_eq!(report.classes[2].item_count, 1);
    }

    #[test]
    fn test_classify_breaks_ties_by_product_id() {
        let report = classify(&abc_input(vec![item("z", 1.0, 5.0), item("m", 5.0, 1.0)])).unwrap();
        assert_eq!(report.items[0].product_id, "m");
        assert_eq!(report.items[1].product_id, "z");
    }

    #[test]
    fn test_classify_zero_total_is_all_c() {
        let report = classify(&abc_input(vec![item("a", 0.0, 3.0), item("b", 4.0, 0.0)])).unwrap();
        assert!(report.items.iter().all(|i| i.class == AbcClass::C));
        assert_eq!(report.classes[2].item_count, 2);
    }

    #[test]
    fn test_classify_rejects_bad_input() {
        assert!(classify(&abc_input(vec![])).is_err());
        assert!(classify(&abc_input(vec![item("a", 1.0, 1.0), item("a", 2.0, 1.0)])).is_err());
        assert!(classify(&abc_input(vec![item("a", -1.0, 1.0)])).is_err());

        let mut input = abc_input(vec![item("a", 1.0, 1.0)]);
        input.a_threshold = 0.96;
        match classify(&input).unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "thresholds"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_rejects_unrepresentable_values() {
        let overflowing = abc_input(vec![item("a", 1e200, 1e200), item("b", 1.0, 1.0)]);
        match classify(&overflowing).unwrap_err() {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "items");
                assert!(reason.contains("'a'"));
            }
            other => panic!("unexpected {:?}", other),
        }

        // each value fits, their sum does not
        let summed = abc_input(vec![item("a", 1e300, 1e8), item("b", 1e300, 1e8)]);
        assert!(summed.items.iter().all(|i| i.annual_value().is_finite()));
        assert!(matches!(
            classify(&summed).unwrap_err(),
            AppError::Validation { ref field, .. } if field == "items"
        ));
    }

    #[test]
    fn test_smooth_levels_and_error() {
        let report = smooth(&forecast_input(vec![10.0, 20.0, 10.0])).unwrap();
        // levels: 10 -> 15 -> 12.5; errors: |20-10| + |10-15| = 15 over 2
        assert_eq!(report.level, 12.5);
        assert_eq!(report.forecast, vec![12.5; 3]);
        assert_eq!(report.mean_absolute_error, Some(7.5));
    }

    #[test]
    fn test_smooth_single_observation() {
        let report = smooth(&forecast_input(vec![4.0])).unwrap();
        assert_eq!(report.level, 4.0);
        assert_eq!(report.mean_absolute_error, None);
    }

    #[test]
    fn test_smooth_rejects_bad_input() {
        assert!(smooth(&forecast_input(vec![])).is_err());
        assert!(smooth(&forecast_input(vec![1.0, -2.0])).is_err());

        let mut input = forecast_input(vec![1.0]);
        input.horizon = 53;
        assert!(smooth(&input).is_err());

        let mut input = forecast_input(vec![1.0]);
        input.alpha = 0.0;
        assert!(smooth(&input).is_err());
    }

    #[tokio::test]
    async fn test_abc_analysis_is_cached_per_tenant() {
        let (service, store) = service();
        let input = abc_input(vec![item("a", 1.0, 2.0)]);

        let first = service.abc_analysis("acme", input.clone()).await.unwrap();
        assert_eq!(store.len(), 1);
        let key = CacheKey::secure("acme", "abc", &input).unwrap();
        assert!(service.cache.exists(&key).await);

        let second = service.abc_analysis("acme", input.clone()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);

        service.abc_analysis("globex", input).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_forecast_key_includes_product() {
        let (service, _store) = service();
        let input = forecast_input(vec![3.0, 5.0]);

        service.forecast("acme", "sku-1", input.clone()).await.unwrap();
        let key = CacheKey::with_digest("acme", "forecast", &["sku-1"], &input).unwrap();
        let cached: Option<ForecastReport> = service.cache.get(&key).await;
        assert_eq!(cached.unwrap().level, 4.0);
    }

    #[tokio::test]
    async fn test_invalid_input_is_not_cached() {
        let (service, store) = service();
        let result = service.abc_analysis("acme", abc_input(vec![])).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_tenant_is_rejected() {
        let (service, _store) = service();
        let result = service
            .abc_analysis("bad tenant", abc_input(vec![item("a", 1.0, 1.0)]))
            .await;
        assert!(matches!(result, Err(AppError::Validation { ref field, .. }) if field == "key"));
    }
}
