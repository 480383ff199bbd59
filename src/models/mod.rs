mod analytics;

pub use analytics::{
    AbcClass, AbcInput, AbcItem, AbcReport, ClassSummary, ClassifiedItem, DEFAULT_A_THRESHOLD,
    DEFAULT_ALPHA, DEFAULT_B_THRESHOLD, ForecastInput, ForecastReport, MAX_FORECAST_HORIZON,
};
