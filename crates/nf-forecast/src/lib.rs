pub mod forecaster;
pub mod stats;
pub mod trace_source;
pub mod types;

pub use forecaster::CostForecaster;
pub use trace_source::TraceSource;
pub use types::{
    Confidence, CostBreakdown, DailyCost, ForecastRange, ForecastResult, HistoricalDataSummary, SpanTypeBreakdown,
    Trend, TrendResult, WeeklyCost,
};
