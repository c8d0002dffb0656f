use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastRange {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalDataSummary {
    pub total_traces: usize,
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    pub workflow_id: String,
    pub expected_queries: u64,
    pub forecast_period_days: u32,

    pub avg_cost_per_query: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_cost_per_query: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cost_per_query: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost_per_query: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,

    pub forecasted_total_cost: f64,
    pub forecasted_daily_cost: f64,
    pub forecasted_monthly_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_range: Option<ForecastRange>,

    pub confidence: Confidence,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_data: Option<HistoricalDataSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyCost {
    pub date: String,
    pub avg_cost: f64,
    pub query_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyCost {
    pub week: String,
    pub avg_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendResult {
    pub workflow_id: String,
    pub period_days: u32,
    pub daily_costs: Vec<DailyCost>,
    pub weekly_costs: Vec<WeeklyCost>,
    pub trend: Trend,
    pub total_queries: usize,
    pub total_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpanTypeBreakdown {
    pub total_cost: f64,
    pub avg_cost: f64,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    pub workflow_id: String,
    pub period_days: u32,
    pub breakdown: HashMap<String, SpanTypeBreakdown>,
    pub total_cost: f64,
    pub total_queries: usize,
}
