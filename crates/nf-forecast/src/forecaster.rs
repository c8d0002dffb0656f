//! Cost forecaster (§4.10), near-verbatim generalization of
//! `examples/original_source/backend/core/cost_forecasting.py`'s
//! `CostForecaster`.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, Utc};
use nf_domain::Trace;

use crate::stats::{mean, median, percentile_bounds, stdev};
use crate::trace_source::TraceSource;
use crate::types::{
    Confidence, CostBreakdown, DailyCost, ForecastRange, ForecastResult, HistoricalDataSummary, SpanTypeBreakdown,
    Trend, TrendResult, WeeklyCost,
};

/// Traces older than this are never considered by `forecast_cost`,
/// independent of the caller's `days` forecast-period argument (which only
/// scales the daily/monthly projection). Matches the original's default
/// lookback window.
const HISTORICAL_LOOKBACK_DAYS: i64 = 90;
const HISTORICAL_TRACE_CAP: usize = 1000;

pub struct CostForecaster<S: TraceSource> {
    source: S,
}

impl<S: TraceSource> CostForecaster<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    fn historical_traces(&self, workflow_id: &str, lookback_days: i64) -> Vec<Trace> {
        let traces = self.source.list_traces(workflow_id, HISTORICAL_TRACE_CAP);
        if lookback_days <= 0 {
            return traces;
        }
        let cutoff = Utc::now() - Duration::days(lookback_days);
        traces.into_iter().filter(|t| t.started_at >= cutoff).collect()
    }

    /// Forecasts cost for `expected_queries` over `days`, using up to the
    /// last 90 days of history (§4.10).
    pub fn forecast_cost(&self, workflow_id: &str, expected_queries: u64, days: u32, user: Option<&str>) -> ForecastResult {
        if user.is_some() {
            tracing::debug!("forecast_cost: per-user filtering is not supported, traces carry no user field");
        }

        let traces = self.historical_traces(workflow_id, HISTORICAL_LOOKBACK_DAYS);
        if traces.is_empty() {
            return empty_forecast(workflow_id, expected_queries, days, 0, "no historical data available");
        }

        let costs: Vec<f64> = traces.iter().map(|t| t.total_cost).filter(|c| *c != 0.0).collect();
        if costs.is_empty() {
            return empty_forecast(workflow_id, expected_queries, days, traces.len(), "no cost data in historical traces");
        }

        let avg_cost = mean(&costs);
        let median_cost = median(&costs);
        let min_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_cost = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = stdev(&costs);

        let forecasted_total = avg_cost * expected_queries as f64;
        let forecasted_daily = if days > 0 { forecasted_total / days as f64 } else { 0.0 };
        let forecasted_monthly = forecasted_daily * 30.0;

        let confidence = calculate_confidence(costs.len(), std_dev, avg_cost);

        let mut sorted_costs = costs.clone();
        sorted_costs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let (p25, p75) = percentile_bounds(&sorted_costs, median_cost);

        let oldest = traces.iter().map(|t| t.started_at).min().unwrap();
        let newest = traces.iter().map(|t| t.started_at).max().unwrap();

        ForecastResult {
            workflow_id: workflow_id.to_string(),
            expected_queries,
            forecast_period_days: days,
            avg_cost_per_query: avg_cost,
            median_cost_per_query: Some(median_cost),
            min_cost_per_query: Some(min_cost),
            max_cost_per_query: Some(max_cost),
            std_dev: Some(std_dev),
            forecasted_total_cost: forecasted_total,
            forecasted_daily_cost: forecasted_daily,
            forecasted_monthly_cost: forecasted_monthly,
            forecast_range: Some(ForecastRange {
                p25: p25 * expected_queries as f64,
                p50: median_cost * expected_queries as f64,
                p75: p75 * expected_queries as f64,
            }),
            confidence,
            sample_size: costs.len(),
            historical_data: Some(HistoricalDataSummary {
                total_traces: traces.len(),
                oldest,
                newest,
            }),
            message: None,
        }
    }

    /// Buckets trace cost by calendar day, then by the Monday that opens
    /// each day's week, and classifies the week-over-week trend (§4.10).
    pub fn analyze_cost_trends(&self, workflow_id: &str, days: u32) -> TrendResult {
        let traces = self.historical_traces(workflow_id, days as i64);
        if traces.is_empty() {
            return TrendResult {
                workflow_id: workflow_id.to_string(),
                period_days: days,
                daily_costs: Vec::new(),
                weekly_costs: Vec::new(),
                trend: Trend::InsufficientData,
                total_queries: 0,
                total_cost: 0.0,
                message: Some("no historical data available".into()),
            };
        }

        let mut by_day: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for trace in &traces {
            if trace.total_cost != 0.0 {
                by_day.entry(trace.started_at.format("%Y-%m-%d").to_string()).or_default().push(trace.total_cost);
            }
        }
        let daily_avg: BTreeMap<String, f64> = by_day.iter().map(|(date, costs)| (date.clone(), mean(costs))).collect();

        let mut by_week: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (date, cost) in &daily_avg {
            let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("bucket key is always a valid date");
            let week_start = parsed - Duration::days(parsed.weekday().num_days_from_monday() as i64);
            by_week.entry(week_start.format("%Y-%m-%d").to_string()).or_default().push(*cost);
        }
        let weekly_avg: Vec<WeeklyCost> = by_week
            .into_iter()
            .map(|(week, costs)| WeeklyCost { week, avg_cost: mean(&costs) })
            .collect();

        let trend = classify_trend(&daily_avg);

        let daily_costs: Vec<DailyCost> = daily_avg
            .iter()
            .map(|(date, cost)| DailyCost {
                date: date.clone(),
                avg_cost: *cost,
                query_count: by_day[date].len(),
            })
            .collect();

        TrendResult {
            workflow_id: workflow_id.to_string(),
            period_days: days,
            daily_costs,
            weekly_costs: weekly_avg,
            trend,
            total_queries: traces.len(),
            total_cost: traces.iter().map(|t| t.total_cost).sum(),
            message: None,
        }
    }

    /// Groups every span's cost by `span_type` across the window's traces
    /// (§4.10). Only spans with cost > 0 contribute to the average/count.
    pub fn get_cost_breakdown(&self, workflow_id: &str, days: u32) -> CostBreakdown {
        let traces = self.historical_traces(workflow_id, days as i64);
        let total_cost: f64 = traces.iter().map(|t| t.total_cost).sum();

        let mut by_type: HashMap<String, Vec<f64>> = HashMap::new();
        for trace in &traces {
            for span in trace.spans.values() {
                if span.cost > 0.0 {
                    by_type.entry(span_type_key(span.span_type)).or_default().push(span.cost);
                }
            }
        }

        let breakdown = by_type
            .into_iter()
            .map(|(span_type, costs)| {
                let type_total: f64 = costs.iter().sum();
                let percentage = if total_cost > 0.0 { type_total / total_cost * 100.0 } else { 0.0 };
                (
                    span_type,
                    SpanTypeBreakdown {
                        total_cost: type_total,
                        avg_cost: mean(&costs),
                        count: costs.len(),
                        percentage,
                    },
                )
            })
            .collect();

        CostBreakdown {
            workflow_id: workflow_id.to_string(),
            period_days: days,
            breakdown,
            total_cost,
            total_queries: traces.len(),
        }
    }
}

fn span_type_key(span_type: nf_domain::SpanType) -> String {
    serde_json::to_value(span_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn calculate_confidence(sample_size: usize, std_dev: f64, avg_cost: f64) -> Confidence {
    let cv = if avg_cost > 0.0 { std_dev / avg_cost } else { f64::INFINITY };
    if sample_size < 10 {
        Confidence::Low
    } else if sample_size < 50 {
        Confidence::Medium
    } else if sample_size < 100 {
        if cv > 0.5 {
            Confidence::Medium
        } else {
            Confidence::High
        }
    } else if cv > 0.3 {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// Compares the mean of the most recent 7 daily buckets to the preceding 7;
/// fewer than 14 buckets of data is `insufficient_data` (§4.10).
fn classify_trend(daily_avg: &BTreeMap<String, f64>) -> Trend {
    if daily_avg.len() < 14 {
        return Trend::InsufficientData;
    }
    let values: Vec<f64> = daily_avg.values().copied().collect();
    let n = values.len();
    let recent = &values[n - 7..];
    let older = &values[n - 14..n - 7];
    let recent_avg = mean(recent);
    let older_avg = mean(older);

    if recent_avg > older_avg * 1.1 {
        Trend::Increasing
    } else if recent_avg < older_avg * 0.9 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn empty_forecast(workflow_id: &str, expected_queries: u64, days: u32, sample_size: usize, message: &str) -> ForecastResult {
    ForecastResult {
        workflow_id: workflow_id.to_string(),
        expected_queries,
        forecast_period_days: days,
        avg_cost_per_query: 0.0,
        median_cost_per_query: None,
        min_cost_per_query: None,
        max_cost_per_query: None,
        std_dev: None,
        forecasted_total_cost: 0.0,
        forecasted_daily_cost: 0.0,
        forecasted_monthly_cost: 0.0,
        forecast_range: None,
        confidence: Confidence::None,
        sample_size,
        historical_data: None,
        message: Some(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_source::tests::FixedTraceSource;
    use chrono::Duration as ChronoDuration;
    use nf_domain::TraceStatus;
    use std::collections::HashMap as StdHashMap;
    use uuid::Uuid;

    fn trace_with_cost(workflow_id: &str, cost: f64, age_days: i64) -> Trace {
        let mut trace = Trace::new(workflow_id, Uuid::new_v4(), None);
        trace.total_cost = cost;
        trace.started_at = Utc::now() - ChronoDuration::days(age_days);
        trace.status = TraceStatus::Completed;
        trace
    }

    fn source_with(workflow_id: &str, traces: Vec<Trace>) -> FixedTraceSource {
        let mut map = StdHashMap::new();
        map.insert(workflow_id.to_string(), traces);
        FixedTraceSource { traces: map }
    }

    #[test]
    fn forecast_with_no_history_has_zero_confidence() {
        let forecaster = CostForecaster::new(source_with("wf-1", vec![]));
        let result = forecaster.forecast_cost("wf-1", 100, 30, None);
        assert_eq!(result.confidence, Confidence::None);
        assert_eq!(result.forecasted_total_cost, 0.0);
    }

    #[test]
    fn forecast_scales_by_expected_queries() {
        let traces: Vec<Trace> = (0..20).map(|i| trace_with_cost("wf-1", 0.02, i)).collect();
        let forecaster = CostForecaster::new(source_with("wf-1", traces));
        let result = forecaster.forecast_cost("wf-1", 1000, 30, None);
        assert!((result.avg_cost_per_query - 0.02).abs() < 1e-9);
        assert!((result.forecasted_total_cost - 20.0).abs() < 1e-9);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn forecast_confidence_upgrades_with_sample_size_and_low_variance() {
        let traces: Vec<Trace> = (0..120).map(|i| trace_with_cost("wf-1", 0.01, i % 80)).collect();
        let forecaster = CostForecaster::new(source_with("wf-1", traces));
        let result = forecaster.forecast_cost("wf-1", 10, 30, None);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn traces_older_than_lookback_are_excluded() {
        let mut traces: Vec<Trace> = (0..15).map(|i| trace_with_cost("wf-1", 0.05, i)).collect();
        traces.push(trace_with_cost("wf-1", 99.0, 365));
        let forecaster = CostForecaster::new(source_with("wf-1", traces));
        let result = forecaster.forecast_cost("wf-1", 1, 30, None);
        assert!((result.max_cost_per_query.unwrap() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn trend_requires_fourteen_days_of_buckets() {
        let traces: Vec<Trace> = (0..10).map(|i| trace_with_cost("wf-1", 0.01, i)).collect();
        let forecaster = CostForecaster::new(source_with("wf-1", traces));
        let result = forecaster.analyze_cost_trends("wf-1", 30);
        assert_eq!(result.trend, Trend::InsufficientData);
    }

    #[test]
    fn trend_detects_increasing_cost() {
        let mut traces = Vec::new();
        for day in 0..7 {
            traces.push(trace_with_cost("wf-1", 0.01, day));
        }
        for day in 7..14 {
            traces.push(trace_with_cost("wf-1", 0.05, day));
        }
        let forecaster = CostForecaster::new(source_with("wf-1", traces));
        let result = forecaster.analyze_cost_trends("wf-1", 30);
        assert_eq!(result.trend, Trend::Increasing);
    }

    #[test]
    fn cost_breakdown_groups_by_span_type_and_computes_percentage() {
        let mut trace = trace_with_cost("wf-1", 1.0, 0);
        let mut llm_span = nf_domain::Span::new(trace.trace_id, None, nf_domain::SpanType::Llm);
        llm_span.cost = 0.7;
        let mut embed_span = nf_domain::Span::new(trace.trace_id, None, nf_domain::SpanType::Embedding);
        embed_span.cost = 0.3;
        trace.add_span(llm_span).unwrap();
        trace.add_span(embed_span).unwrap();

        let forecaster = CostForecaster::new(source_with("wf-1", vec![trace]));
        let breakdown = forecaster.get_cost_breakdown("wf-1", 30);
        assert_eq!(breakdown.breakdown.len(), 2);
        let llm = &breakdown.breakdown["llm"];
        assert!((llm.percentage - 70.0).abs() < 1e-6);
    }
}
