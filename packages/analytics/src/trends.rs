//! Trend and anomaly summarization over monthly history and predictions.

use chrono::NaiveDate;
use peacewatch_analytics_models::{
    CombinedSeriesPoint, HistoryPoint, PredictionPoint, TrendHeadline, TrendSummary,
};

/// Parses a `YYYY-MM` month label into the first day of that month.
#[must_use]
pub fn parse_month(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", date.trim()), "%Y-%m-%d").ok()
}

/// Sort key that places unparseable dates after every parseable one.
fn chronological_key(date: &str) -> (bool, Option<NaiveDate>) {
    let parsed = parse_month(date);
    (parsed.is_none(), parsed)
}

/// Merges history and prediction into one chart series and derives the
/// headline figures.
///
/// The series is sorted ascending by month; points with equal or
/// unparseable dates keep their input order, history before prediction.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(history: &[HistoryPoint], prediction: &[PredictionPoint]) -> TrendSummary {
    let mut series: Vec<CombinedSeriesPoint> = history
        .iter()
        .map(|point| CombinedSeriesPoint {
            date: point.date.clone(),
            actual: Some(point.count as f64),
            predicted: None,
            lower: None,
            upper: None,
        })
        .chain(prediction.iter().map(|point| CombinedSeriesPoint {
            date: point.date.clone(),
            actual: None,
            predicted: Some(point.predicted),
            lower: Some(point.lower),
            upper: Some(point.upper),
        }))
        .collect();

    let unparseable = series
        .iter()
        .filter(|point| parse_month(&point.date).is_none())
        .count();
    if unparseable > 0 {
        log::warn!("{unparseable} series point(s) have an unparseable month; placing them last");
    }

    series.sort_by_key(|point| chronological_key(&point.date));

    let anomaly_dates = prediction
        .iter()
        .filter(|point| point.anomaly)
        .map(|point| point.date.clone())
        .collect();

    TrendSummary {
        series,
        anomaly_dates,
        headline: headline(history, prediction),
    }
}

fn headline(history: &[HistoryPoint], prediction: &[PredictionPoint]) -> TrendHeadline {
    // `max_by_key` keeps the last of equal keys, `min_by_key` the first.
    let latest = history
        .iter()
        .max_by_key(|point| parse_month(&point.date));
    let next = prediction
        .iter()
        .min_by_key(|point| chronological_key(&point.date));

    let current = latest.map_or(0, |point| point.count);
    let next_predicted = next.map_or(0.0, |point| point.predicted);
    let confidence_pct = next.map_or(0.0, |point| point.confidence * 100.0);

    TrendHeadline {
        current,
        next_predicted,
        percent_change: percent_change(current, next_predicted),
        confidence_pct,
    }
}

/// Percentage change from `current` to `next`. `None` when `current` is
/// zero, since there is no baseline to compare against.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percent_change(current: u64, next: f64) -> Option<f64> {
    if current == 0 {
        return None;
    }
    let current = current as f64;
    Some((next - current) / current * 100.0)
}
