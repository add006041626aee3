//! Significance scoring relative to the mean bucket size.
//!
//! Every function here guards a non-positive mean by returning zero, so a
//! degenerate distribution can never leak `NaN` or infinity into a result.

use peacewatch_analytics_models::Relevance;

/// Scale and cap used to turn a count/mean ratio into a significance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParams {
    /// Multiplier applied to the ratio.
    pub scale: f64,
    /// Upper bound of the score.
    pub cap: u8,
}

/// Month buckets.
pub const MONTH_SCORE: ScoreParams = ScoreParams {
    scale: 60.0,
    cap: 100,
};

/// Weekday buckets.
pub const WEEKDAY_SCORE: ScoreParams = ScoreParams {
    scale: 50.0,
    cap: 90,
};

/// Region buckets.
pub const REGION_SCORE: ScoreParams = ScoreParams {
    scale: 70.0,
    cap: 100,
};

/// Upper bound of category scores.
pub const CATEGORY_SCORE_CAP: u8 = 90;

/// Points awarded per incident in a category bucket.
pub const CATEGORY_POINTS_PER_INCIDENT: usize = 10;

/// Ratio multipliers a bucket must exceed to be reported, and to be
/// reported as high relevance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// `count > mean * include` yields a pattern.
    pub include: f64,
    /// `count > mean * high` yields a high-relevance pattern.
    pub high: f64,
}

impl Thresholds {
    /// Classifies a bucket. Returns `None` when the bucket stays under the
    /// inclusion threshold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn classify(self, count: usize, mean: f64) -> Option<Relevance> {
        if mean <= 0.0 {
            return None;
        }
        let count = count as f64;
        if count > mean * self.high {
            Some(Relevance::High)
        } else if count > mean * self.include {
            Some(Relevance::Medium)
        } else {
            None
        }
    }
}

/// Month buckets: 1.5x mean to report, 2x for high.
pub const MONTH_THRESHOLDS: Thresholds = Thresholds {
    include: 1.5,
    high: 2.0,
};

/// Weekday buckets: 1.3x mean to report, 1.5x for high.
pub const WEEKDAY_THRESHOLDS: Thresholds = Thresholds {
    include: 1.3,
    high: 1.5,
};

/// Region buckets: 1.2x mean to report, 1.5x for high.
pub const REGION_THRESHOLDS: Thresholds = Thresholds {
    include: 1.2,
    high: 1.5,
};

/// `count / mean`, or `0.0` for a non-positive mean.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn ratio(count: usize, mean: f64) -> f64 {
    if mean <= 0.0 {
        0.0
    } else {
        count as f64 / mean
    }
}

/// `min(cap, round(count / mean * scale))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn significance(count: usize, mean: f64, params: ScoreParams) -> u8 {
    let raw = (ratio(count, mean) * params.scale).round();
    raw.clamp(0.0, f64::from(params.cap)) as u8
}

/// `min(90, count * 10)`, independent of the mean.
#[must_use]
pub fn category_significance(count: usize) -> u8 {
    let raw = count.saturating_mul(CATEGORY_POINTS_PER_INCIDENT);
    u8::try_from(raw.min(usize::from(CATEGORY_SCORE_CAP))).unwrap_or(CATEGORY_SCORE_CAP)
}

/// How far `count` sits above `mean`, as a rounded percentage.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn percent_above_mean(count: usize, mean: f64) -> i64 {
    if mean <= 0.0 {
        return 0;
    }
    ((count as f64 - mean) / mean * 100.0).round() as i64
}
