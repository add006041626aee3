//! Rule-based pattern detectors.
//!
//! Each detector groups the incidents along one dimension, compares every
//! bucket against the mean bucket size, and emits a pattern for the
//! buckets that stand out. Detectors never fail: a dimension with no
//! qualifying buckets yields an empty list.

use std::collections::HashSet;

use chrono::Weekday;
use peacewatch_analytics_models::{
    ActorPattern, PatternSet, Relevance, SpatialPattern, TemporalPattern,
};
use peacewatch_incident_models::{Incident, IncidentSeverity};

use crate::AnalyticsError;
use crate::grouping::{self, Bucket};
use crate::scoring::{
    self, MONTH_SCORE, MONTH_THRESHOLDS, REGION_SCORE, REGION_THRESHOLDS, WEEKDAY_SCORE,
    WEEKDAY_THRESHOLDS,
};

/// Actor attributed to high-severity incidents.
pub const ORGANIZED_GROUP_ACTOR: &str = "Unknown Organized Group";

/// Fixed significance of the high-severity actor pattern.
pub const ORGANIZED_GROUP_SIGNIFICANCE: u8 = 85;

/// Minimum category bucket size that produces an actor pattern.
pub const MIN_CATEGORY_INCIDENTS: usize = 3;

/// Category buckets larger than this are high relevance.
pub const HIGH_CATEGORY_INCIDENTS: usize = 5;

/// Weekdays in the order their patterns are emitted.
const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Runs all three detectors over `incidents`.
///
/// # Errors
///
/// Returns [`AnalyticsError::DuplicateIncidentId`] if two records share an
/// ID, since pattern membership is reported by ID.
pub fn analyze_incidents(incidents: &[Incident]) -> Result<PatternSet, AnalyticsError> {
    validate_incidents(incidents)?;

    let patterns = PatternSet {
        temporal: detect_temporal_patterns(incidents),
        spatial: detect_spatial_patterns(incidents),
        actor: detect_actor_patterns(incidents),
    };

    log::debug!(
        "Detected {} temporal, {} spatial, {} actor patterns across {} incidents",
        patterns.temporal.len(),
        patterns.spatial.len(),
        patterns.actor.len(),
        incidents.len()
    );

    Ok(patterns)
}

fn validate_incidents(incidents: &[Incident]) -> Result<(), AnalyticsError> {
    let mut seen = HashSet::with_capacity(incidents.len());
    for incident in incidents {
        if !seen.insert(incident.id) {
            return Err(AnalyticsError::DuplicateIncidentId { id: incident.id });
        }
    }
    Ok(())
}

/// Month patterns followed by weekday patterns.
#[must_use]
pub fn detect_temporal_patterns(incidents: &[Incident]) -> Vec<TemporalPattern> {
    let mut patterns = detect_monthly_patterns(incidents);
    patterns.extend(detect_weekday_patterns(incidents));
    patterns
}

/// Months whose incident count exceeds 1.5x the monthly mean.
#[must_use]
pub fn detect_monthly_patterns(incidents: &[Incident]) -> Vec<TemporalPattern> {
    let groups = grouping::group(incidents, grouping::month_key);
    let mean = groups.mean_count();

    groups
        .iter()
        .filter_map(|bucket| {
            let relevance = MONTH_THRESHOLDS.classify(bucket.count(), mean)?;
            let period = bucket.key.label();
            let pct = scoring::percent_above_mean(bucket.count(), mean);

            Some(TemporalPattern {
                name: format!("Activity Spike: {period}"),
                description: format!(
                    "{} incidents reported in {period}, {pct}% above the monthly average",
                    bucket.count()
                ),
                significance: scoring::significance(bucket.count(), mean, MONTH_SCORE),
                relevance,
                period,
                incidents: bucket.incident_ids(),
            })
        })
        .collect()
}

/// Weekdays whose incident count exceeds 1.3x the weekday mean.
#[must_use]
pub fn detect_weekday_patterns(incidents: &[Incident]) -> Vec<TemporalPattern> {
    let groups = grouping::group(incidents, grouping::weekday_key);
    let mean = groups.mean_count();

    WEEKDAY_ORDER
        .iter()
        .filter_map(|day| groups.get(day))
        .filter_map(|bucket| {
            let relevance = WEEKDAY_THRESHOLDS.classify(bucket.count(), mean)?;
            let period = weekday_plural(bucket.key);
            let pct = scoring::percent_above_mean(bucket.count(), mean);

            Some(TemporalPattern {
                name: format!("Recurring {} Activity", weekday_name(bucket.key)),
                description: format!(
                    "{period} account for {} incidents, {pct}% above the average day",
                    bucket.count()
                ),
                significance: scoring::significance(bucket.count(), mean, WEEKDAY_SCORE),
                relevance,
                period,
                incidents: bucket.incident_ids(),
            })
        })
        .collect()
}

/// Regions whose incident count exceeds 1.2x the regional mean.
///
/// Only administrative regions are compared; incidents are not clustered
/// by coordinates.
#[must_use]
pub fn detect_spatial_patterns(incidents: &[Incident]) -> Vec<SpatialPattern> {
    let groups = grouping::group(incidents, grouping::region_key);
    let mean = groups.mean_count();

    groups
        .iter()
        .filter_map(|bucket| {
            let relevance = REGION_THRESHOLDS.classify(bucket.count(), mean)?;
            let pct = scoring::percent_above_mean(bucket.count(), mean);

            Some(SpatialPattern {
                name: format!("Hotspot: {}", bucket.key),
                description: format!(
                    "{} incidents reported in {}, {pct}% above the regional average",
                    bucket.count(),
                    bucket.key
                ),
                significance: scoring::significance(bucket.count(), mean, REGION_SCORE),
                relevance,
                region: bucket.key.clone(),
                incidents: bucket.incident_ids(),
            })
        })
        .collect()
}

/// High-severity activity followed by recurring categories.
#[must_use]
pub fn detect_actor_patterns(incidents: &[Incident]) -> Vec<ActorPattern> {
    let mut patterns = Vec::new();

    let severities = grouping::group(incidents, grouping::severity_key);
    if let Some(bucket) = severities.get(&IncidentSeverity::High)
        && bucket.count() > 0
    {
        patterns.push(ActorPattern {
            name: "Coordinated High-Severity Activity".to_string(),
            description: format!(
                "{} high-severity incidents suggest involvement of an organized group",
                bucket.count()
            ),
            significance: ORGANIZED_GROUP_SIGNIFICANCE,
            relevance: Relevance::High,
            actor: ORGANIZED_GROUP_ACTOR.to_string(),
            incidents: bucket.incident_ids(),
        });
    }

    let categories = grouping::group(incidents, grouping::category_key);
    patterns.extend(
        categories
            .iter()
            .filter(|bucket| bucket.count() >= MIN_CATEGORY_INCIDENTS)
            .map(category_pattern),
    );

    patterns
}

fn category_pattern(bucket: &Bucket<'_, String>) -> ActorPattern {
    let label = humanize_category(&bucket.key);
    let relevance = if bucket.count() > HIGH_CATEGORY_INCIDENTS {
        Relevance::High
    } else {
        Relevance::Medium
    };

    ActorPattern {
        name: format!("{label} Pattern"),
        description: format!(
            "{} {} incidents point to a recurring group of perpetrators",
            bucket.count(),
            label.to_lowercase()
        ),
        significance: scoring::category_significance(bucket.count()),
        relevance,
        actor: format!("{} Perpetrators", bucket.key),
        incidents: bucket.incident_ids(),
    }
}

/// Uppercases the first character and replaces underscores with spaces,
/// e.g. `armed_clash` becomes `Armed clash`.
#[must_use]
pub fn humanize_category(category: &str) -> String {
    let spaced = category.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

const fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn weekday_plural(day: Weekday) -> String {
    format!("{}s", weekday_name(day))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone as _, Utc};

    use super::*;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    /// Builds `count` incidents per month, all in 2024, with IDs starting at
    /// `first_id`. Days cycle through the month so weekdays are spread.
    fn monthly(counts: &[usize], first_id: i64) -> Vec<Incident> {
        let mut id = first_id;
        let mut incidents = Vec::new();
        for (offset, &count) in counts.iter().enumerate() {
            let month = u32::try_from(offset).unwrap() + 1;
            for n in 0..count {
                let day = u32::try_from(n % 28).unwrap() + 1;
                incidents.push(Incident {
                    id,
                    reported_at: Some(at(2024, month, day)),
                    ..Incident::default()
                });
                id += 1;
            }
        }
        incidents
    }

    /// Builds incidents on the given days of March 2024, `count` per day.
    /// Saturdays are the 2nd, 9th and 16th; Monday to Thursday are the 4th
    /// to the 7th.
    fn on_days(days: &[(u32, usize)]) -> Vec<Incident> {
        let mut id = 0;
        let mut incidents = Vec::new();
        for &(day, count) in days {
            for _ in 0..count {
                incidents.push(Incident {
                    id,
                    reported_at: Some(at(2024, 3, day)),
                    ..Incident::default()
                });
                id += 1;
            }
        }
        incidents
    }

    fn in_regions(regions: &[(&str, usize)]) -> Vec<Incident> {
        let mut id = 0;
        let mut incidents = Vec::new();
        for &(region, count) in regions {
            for _ in 0..count {
                incidents.push(Incident {
                    id,
                    region: Some(region.to_string()),
                    ..Incident::default()
                });
                id += 1;
            }
        }
        incidents
    }

    fn with_category(id: i64, category: &str) -> Incident {
        Incident {
            id,
            category: Some(category.to_string()),
            ..Incident::default()
        }
    }

    fn with_severity(id: i64, severity: &str) -> Incident {
        Incident {
            id,
            severity: Some(severity.to_string()),
            ..Incident::default()
        }
    }

    #[test]
    fn month_spike_is_high_and_capped() {
        let incidents = monthly(&[10, 10, 10, 10, 31], 1);
        let patterns = detect_monthly_patterns(&incidents);

        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.period, "May 2024");
        assert_eq!(pattern.relevance, Relevance::High);
        assert_eq!(pattern.significance, 100);
        assert_eq!(pattern.incidents.len(), 31);
        assert!(pattern.description.contains("31 incidents"));
        assert!(pattern.description.contains("118%"));
    }

    #[test]
    fn uniform_months_produce_nothing() {
        let incidents = monthly(&[10, 10, 10, 10], 1);
        assert!(detect_monthly_patterns(&incidents).is_empty());
    }

    #[test]
    fn two_month_scenario() {
        let incidents = monthly(&[2, 10], 1);
        assert_eq!(incidents.len(), 12);

        let patterns = detect_monthly_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].period, "February 2024");
        assert_eq!(patterns[0].significance, 100);
        // 10 is not above 2x the mean of 6.
        assert_eq!(patterns[0].relevance, Relevance::Medium);
        assert_eq!(patterns[0].incidents, (3..=12).collect::<Vec<i64>>());
    }

    #[test]
    fn weekday_spike_is_pluralized() {
        // 2024-03-02 and 2024-03-09 are Saturdays; 2024-03-04 is a Monday;
        // 2024-03-05 is a Tuesday.
        let mut incidents = Vec::new();
        for id in 0..4 {
            incidents.push(Incident {
                id,
                reported_at: Some(at(2024, 3, if id % 2 == 0 { 2 } else { 9 })),
                ..Incident::default()
            });
        }
        incidents.push(Incident {
            id: 10,
            reported_at: Some(at(2024, 3, 4)),
            ..Incident::default()
        });
        incidents.push(Incident {
            id: 11,
            reported_at: Some(at(2024, 3, 5)),
            ..Incident::default()
        });

        // Buckets: Sat=4, Mon=1, Tue=1 -> mean 2.
        let patterns = detect_weekday_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].period, "Saturdays");
        assert_eq!(patterns[0].relevance, Relevance::High);
        // 4 / 2 * 50 = 100 -> capped at 90
        assert_eq!(patterns[0].significance, 90);
        assert_eq!(patterns[0].incidents, vec![0, 1, 2, 3]);
    }

    #[test]
    fn moderate_weekday_excess_is_medium() {
        // Sat=6, Mon..Thu=4 -> mean 4.4; 6 > 5.72 but not above 6.6.
        let incidents = on_days(&[(9, 6), (4, 4), (5, 4), (6, 4), (7, 4)]);

        let patterns = detect_weekday_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].period, "Saturdays");
        assert_eq!(patterns[0].relevance, Relevance::Medium);
        // 6 / 4.4 * 50 = 68.18
        assert_eq!(patterns[0].significance, 68);
        assert!(patterns[0].description.contains("36% above"));
        assert_eq!(patterns[0].incidents, (0..6).collect::<Vec<i64>>());
    }

    #[test]
    fn weekday_at_exactly_inclusion_ratio_is_excluded() {
        // Sat=13, Mon=7 -> mean 10; 13 is not strictly above 13.
        let incidents = on_days(&[(2, 13), (4, 7)]);
        assert!(detect_weekday_patterns(&incidents).is_empty());

        let incidents = on_days(&[(2, 14), (4, 7)]);
        assert_eq!(detect_weekday_patterns(&incidents).len(), 1);
    }

    #[test]
    fn weekday_patterns_follow_month_patterns() {
        let mut incidents = monthly(&[1, 1, 1, 9], 100);
        // Concentrate extra weight on one weekday in a separate month.
        for id in 0..6 {
            incidents.push(Incident {
                id,
                reported_at: Some(at(2023, 6, 3)),
                ..Incident::default()
            });
        }

        let temporal = detect_temporal_patterns(&incidents);
        let monthly_count = detect_monthly_patterns(&incidents).len();
        let weekday_count = detect_weekday_patterns(&incidents).len();

        assert_eq!(temporal.len(), monthly_count + weekday_count);
        assert!(monthly_count > 0);
        assert!(weekday_count > 0);
        assert!(
            temporal[monthly_count..]
                .iter()
                .all(|p| p.period.ends_with("days"))
        );
    }

    #[test]
    fn spatial_threshold_and_relevance() {
        let mut incidents = Vec::new();
        let mut id = 0;
        for (region, count) in [("North", 6), ("South", 3), ("East", 3)] {
            for _ in 0..count {
                incidents.push(Incident {
                    id,
                    region: Some(region.to_string()),
                    ..Incident::default()
                });
                id += 1;
            }
        }
        // Region without a name is ignored.
        incidents.push(Incident {
            id: 99,
            ..Incident::default()
        });

        // mean = 4; North = 6 > 4.8 and 6 == 4 * 1.5 is not high.
        let patterns = detect_spatial_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].region, "North");
        assert_eq!(patterns[0].relevance, Relevance::Medium);
        // 6 / 4 * 70 = 105 -> capped at 100
        assert_eq!(patterns[0].significance, 100);
        assert!(!patterns[0].incidents.contains(&99));
    }

    #[test]
    fn dominant_region_is_high() {
        // mean = 4; North = 8 > 6.
        let incidents = in_regions(&[("North", 8), ("South", 2), ("East", 2)]);

        let patterns = detect_spatial_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].region, "North");
        assert_eq!(patterns[0].relevance, Relevance::High);
        // 8 / 4 * 70 = 140 -> capped at 100
        assert_eq!(patterns[0].significance, 100);
        assert_eq!(patterns[0].name, "Hotspot: North");
        assert_eq!(patterns[0].incidents, (0..8).collect::<Vec<i64>>());
    }

    #[test]
    fn region_at_exactly_inclusion_ratio_is_excluded() {
        // mean = 5; North = 6 is not strictly above 6.
        let incidents = in_regions(&[("North", 6), ("South", 4)]);
        assert!(detect_spatial_patterns(&incidents).is_empty());

        let incidents = in_regions(&[("North", 7), ("South", 4)]);
        let patterns = detect_spatial_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].relevance, Relevance::Medium);
    }

    #[test]
    fn single_high_severity_pattern_regardless_of_count() {
        for high_count in [1, 4, 25] {
            let mut incidents: Vec<Incident> =
                (0..high_count).map(|id| with_severity(id, "high")).collect();
            incidents.push(with_severity(1000, "low"));

            let patterns = detect_actor_patterns(&incidents);
            let organized: Vec<&ActorPattern> = patterns
                .iter()
                .filter(|p| p.actor == ORGANIZED_GROUP_ACTOR)
                .collect();

            assert_eq!(organized.len(), 1);
            assert_eq!(organized[0].significance, 85);
            assert_eq!(organized[0].relevance, Relevance::High);
            assert_eq!(organized[0].incidents.len(), usize::try_from(high_count).unwrap());
            assert_eq!(patterns[0].actor, ORGANIZED_GROUP_ACTOR);
        }
    }

    #[test]
    fn no_high_severity_no_organized_pattern() {
        let incidents = vec![with_severity(1, "medium"), with_severity(2, "High")];
        assert!(detect_actor_patterns(&incidents).is_empty());
    }

    #[test]
    fn category_needs_three_incidents() {
        let mut incidents: Vec<Incident> =
            (0..3).map(|id| with_category(id, "armed_clash")).collect();
        incidents.extend((10..12).map(|id| with_category(id, "protest")));

        let patterns = detect_actor_patterns(&incidents);
        assert_eq!(patterns.len(), 1);
        let pattern = &patterns[0];
        assert_eq!(pattern.actor, "armed_clash Perpetrators");
        assert_eq!(pattern.name, "Armed clash Pattern");
        assert_eq!(pattern.significance, 30);
        assert_eq!(pattern.relevance, Relevance::Medium);
        assert_eq!(pattern.incidents, vec![0, 1, 2]);
    }

    #[test]
    fn large_category_is_high() {
        let incidents: Vec<Incident> = (0..6).map(|id| with_category(id, "looting")).collect();
        let patterns = detect_actor_patterns(&incidents);
        assert_eq!(patterns[0].relevance, Relevance::High);
        assert_eq!(patterns[0].significance, 60);
    }

    #[test]
    fn severity_pattern_precedes_categories() {
        let mut incidents: Vec<Incident> =
            (0..4).map(|id| with_category(id, "kidnapping")).collect();
        incidents.push(Incident {
            id: 50,
            severity: Some("high".to_string()),
            category: Some("kidnapping".to_string()),
            ..Incident::default()
        });

        let patterns = detect_actor_patterns(&incidents);
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].actor, ORGANIZED_GROUP_ACTOR);
        assert_eq!(patterns[1].actor, "kidnapping Perpetrators");
        assert_eq!(patterns[1].incidents.len(), 5);
    }

    #[test]
    fn empty_input_yields_empty_set() {
        let patterns = analyze_incidents(&[]).unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let incidents = vec![with_category(1, "a"), with_category(1, "b")];
        assert!(matches!(
            analyze_incidents(&incidents),
            Err(AnalyticsError::DuplicateIncidentId { id: 1 })
        ));
    }

    #[test]
    fn pattern_incidents_are_subsets_of_input() {
        let mut incidents = monthly(&[1, 2, 12], 1);
        for (n, incident) in incidents.iter_mut().enumerate() {
            incident.region = Some(if n % 3 == 0 { "A" } else { "B" }.to_string());
            incident.category = Some("raid".to_string());
            incident.severity = Some("high".to_string());
        }
        let ids: HashSet<i64> = incidents.iter().map(|i| i.id).collect();

        let patterns = analyze_incidents(&incidents).unwrap();
        assert!(!patterns.is_empty());

        let all = patterns
            .temporal
            .iter()
            .map(|p| &p.incidents)
            .chain(patterns.spatial.iter().map(|p| &p.incidents))
            .chain(patterns.actor.iter().map(|p| &p.incidents));
        for members in all {
            assert!(!members.is_empty());
            assert!(members.iter().all(|id| ids.contains(id)));
        }
    }

    #[test]
    fn humanizes_categories() {
        assert_eq!(humanize_category("armed_clash"), "Armed clash");
        assert_eq!(humanize_category("protest"), "Protest");
        assert_eq!(humanize_category(""), "");
    }
}
