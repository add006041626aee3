//! Incident bucketing by derived keys.
//!
//! Buckets keep the order in which their key was first seen, and incidents
//! keep their input order within a bucket. Incidents whose key function
//! returns `None` are left out entirely.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{Datelike as _, Weekday};
use peacewatch_incident_models::{Incident, IncidentSeverity};

/// Calendar month of an incident report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
}

impl MonthKey {
    /// English month name followed by the year, e.g. `"March 2024"`.
    #[must_use]
    pub fn label(self) -> String {
        let name = chrono::Month::try_from(u8::try_from(self.month).unwrap_or(0))
            .map_or("Unknown month", |m| m.name());
        format!("{name} {}", self.year)
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

/// A single bucket of incidents sharing a key.
#[derive(Debug, Clone)]
pub struct Bucket<'a, K> {
    /// The shared key.
    pub key: K,
    /// Incidents in input order.
    pub incidents: Vec<&'a Incident>,
}

impl<K> Bucket<'_, K> {
    /// Number of incidents in the bucket.
    #[must_use]
    pub fn count(&self) -> usize {
        self.incidents.len()
    }

    /// IDs of the incidents in the bucket, in input order.
    #[must_use]
    pub fn incident_ids(&self) -> Vec<i64> {
        self.incidents.iter().map(|i| i.id).collect()
    }
}

/// Incidents partitioned by key.
#[derive(Debug, Clone)]
pub struct Groups<'a, K> {
    buckets: Vec<Bucket<'a, K>>,
    index: HashMap<K, usize>,
}

impl<'a, K: Eq + Hash + Clone> Groups<'a, K> {
    /// Iterates over buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Bucket<'a, K>> {
        self.buckets.iter()
    }

    /// Returns the bucket for `key`, if any incident produced it.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&Bucket<'a, K>> {
        self.index.get(key).map(|&idx| &self.buckets[idx])
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `true` if no incident produced a key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of incidents placed into any bucket.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.iter().map(Bucket::count).sum()
    }

    /// Arithmetic mean of the bucket sizes. Zero buckets yields `0.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_count(&self) -> f64 {
        self.total() as f64 / self.buckets.len().max(1) as f64
    }
}

/// Partitions `incidents` by the key returned from `key_fn`.
pub fn group<'a, K, F>(incidents: &'a [Incident], key_fn: F) -> Groups<'a, K>
where
    K: Eq + Hash + Clone,
    F: Fn(&Incident) -> Option<K>,
{
    let mut buckets: Vec<Bucket<'a, K>> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for incident in incidents {
        let Some(key) = key_fn(incident) else {
            continue;
        };

        if let Some(&idx) = index.get(&key) {
            buckets[idx].incidents.push(incident);
        } else {
            index.insert(key.clone(), buckets.len());
            buckets.push(Bucket {
                key,
                incidents: vec![incident],
            });
        }
    }

    Groups { buckets, index }
}

/// Month of the report time.
#[must_use]
pub fn month_key(incident: &Incident) -> Option<MonthKey> {
    incident.reported_at.map(|at| MonthKey {
        year: at.year(),
        month: at.month(),
    })
}

/// Day of the week of the report time.
#[must_use]
pub fn weekday_key(incident: &Incident) -> Option<Weekday> {
    incident.reported_at.map(|at| at.weekday())
}

/// Region, verbatim.
#[must_use]
pub fn region_key(incident: &Incident) -> Option<String> {
    incident.region.clone()
}

/// Known severity tier. Unrecognized severity strings are skipped.
#[must_use]
pub fn severity_key(incident: &Incident) -> Option<IncidentSeverity> {
    incident.severity_level()
}

/// Category, verbatim.
#[must_use]
pub fn category_key(incident: &Incident) -> Option<String> {
    incident.category.clone()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;

    fn incident(id: i64, region: Option<&str>) -> Incident {
        Incident {
            id,
            region: region.map(str::to_string),
            ..Incident::default()
        }
    }

    #[test]
    fn skips_missing_keys_and_preserves_order() {
        let incidents = vec![
            incident(1, Some("North")),
            incident(2, None),
            incident(3, Some("South")),
            incident(4, Some("North")),
        ];

        let groups = group(&incidents, region_key);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.total(), 3);

        let keys: Vec<&str> = groups.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["North", "South"]);
        assert_eq!(
            groups.get(&"North".to_string()).unwrap().incident_ids(),
            vec![1, 4]
        );
        assert!(groups.iter().all(|b| !b.incident_ids().contains(&2)));
    }

    #[test]
    fn bucket_sizes_sum_to_keyed_incidents() {
        let incidents: Vec<Incident> = (0..20)
            .map(|id| {
                let region = match id % 4 {
                    0 => None,
                    1 => Some("East"),
                    2 => Some("West"),
                    _ => Some("Central"),
                };
                incident(id, region)
            })
            .collect();

        let keyed = incidents.iter().filter(|i| i.region.is_some()).count();
        let groups = group(&incidents, region_key);

        assert_eq!(groups.total(), keyed);
        assert_eq!(groups.iter().map(Bucket::count).sum::<usize>(), keyed);
    }

    #[test]
    fn empty_input_has_zero_mean() {
        let groups = group(&[], region_key);
        assert!(groups.is_empty());
        assert!(groups.mean_count().abs() < f64::EPSILON);
    }

    #[test]
    fn severity_key_skips_unknown_tiers() {
        let incidents: Vec<Incident> = [Some("high"), Some("High"), Some("severe"), None, Some("high")]
            .into_iter()
            .zip(1..)
            .map(|(severity, id)| Incident {
                id,
                severity: severity.map(str::to_string),
                ..Incident::default()
            })
            .collect();

        let groups = group(&incidents, severity_key);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.get(&IncidentSeverity::High).unwrap().incident_ids(),
            vec![1, 5]
        );
    }

    #[test]
    fn month_and_weekday_keys() {
        let incident = Incident {
            id: 1,
            reported_at: Some(Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()),
            ..Incident::default()
        };

        let month = month_key(&incident).unwrap();
        assert_eq!(month.to_string(), "2024-3");
        assert_eq!(month.label(), "March 2024");
        assert_eq!(weekday_key(&incident), Some(Weekday::Sat));
        assert_eq!(month_key(&Incident::default()), None);
    }
}
