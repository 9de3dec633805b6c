//! Monthly aggregation with category-dependent metrics.
//!
//! Activities are bucketed into 12 calendar-month slots by the month
//! component of their start date alone, so multi-year data collapses into a
//! seasonal view. Which quantity is summed depends on the selected category,
//! driven by a declarative rule table rather than scattered string matching.

use chrono::Datelike;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::store::ActivityStore;
use crate::{Bounds, Selection};

/// Which per-activity quantity a monthly series sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// One per activity.
    Count,
    /// Elevation gain in meters.
    ElevationGain,
    /// Distance, displayed in kilometers.
    Distance,
    /// Moving time, displayed in hours.
    MovingTime,
}

/// One row of the metric policy: which categories it covers, what to sum,
/// and how the summed value is scaled for display.
struct MetricRule {
    categories: &'static [&'static str],
    metric: MetricKind,
    divisor: f64,
    label: &'static str,
}

static METRIC_RULES: &[MetricRule] = &[
    MetricRule {
        categories: &["Ride", "Hike", "GravelRide"],
        metric: MetricKind::ElevationGain,
        divisor: 1.0,
        label: "Elevation Gained (m)",
    },
    MetricRule {
        categories: &["Run", "Walk"],
        metric: MetricKind::Distance,
        divisor: 1000.0,
        label: "Distance (km)",
    },
    MetricRule {
        categories: &["StandUpPaddling", "Snowboard"],
        metric: MetricKind::MovingTime,
        divisor: 3600.0,
        label: "Moving Time (hours)",
    },
];

static RULE_BY_CATEGORY: Lazy<HashMap<&'static str, &'static MetricRule>> = Lazy::new(|| {
    METRIC_RULES
        .iter()
        .flat_map(|rule| rule.categories.iter().map(move |name| (*name, rule)))
        .collect()
});

/// Resolve the metric, display divisor and series label for a selection.
///
/// Categories without a dedicated rule fall back to the count metric with a
/// label naming the category, so an unfamiliar sport still charts something
/// instead of an all-zero series.
fn resolve_metric(selection: &Selection) -> (MetricKind, f64, String) {
    match selection {
        Selection::All => (MetricKind::Count, 1.0, "Activity Frequency".to_string()),
        Selection::Category(name) => match RULE_BY_CATEGORY.get(name.as_str()) {
            Some(rule) => (rule.metric, rule.divisor, rule.label.to_string()),
            None => (
                MetricKind::Count,
                1.0,
                format!("{name} Activity Frequency"),
            ),
        },
    }
}

/// A 12-slot monthly series, January at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub label: String,
    pub buckets: [f64; 12],
}

impl MonthlySeries {
    /// Sum over all 12 buckets.
    pub fn total(&self) -> f64 {
        self.buckets.iter().sum()
    }
}

/// Compute the monthly series for a selection, optionally restricted to
/// activities whose bounding box intersects `viewport`.
///
/// Activities without a start date never contribute. Display scaling
/// (meters to km, seconds to hours) is applied per the rule table.
pub fn compute_monthly(
    store: &ActivityStore,
    selection: &Selection,
    viewport: Option<&Bounds>,
) -> MonthlySeries {
    let (metric, divisor, label) = resolve_metric(selection);
    let visible = viewport.map(|vp| store.visible_in(vp));

    let mut buckets = [0.0f64; 12];
    for (category, activities) in store.entries(selection) {
        for (position, activity) in activities.iter().enumerate() {
            if let Some(visible) = &visible {
                if !visible.contains(&(category, position)) {
                    continue;
                }
            }
            let Some(date) = activity.date else {
                continue;
            };
            let value = match metric {
                MetricKind::Count => 1.0,
                MetricKind::ElevationGain => activity.elevation_gain,
                MetricKind::Distance => activity.distance,
                MetricKind::MovingTime => activity.moving_time,
            };
            buckets[date.month0() as usize] += value / divisor;
        }
    }

    MonthlySeries { label, buckets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Activity;
    use crate::GpsPoint;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn activity(
        category: &str,
        date: Option<chrono::NaiveDateTime>,
        elevation: f64,
        distance: f64,
        moving_time: f64,
    ) -> Activity {
        let points = vec![GpsPoint::new(51.5, -0.1), GpsPoint::new(51.51, -0.11)];
        Activity::new(category, points, date, elevation, distance, moving_time).unwrap()
    }

    #[test]
    fn test_all_selection_counts_activities() {
        let mut store = ActivityStore::new();
        store.append(activity("Ride", Some(date(2024, 3, 1)), 500.0, 0.0, 0.0));
        store.append(activity("Run", Some(date(2024, 3, 15)), 0.0, 5000.0, 0.0));
        store.append(activity("Run", Some(date(2023, 7, 2)), 0.0, 3000.0, 0.0));

        let series = compute_monthly(&store, &Selection::All, None);
        assert_eq!(series.label, "Activity Frequency");
        assert_eq!(series.buckets[2], 2.0); // March
        assert_eq!(series.buckets[6], 1.0); // July
        assert_eq!(series.total(), 3.0);
    }

    #[test]
    fn test_run_distance_in_km() {
        let mut store = ActivityStore::new();
        store.append(activity("Run", Some(date(2024, 3, 1)), 0.0, 5000.0, 0.0));
        store.append(activity("Run", Some(date(2023, 3, 20)), 0.0, 3000.0, 0.0));

        let series = compute_monthly(&store, &Selection::Category("Run".to_string()), None);
        assert_eq!(series.label, "Distance (km)");
        // Different years collapse into the same seasonal bucket.
        assert!((series.buckets[2] - 8.0).abs() < 1e-9);
        for (month, value) in series.buckets.iter().enumerate() {
            if month != 2 {
                assert_eq!(*value, 0.0);
            }
        }
    }

    #[test]
    fn test_ride_sums_elevation() {
        let mut store = ActivityStore::new();
        store.append(activity("Ride", Some(date(2024, 6, 1)), 850.0, 40000.0, 0.0));

        let series = compute_monthly(&store, &Selection::Category("Ride".to_string()), None);
        assert_eq!(series.label, "Elevation Gained (m)");
        assert!((series.buckets[5] - 850.0).abs() < 1e-9);
    }

    #[test]
    fn test_snowboard_moving_time_in_hours() {
        let mut store = ActivityStore::new();
        store.append(activity(
            "Snowboard",
            Some(date(2024, 1, 10)),
            0.0,
            0.0,
            7200.0,
        ));

        let series = compute_monthly(&store, &Selection::Category("Snowboard".to_string()), None);
        assert_eq!(series.label, "Moving Time (hours)");
        assert!((series.buckets[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_category_falls_back_to_count() {
        let mut store = ActivityStore::new();
        store.append(activity("Kayaking", Some(date(2024, 5, 4)), 0.0, 9000.0, 0.0));

        let series = compute_monthly(&store, &Selection::Category("Kayaking".to_string()), None);
        assert_eq!(series.label, "Kayaking Activity Frequency");
        assert_eq!(series.buckets[4], 1.0);
        assert_eq!(series.total(), 1.0);
    }

    #[test]
    fn test_dateless_activity_never_contributes() {
        let mut store = ActivityStore::new();
        store.append(activity("Run", None, 0.0, 5000.0, 0.0));

        let series = compute_monthly(&store, &Selection::Category("Run".to_string()), None);
        assert_eq!(series.total(), 0.0);
    }

    #[test]
    fn test_viewport_filter_is_a_subset() {
        let mut store = ActivityStore::new();
        store.append(activity("Run", Some(date(2024, 3, 1)), 0.0, 5000.0, 0.0));
        // Activity far away from the first one.
        let far = Activity::new(
            "Run",
            vec![GpsPoint::new(-33.9, 151.2), GpsPoint::new(-33.89, 151.21)],
            Some(date(2024, 3, 2)),
            0.0,
            3000.0,
            0.0,
        )
        .unwrap();
        store.append(far);

        let selection = Selection::Category("Run".to_string());
        let unfiltered = compute_monthly(&store, &selection, None);

        let london = Bounds {
            min_lat: 51.0,
            max_lat: 52.0,
            min_lng: -1.0,
            max_lng: 0.5,
        };
        let filtered = compute_monthly(&store, &selection, Some(&london));

        for month in 0..12 {
            assert!(filtered.buckets[month] <= unfiltered.buckets[month] + 1e-9);
        }
        assert!((filtered.buckets[2] - 5.0).abs() < 1e-9);
        assert!((unfiltered.buckets[2] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_viewport_empties_series() {
        let mut store = ActivityStore::new();
        store.append(activity("Run", Some(date(2024, 3, 1)), 0.0, 5000.0, 0.0));

        let nowhere = Bounds {
            min_lat: 10.0,
            max_lat: 11.0,
            min_lng: 10.0,
            max_lng: 11.0,
        };
        let series = compute_monthly(
            &store,
            &Selection::Category("Run".to_string()),
            Some(&nowhere),
        );
        assert_eq!(series.total(), 0.0);
    }
}
