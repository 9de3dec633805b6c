//! Caller-owned store of ingested activities, grouped by category.
//!
//! The store accumulates across repeated ingestions; nothing is ever
//! replaced implicitly. Callers wanting "upload replaces the view" call
//! [`ActivityStore::clear`] first. An R-tree over per-activity bounding
//! boxes backs the viewport filter used by monthly aggregation.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDateTime;
use rstar::{RTree, RTreeObject, AABB};

use crate::{Bounds, GpsPoint, Selection};

/// One ingested activity: decoded geometry plus the metrics the monthly
/// aggregate needs. Immutable once created.
///
/// `date` is `None` when the source row had no parsable start date; such
/// activities still render on the map and count toward the heatmap, but
/// never contribute to monthly buckets.
#[derive(Debug, Clone)]
pub struct Activity {
    pub category: String,
    pub points: Vec<GpsPoint>,
    pub bounds: Bounds,
    pub date: Option<NaiveDateTime>,
    /// Total elevation gain in meters
    pub elevation_gain: f64,
    /// Distance in meters
    pub distance: f64,
    /// Moving time in seconds
    pub moving_time: f64,
}

impl Activity {
    /// Create an activity from decoded points. Returns `None` when the
    /// geometry is empty, since a route without coordinates has no bounds
    /// and nothing to render.
    pub fn new(
        category: impl Into<String>,
        points: Vec<GpsPoint>,
        date: Option<NaiveDateTime>,
        elevation_gain: f64,
        distance: f64,
        moving_time: f64,
    ) -> Option<Self> {
        let bounds = Bounds::from_points(&points)?;
        Some(Self {
            category: category.into(),
            points,
            bounds,
            date,
            elevation_gain,
            distance,
            moving_time,
        })
    }
}

/// R-tree entry pointing back at one stored activity by category and
/// position within that category's list. Positions are stable because the
/// store is append-only between clears.
#[derive(Debug, Clone)]
struct ActivityEnvelope {
    category: String,
    position: usize,
    bounds: Bounds,
}

impl RTreeObject for ActivityEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_lng, self.bounds.min_lat],
            [self.bounds.max_lng, self.bounds.max_lat],
        )
    }
}

/// Category-grouped activity storage with a spatial index.
#[derive(Debug, Default)]
pub struct ActivityStore {
    by_category: BTreeMap<String, Vec<Activity>>,
    index: RTree<ActivityEnvelope>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one activity to its category's list and index its bounds.
    pub fn append(&mut self, activity: Activity) {
        let entries = self.by_category.entry(activity.category.clone()).or_default();
        self.index.insert(ActivityEnvelope {
            category: activity.category.clone(),
            position: entries.len(),
            bounds: activity.bounds,
        });
        entries.push(activity);
    }

    /// Drop every stored activity. Accumulation across ingestions is the
    /// default; replacement is this explicit call followed by a re-ingest.
    pub fn clear(&mut self) {
        self.by_category.clear();
        self.index = RTree::new();
    }

    /// Known category names, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.by_category.keys().cloned().collect()
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.by_category.contains_key(name)
    }

    /// Activities for one category, in ingestion order.
    pub fn entries_for(&self, category: &str) -> Option<&[Activity]> {
        self.by_category.get(category).map(Vec::as_slice)
    }

    /// Iterate `(category, activities)` pairs covered by a selection.
    pub fn entries<'a>(
        &'a self,
        selection: &'a Selection,
    ) -> Box<dyn Iterator<Item = (&'a str, &'a [Activity])> + 'a> {
        match selection {
            Selection::All => Box::new(
                self.by_category
                    .iter()
                    .map(|(name, list)| (name.as_str(), list.as_slice())),
            ),
            Selection::Category(name) => Box::new(
                self.by_category
                    .get_key_value(name)
                    .into_iter()
                    .map(|(name, list)| (name.as_str(), list.as_slice())),
            ),
        }
    }

    /// Every coordinate of every activity covered by a selection, flattened
    /// in ingestion order. Input to the heatmap aggregator.
    pub fn all_points(&self, selection: &Selection) -> Vec<GpsPoint> {
        self.entries(selection)
            .flat_map(|(_, activities)| activities)
            .flat_map(|activity| activity.points.iter().copied())
            .collect()
    }

    /// Keys of activities whose bounding box intersects the viewport.
    pub fn visible_in(&self, viewport: &Bounds) -> HashSet<(&str, usize)> {
        let envelope = AABB::from_corners(
            [viewport.min_lng, viewport.min_lat],
            [viewport.max_lng, viewport.max_lat],
        );
        self.index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| (entry.category.as_str(), entry.position))
            .collect()
    }

    /// Total number of stored activities.
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }
}
