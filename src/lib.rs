//! # Activity Dashboard
//!
//! Core pipeline for an activity-export dashboard: CSV ingestion, encoded
//! polyline decoding, density heatmap aggregation and viewport-aware monthly
//! aggregation.
//!
//! This library provides:
//! - Polyline decoding/encoding at precision 5 (Google polyline algorithm)
//! - CSV ingestion into a category-grouped, caller-owned activity store
//! - A log-compressed density surface for heatmap rendering
//! - A category-dependent monthly aggregate restricted to the visible viewport
//!
//! Rendering (map tiles, chart widget, overlay toggles) is left to the host;
//! the host's event handlers call [`Dashboard`] entry points synchronously
//! and forward the returned views to its renderers.
//!
//! ## Quick Start
//!
//! ```rust
//! use activity_dashboard::{Dashboard, Selection};
//!
//! let csv = "\
//! sport_type,map.summary_polyline,total_elevation_gain,distance,moving_time,start_date_local
//! Run,_p~iF~ps|U_ulLnnqC_mqNvxq`@,120,5000,1800,2024-03-15 07:30:00
//! ";
//!
//! let mut dashboard = Dashboard::new();
//! let (report, update) = dashboard.ingest(csv.as_bytes()).unwrap();
//!
//! assert_eq!(report.new_categories, vec!["Run".to_string()]);
//! assert!(!update.heat_points.is_empty());
//! assert_eq!(update.monthly.label, "Activity Frequency");
//! ```

use serde::{Deserialize, Serialize};

// Error types (decode + ingest)
pub mod error;
pub use error::{DecodeError, IngestError};

// Encoded polyline decoding/encoding
pub mod polyline;
pub use polyline::{decode, encode};

// Caller-owned category store with spatial index
pub mod store;
pub use store::{Activity, ActivityStore};

// CSV ingestion
pub mod ingest;
pub use ingest::{ingest_csv, IngestReport};

// Density surface aggregation
pub mod heatmap;
pub use heatmap::{compute_heat, HeatPoint};

// Monthly aggregation with category-dependent metrics
pub mod monthly;
pub use monthly::{compute_monthly, MetricKind, MonthlySeries};

// Event-level coordination for the host UI
pub mod dashboard;
pub use dashboard::{Dashboard, DashboardUpdate, RouteView};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use activity_dashboard::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box of a route or of the visible map viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points. Returns `None` for an empty slice.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Axis-aligned intersection test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
    }
}

/// Which categories a query covers: every category, or a single one.
///
/// Replaces the stringly-typed `"all"` sentinel used by map UIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Category(String),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::All
    }
}

impl Selection {
    /// Build a selection from a UI dropdown value, where `"all"` means
    /// every category.
    pub fn from_ui_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("all") {
            Selection::All
        } else {
            Selection::Category(value.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
