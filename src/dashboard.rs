//! Event-level coordination between the store, the aggregators and the
//! host UI.
//!
//! The host's event dispatch (file selected, category changed, viewport
//! moved) stays a thin adapter: each handler calls one [`Dashboard`] method
//! synchronously and forwards the returned views to its renderers. The only
//! state held here beyond the store is the currently selected category and
//! the last-known viewport, both supplied by the UI layer.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::heatmap::{compute_heat, HeatPoint};
use crate::ingest::{ingest_csv, IngestReport};
use crate::monthly::{compute_monthly, MonthlySeries};
use crate::store::ActivityStore;
use crate::{Bounds, GpsPoint, Selection};

/// Recomputed views handed to the map and chart renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardUpdate {
    /// Density surface for the heat overlay. Empty means "hide the overlay".
    pub heat_points: Vec<HeatPoint>,
    /// Monthly series for the bar chart.
    pub monthly: MonthlySeries,
}

/// One route plus the tooltip fields the map layer shows on hover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteView {
    pub category: String,
    pub points: Vec<GpsPoint>,
    /// Formatted start date, `None` when the source row had no parsable date.
    pub date: Option<String>,
    pub distance_km: f64,
    pub elevation_m: f64,
    pub moving_time_hours: f64,
    pub point_count: usize,
}

/// Owns the activity store and the two pieces of UI-supplied state.
#[derive(Debug, Default)]
pub struct Dashboard {
    store: ActivityStore,
    selection: Selection,
    viewport: Option<Bounds>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a CSV export and recompute both views, unfiltered, for the
    /// current selection.
    pub fn ingest<R: Read>(&mut self, reader: R) -> Result<(IngestReport, DashboardUpdate)> {
        let report = ingest_csv(&mut self.store, reader)?;
        let update = DashboardUpdate {
            heat_points: compute_heat(&self.store.all_points(&self.selection)),
            monthly: compute_monthly(&self.store, &self.selection, None),
        };
        Ok((report, update))
    }

    /// Change the selected category and recompute both views. The heat
    /// surface is never viewport-filtered; the monthly series is restricted
    /// to the supplied viewport when one is given.
    pub fn select_category(
        &mut self,
        selection: Selection,
        viewport: Option<Bounds>,
    ) -> DashboardUpdate {
        self.selection = selection;
        self.viewport = viewport;
        DashboardUpdate {
            heat_points: compute_heat(&self.store.all_points(&self.selection)),
            monthly: compute_monthly(&self.store, &self.selection, self.viewport.as_ref()),
        }
    }

    /// The map moved: recompute only the monthly series, restricted to the
    /// new viewport.
    pub fn viewport_changed(&mut self, viewport: Bounds) -> MonthlySeries {
        self.viewport = Some(viewport);
        compute_monthly(&self.store, &self.selection, Some(&viewport))
    }

    /// Routes of the current selection with their tooltip fields, in
    /// ingestion order per category.
    pub fn route_views(&self) -> Vec<RouteView> {
        self.store
            .entries(&self.selection)
            .flat_map(|(category, activities)| {
                activities.iter().map(move |activity| RouteView {
                    category: category.to_string(),
                    points: activity.points.clone(),
                    date: activity.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    distance_km: activity.distance / 1000.0,
                    elevation_m: activity.elevation_gain,
                    moving_time_hours: activity.moving_time / 3600.0,
                    point_count: activity.points.len(),
                })
            })
            .collect()
    }

    /// Drop all stored activities and reset to the default selection.
    pub fn clear(&mut self) {
        self.store.clear();
        self.selection = Selection::All;
        self.viewport = None;
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> Option<&Bounds> {
        self.viewport.as_ref()
    }
}
