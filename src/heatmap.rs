//! Density surface aggregation for heatmap rendering.
//!
//! Coordinates are snapped to a 5-decimal grid (~1 m), counted per cell,
//! and weighted with a log-compressed intensity so a handful of very dense
//! cells do not wash out the rest of the surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::GpsPoint;

/// Grid resolution: 5 decimal places, ~1 m.
const GRID_SCALE: f64 = 1e5;

/// Intensity floor for an isolated point.
const INTENSITY_FLOOR: f64 = 0.3;

/// One weighted grid cell of the density surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    /// Number of coordinates that fell into this cell.
    pub count: u32,
    /// Render weight in `[0.3, 1.0]`; the densest cell reaches 1.0.
    pub intensity: f64,
}

/// Aggregate coordinates into a density surface.
///
/// Each cell's intensity is `0.3 + 0.7 * ln(count + 1) / ln(max_count + 1)`.
/// Empty input yields an empty surface, which the caller should treat as
/// "hide the overlay" rather than rendering an empty layer.
///
/// Output is sorted by grid cell so repeated calls over the same data
/// produce identical sequences.
pub fn compute_heat(points: &[GpsPoint]) -> Vec<HeatPoint> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut cells: HashMap<(i64, i64), u32> = HashMap::new();
    for point in points {
        let key = (
            (point.latitude * GRID_SCALE).round() as i64,
            (point.longitude * GRID_SCALE).round() as i64,
        );
        *cells.entry(key).or_insert(0) += 1;
    }

    let max_count = cells.values().copied().max().unwrap_or(0);
    let scale = (f64::from(max_count) + 1.0).ln();

    let mut heat: Vec<((i64, i64), u32)> = cells.into_iter().collect();
    heat.sort_unstable_by_key(|(key, _)| *key);

    heat.into_iter()
        .map(|((lat_key, lng_key), count)| HeatPoint {
            lat: lat_key as f64 / GRID_SCALE,
            lng: lng_key as f64 / GRID_SCALE,
            count,
            intensity: INTENSITY_FLOOR
                + (1.0 - INTENSITY_FLOOR) * ((f64::from(count) + 1.0).ln() / scale),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_hides_overlay() {
        assert!(compute_heat(&[]).is_empty());
    }

    #[test]
    fn test_single_point_gets_full_intensity() {
        // One cell means count == max_count, so intensity is 1.0.
        let heat = compute_heat(&[GpsPoint::new(51.5074, -0.1278)]);
        assert_eq!(heat.len(), 1);
        assert_eq!(heat[0].count, 1);
        assert!((heat[0].intensity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intensity_bounds() {
        let mut points = Vec::new();
        // One dense cell, several isolated ones.
        for _ in 0..50 {
            points.push(GpsPoint::new(51.50000, -0.10000));
        }
        for i in 0..10 {
            points.push(GpsPoint::new(51.6 + i as f64 * 0.01, -0.2));
        }

        let heat = compute_heat(&points);
        assert_eq!(heat.len(), 11);
        for cell in &heat {
            assert!(cell.intensity >= 0.3 - 1e-9);
            assert!(cell.intensity <= 1.0 + 1e-9);
        }

        let densest = heat.iter().max_by_key(|c| c.count).unwrap();
        assert_eq!(densest.count, 50);
        assert!((densest.intensity - 1.0).abs() < 1e-9);

        // Isolated points sit near the floor but above it.
        let isolated = heat.iter().find(|c| c.count == 1).unwrap();
        assert!(isolated.intensity > 0.3);
        assert!(isolated.intensity < 0.5);
    }

    #[test]
    fn test_all_equal_counts_all_full_intensity() {
        let points = vec![
            GpsPoint::new(51.50, -0.10),
            GpsPoint::new(51.51, -0.11),
            GpsPoint::new(51.52, -0.12),
        ];
        let heat = compute_heat(&points);
        assert_eq!(heat.len(), 3);
        for cell in heat {
            assert!((cell.intensity - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nearby_points_share_a_cell() {
        // Within 1e-5 degrees after rounding these collapse to one cell.
        let points = vec![
            GpsPoint::new(51.500001, -0.100001),
            GpsPoint::new(51.500002, -0.100002),
        ];
        let heat = compute_heat(&points);
        assert_eq!(heat.len(), 1);
        assert_eq!(heat[0].count, 2);
    }

    #[test]
    fn test_output_order_is_stable() {
        let points = vec![
            GpsPoint::new(51.52, -0.12),
            GpsPoint::new(51.50, -0.10),
            GpsPoint::new(51.51, -0.11),
        ];
        assert_eq!(compute_heat(&points), compute_heat(&points));
    }
}
