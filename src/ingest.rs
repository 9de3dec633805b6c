//! CSV ingestion of activity exports.
//!
//! Reads a tabular export with a header row, decodes each row's summary
//! polyline and appends the resulting [`Activity`] to a caller-owned store.
//! One bad row never aborts ingestion: rows without geometry are skipped
//! silently, rows with a malformed polyline are skipped with a logged
//! diagnostic, and numeric fields fall back to zero on parse failure.

use std::io::Read;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::polyline;
use crate::store::{Activity, ActivityStore};

// Consumed columns; anything else in the export is ignored.
const COL_SPORT_TYPE: &str = "sport_type";
const COL_POLYLINE: &str = "map.summary_polyline";
const COL_ELEVATION: &str = "total_elevation_gain";
const COL_DISTANCE: &str = "distance";
const COL_MOVING_TIME: &str = "moving_time";
const COL_START_DATE: &str = "start_date_local";

/// Category assigned to rows without a sport type.
const DEFAULT_CATEGORY: &str = "Other";

/// Outcome of one ingestion pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Categories first seen during this pass, in order of appearance.
    /// The host uses these to extend its category selector.
    pub new_categories: Vec<String>,
    pub rows_read: usize,
    pub rows_ingested: usize,
    pub rows_skipped: usize,
    /// Rows skipped specifically because their polyline failed to decode.
    pub decode_failures: usize,
}

/// Column positions resolved from the header row. A missing column behaves
/// like an absent field on every row; there is no schema validation beyond
/// per-field fallback.
struct Columns {
    sport_type: Option<usize>,
    polyline: Option<usize>,
    elevation: Option<usize>,
    distance: Option<usize>,
    moving_time: Option<usize>,
    start_date: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        Self {
            sport_type: find(COL_SPORT_TYPE),
            polyline: find(COL_POLYLINE),
            elevation: find(COL_ELEVATION),
            distance: find(COL_DISTANCE),
            moving_time: find(COL_MOVING_TIME),
            start_date: find(COL_START_DATE),
        }
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> &'r str {
    index.and_then(|i| record.get(i)).unwrap_or("").trim()
}

/// Remove all whitespace from a sport type ("Stand Up Paddling" becomes
/// "StandUpPaddling"); empty or absent values become [`DEFAULT_CATEGORY`].
fn normalize_category(raw: &str) -> String {
    let normalized: String = raw.split_whitespace().collect();
    if normalized.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        normalized
    }
}

fn parse_number(raw: &str) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Accepts RFC 3339 plus the plain timestamp and date formats that activity
/// exports actually ship.
fn parse_start_date(raw: &str) -> Option<NaiveDateTime> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Ingest a CSV export into `store` in a single synchronous pass.
///
/// Only a structurally unreadable stream returns an error; every row-level
/// problem is handled with skip-and-continue semantics and counted in the
/// returned [`IngestReport`].
pub fn ingest_csv<R: Read>(store: &mut ActivityStore, reader: R) -> Result<IngestReport> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::from_headers(csv_reader.headers()?);

    let mut report = IngestReport::default();

    for record in csv_reader.records() {
        let record = record?;
        report.rows_read += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let encoded = field(&record, columns.polyline);
        if encoded.is_empty() {
            report.rows_skipped += 1;
            continue;
        }

        let points = match polyline::decode(encoded) {
            Ok(points) => points,
            Err(err) => {
                warn!("[Ingest] line {}: invalid polyline: {}", line, err);
                report.decode_failures += 1;
                report.rows_skipped += 1;
                continue;
            }
        };

        let category = normalize_category(field(&record, columns.sport_type));
        let elevation_gain = parse_number(field(&record, columns.elevation));
        let distance = parse_number(field(&record, columns.distance));
        let moving_time = parse_number(field(&record, columns.moving_time));
        let date = parse_start_date(field(&record, columns.start_date));

        let Some(activity) =
            Activity::new(category.clone(), points, date, elevation_gain, distance, moving_time)
        else {
            // Decoded to zero coordinates; nothing to render.
            report.rows_skipped += 1;
            continue;
        };

        if !store.contains_category(&category) {
            report.new_categories.push(category);
        }
        store.append(activity);
        report.rows_ingested += 1;
    }

    info!(
        "[Ingest] {} of {} rows ingested, {} skipped ({} decode failures), {} new categories",
        report.rows_ingested,
        report.rows_read,
        report.rows_skipped,
        report.decode_failures,
        report.new_categories.len()
    );

    Ok(report)
}
