//! Raw-row normalisation and trip numbering.
//!
//! Turns [`RawRow`]s into typed [`EventRecord`]s in source order and tags each
//! record with its trip number.

use std::collections::BTreeMap;

use score_core::data_processors::{LocationExtractor, NumberParser, TimestampProcessor};
use score_core::models::{EventRecord, VehicleStatus};
use serde::Serialize;
use tracing::{debug, warn};

use crate::reader::RawRow;

/// Column names consumed by the preprocessor.
pub mod columns {
    pub const STATUS: &str = "VehicleStatus";
    pub const TIMESTAMP: &str = "Report Group Date";
    pub const SPEED: &str = "MOBILESPEED";
    pub const ODOMETER: &str = "MOBILEODO";
    pub const LOCATION: &str = "Location";
}

/// Administrative columns that are always empty in exports and are discarded.
pub const DROPPED_COLUMNS: &[&str] = &[
    "DriverID",
    "SkillSet",
    "MsgTypeId",
    "LocationTolerance",
    "STATUS1",
];

const CONSUMED_COLUMNS: &[&str] = &[
    columns::STATUS,
    columns::TIMESTAMP,
    columns::SPEED,
    columns::ODOMETER,
    columns::LOCATION,
];

// ── PreprocessStats ───────────────────────────────────────────────────────────

/// Counters describing how cleanly the raw rows converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreprocessStats {
    pub rows: usize,
    /// Rows whose `Report Group Date` did not parse.
    pub invalid_timestamps: usize,
    /// Rows whose `Location` did not match `Long: x. Lat: y`.
    pub unmatched_locations: usize,
    /// Number of "Start up" events, i.e. the highest trip number.
    pub trips_started: u32,
}

// ── Preprocessor ──────────────────────────────────────────────────────────────

/// Converts raw CSV rows into trip-tagged event records.
pub struct Preprocessor {
    locations: LocationExtractor,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            locations: LocationExtractor::new(),
        }
    }

    /// Normalise `rows` and assign trip numbers. Row order is preserved.
    pub fn process(&self, rows: &[RawRow]) -> (Vec<EventRecord>, PreprocessStats) {
        if let Some(first) = rows.first() {
            for column in CONSUMED_COLUMNS {
                if !first.contains_key(*column) {
                    warn!("Movement report has no \"{}\" column", column);
                }
            }
        }

        let mut stats = PreprocessStats {
            rows: rows.len(),
            ..Default::default()
        };

        let mut records: Vec<EventRecord> = rows
            .iter()
            .enumerate()
            .map(|(index, row)| self.to_record(index, row, &mut stats))
            .collect();

        stats.trips_started = assign_trip_numbers(&mut records);

        debug!(
            "Preprocessed {} rows: {} invalid timestamps, {} unmatched locations, {} trips",
            stats.rows, stats.invalid_timestamps, stats.unmatched_locations, stats.trips_started
        );

        (records, stats)
    }

    fn to_record(&self, index: usize, row: &RawRow, stats: &mut PreprocessStats) -> EventRecord {
        let timestamp = TimestampProcessor::parse_report_time(cell(row, columns::TIMESTAMP));
        if timestamp.is_none() {
            stats.invalid_timestamps += 1;
        }

        let location = self.locations.extract(cell(row, columns::LOCATION));
        if location.is_none() {
            stats.unmatched_locations += 1;
        }

        let extra: BTreeMap<String, String> = row
            .iter()
            .filter(|(k, _)| {
                !CONSUMED_COLUMNS.contains(&k.as_str()) && !DROPPED_COLUMNS.contains(&k.as_str())
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        EventRecord {
            row: index,
            timestamp,
            status: VehicleStatus::parse(cell(row, columns::STATUS)),
            speed: NumberParser::parse(cell(row, columns::SPEED)),
            odometer: NumberParser::parse(cell(row, columns::ODOMETER)),
            latitude: location.map(|l| l.latitude),
            longitude: location.map(|l| l.longitude),
            trip_number: 0,
            extra,
        }
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn cell<'a>(row: &'a RawRow, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or("")
}

/// Tag every record with the inclusive running count of "Start up" events.
///
/// Records before the first start belong to trip 0. Returns the final count.
pub fn assign_trip_numbers(records: &mut [EventRecord]) -> u32 {
    records.iter_mut().fold(0u32, |trip, record| {
        let trip = if record.status == VehicleStatus::StartUp {
            trip + 1
        } else {
            trip
        };
        record.trip_number = trip;
        trip
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
