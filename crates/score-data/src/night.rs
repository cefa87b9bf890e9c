//! Night-driving penalty.
//!
//! Every trip with at least one night-eligible record is scanned minute by
//! minute between its start and end; each instant adds the rate for its hour.

use chrono::{NaiveDateTime, Timelike};
use score_core::models::{EventRecord, VehicleStatus};
use score_core::time_utils::{duration_components, MinuteSteps};
use serde::Serialize;
use tracing::debug;

use crate::trips::{distinct_in_order, TripSegmenter};

/// Whether `hour` falls in the night window (23:00 through 04:59).
pub fn is_night_hour(hour: u32) -> bool {
    hour >= 23 || hour <= 4
}

/// Penalty added for one scanned minute instant in `hour`.
pub fn minute_rate(hour: u32) -> u32 {
    match hour {
        23 | 4 => 2,
        0 | 3 => 4,
        1 | 2 => 6,
        _ => 0,
    }
}

/// Penalty for driving from `start` to `end`. Zero when `end < start`.
pub fn night_penalty(start: NaiveDateTime, end: NaiveDateTime) -> u32 {
    MinuteSteps::new(start, end)
        .map(|t| minute_rate(t.hour()))
        .sum()
}

/// Whether a record counts toward selecting night trips.
pub fn is_night_eligible(record: &EventRecord) -> bool {
    record.status != VehicleStatus::HealthCheckIgnitionOff
        && record.hour().is_some_and(is_night_hour)
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Penalty breakdown for one night trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightTrip {
    pub trip_number: u32,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// Whole days of `end - start`.
    pub duration_days: i64,
    /// Hour component of `end - start`, days excluded (`0..24`).
    pub duration_hours: i64,
    pub duration_minutes: i64,
    pub penalty: u32,
}

/// Outcome of the night-driving analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NightDrivingResult {
    /// Records that fell in the night window.
    pub eligible_records: usize,
    /// Distinct trips touched by those records.
    pub trips_considered: usize,
    /// Trips that could be scored, in order of first night record.
    pub trips: Vec<NightTrip>,
    pub points: u32,
}

// ── NightDrivingAnalyzer ──────────────────────────────────────────────────────

/// Scores time spent driving at night.
pub struct NightDrivingAnalyzer;

impl NightDrivingAnalyzer {
    pub fn analyze(records: &[EventRecord]) -> NightDrivingResult {
        let eligible: Vec<&EventRecord> =
            records.iter().filter(|r| is_night_eligible(r)).collect();
        let numbers = distinct_in_order(eligible.iter().map(|r| r.trip_number));

        let mut trips: Vec<NightTrip> = Vec::new();
        for trip in TripSegmenter::segment(records, &numbers) {
            if !trip.is_evaluable() {
                debug!("Trip {}: too few records for night scoring", trip.number);
                continue;
            }
            let Some((start, end)) = trip.bounds() else {
                debug!("Trip {}: no start or end time", trip.number);
                continue;
            };
            if end < start {
                debug!("Trip {}: ends before it starts, skipped", trip.number);
                continue;
            }

            let (duration_days, duration_hours, duration_minutes) =
                duration_components(end - start);
            trips.push(NightTrip {
                trip_number: trip.number,
                start_time: start,
                end_time: end,
                duration_days,
                duration_hours,
                duration_minutes,
                penalty: night_penalty(start, end),
            });
        }

        let points = trips.iter().map(|t| t.penalty).sum();
        NightDrivingResult {
            eligible_records: eligible.len(),
            trips_considered: numbers.len(),
            trips,
            points,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
