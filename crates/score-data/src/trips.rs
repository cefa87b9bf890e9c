//! Trip segmentation over trip-tagged records.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use score_core::models::{EventRecord, VehicleStatus};

/// Minimum number of records a trip needs before a duration is evaluated.
pub const MIN_TRIP_RECORDS: usize = 2;

// ── Trip ──────────────────────────────────────────────────────────────────────

/// The ordered records sharing one trip number.
#[derive(Debug, Clone)]
pub struct Trip<'a> {
    pub number: u32,
    pub records: Vec<&'a EventRecord>,
}

impl<'a> Trip<'a> {
    /// Earliest timestamp among the trip's "Start up" records.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.timestamps_with(&VehicleStatus::StartUp).min()
    }

    /// Latest timestamp among the trip's "Ignition off" records.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.timestamps_with(&VehicleStatus::IgnitionOff).max()
    }

    /// `(start, end)` when both boundaries are known.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start_time()?, self.end_time()?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the trip has enough records for duration-based analysis.
    pub fn is_evaluable(&self) -> bool {
        self.records.len() >= MIN_TRIP_RECORDS
    }

    fn timestamps_with<'s>(
        &'s self,
        status: &'s VehicleStatus,
    ) -> impl Iterator<Item = NaiveDateTime> + 's {
        self.records
            .iter()
            .filter(move |r| &r.status == status)
            .filter_map(|r| r.timestamp)
    }
}

// ── TripSegmenter ─────────────────────────────────────────────────────────────

/// Stateless helper that slices the record arena into trips.
pub struct TripSegmenter;

impl TripSegmenter {
    /// Build the trips for `trip_numbers`, in the order requested.
    ///
    /// Each trip holds its records in source order. Requested numbers that
    /// have no records yield an empty trip; duplicates are collapsed.
    pub fn segment<'a>(records: &'a [EventRecord], trip_numbers: &[u32]) -> Vec<Trip<'a>> {
        let wanted: BTreeSet<u32> = trip_numbers.iter().copied().collect();
        let mut grouped: BTreeMap<u32, Vec<&'a EventRecord>> = BTreeMap::new();

        for record in records {
            if wanted.contains(&record.trip_number) {
                grouped.entry(record.trip_number).or_default().push(record);
            }
        }

        let mut seen: BTreeSet<u32> = BTreeSet::new();
        trip_numbers
            .iter()
            .filter(|n| seen.insert(**n))
            .map(|&number| Trip {
                number,
                records: grouped.remove(&number).unwrap_or_default(),
            })
            .collect()
    }
}

/// Distinct values of `numbers` in order of first appearance.
pub fn distinct_in_order(numbers: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    numbers.into_iter().filter(|n| seen.insert(*n)).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
