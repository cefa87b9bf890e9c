//! Speed-violation scoring.
//!
//! Candidates are "Speed Violation" records at or above
//! [`MIN_VIOLATION_SPEED_KMH`]. Each one is scored against either the fixed
//! fallback limit or a limit resolved through a [`SpeedLimitLookup`]; which of
//! the two applies is decided once per run by [`LimitPolicy::decide`].

use chrono::NaiveDateTime;
use score_core::formatting::{format_coordinate, format_speed, format_timestamp};
use score_core::models::{EventRecord, VehicleStatus};
use serde::Serialize;
use tracing::{debug, warn};

use crate::speed_limit::{LookupError, SpeedLimitLookup};

/// Speeds below this are never violations, whatever the local limit.
pub const MIN_VIOLATION_SPEED_KMH: f64 = 70.0;

/// Limit used when the lookup is disabled or not allowed for this run.
pub const FALLBACK_LIMIT_KMH: f64 = 70.0;

/// More candidates than this and the run falls back to the fixed limit.
pub const MAX_LOOKUPS_PER_RUN: usize = 10;

// ── LimitPolicy ───────────────────────────────────────────────────────────────

/// How limits are resolved for every candidate of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Query the external lookup per candidate.
    Lookup,
    /// No lookup configured; use [`FALLBACK_LIMIT_KMH`].
    Fixed,
    /// Too many candidates to look up; fixed limit, and the list needs
    /// manual review.
    FixedTooManyCandidates,
}

impl LimitPolicy {
    pub fn decide(candidates: usize, lookup_available: bool) -> Self {
        match (lookup_available, candidates > MAX_LOOKUPS_PER_RUN) {
            (_, true) => LimitPolicy::FixedTooManyCandidates,
            (true, false) => LimitPolicy::Lookup,
            (false, false) => LimitPolicy::Fixed,
        }
    }

    pub fn uses_lookup(self) -> bool {
        self == LimitPolicy::Lookup
    }

    pub fn review_required(self) -> bool {
        self == LimitPolicy::FixedTooManyCandidates
    }
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Where a violation's limit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    Fixed,
    Lookup,
}

/// A scored speed violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedViolation {
    pub row: usize,
    pub timestamp: Option<NaiveDateTime>,
    pub speed: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub limit: f64,
    pub limit_source: LimitSource,
    pub delta: f64,
    pub points: u32,
}

/// A candidate that could not be scored because no limit was available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedViolation {
    pub row: usize,
    pub timestamp: Option<NaiveDateTime>,
    pub speed: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reason: String,
}

/// Outcome of the speed-violation analysis.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedViolationResult {
    pub candidates: usize,
    pub policy: LimitPolicy,
    pub review_required: bool,
    /// Scored violations in file order, including 0-point ones.
    pub violations: Vec<SpeedViolation>,
    pub unresolved: Vec<UnresolvedViolation>,
    pub points: u32,
}

/// Penalty for exceeding the limit by `delta` km/h.
///
/// Fractional deltas fall into the tier with the tightest upper bound, so
/// 15.5 scores 8 and 25.5 scores 15.
pub fn penalty_points(delta: f64) -> u32 {
    if delta < 10.0 {
        0
    } else if delta <= 15.0 {
        3
    } else if delta <= 25.0 {
        8
    } else {
        15
    }
}

// ── SpeedViolationAnalyzer ────────────────────────────────────────────────────

/// Scores speed violations, optionally resolving limits through a lookup.
pub struct SpeedViolationAnalyzer<'l> {
    lookup: Option<&'l dyn SpeedLimitLookup>,
}

impl<'l> SpeedViolationAnalyzer<'l> {
    pub fn new(lookup: Option<&'l dyn SpeedLimitLookup>) -> Self {
        Self { lookup }
    }

    /// Records eligible for speed scoring, in file order.
    pub fn candidates(records: &[EventRecord]) -> Vec<&EventRecord> {
        records
            .iter()
            .filter(|r| r.status == VehicleStatus::SpeedViolation)
            .filter(|r| r.speed.is_some_and(|s| s >= MIN_VIOLATION_SPEED_KMH))
            .collect()
    }

    pub fn analyze(&self, records: &[EventRecord]) -> SpeedViolationResult {
        let candidates = Self::candidates(records);
        let policy = LimitPolicy::decide(candidates.len(), self.lookup.is_some());

        if policy.review_required() {
            warn!(
                "{} speed violations exceed the lookup cap of {}; scoring all against {} and flagging for review",
                candidates.len(),
                MAX_LOOKUPS_PER_RUN,
                format_speed(FALLBACK_LIMIT_KMH)
            );
            for record in &candidates {
                warn!(
                    "  review: row {} at {}: {} ({}, {})",
                    record.row,
                    format_timestamp(record.timestamp),
                    format_speed(record.speed.unwrap_or_default()),
                    format_coordinate(record.latitude),
                    format_coordinate(record.longitude)
                );
            }
        }

        let mut violations: Vec<SpeedViolation> = Vec::new();
        let mut unresolved: Vec<UnresolvedViolation> = Vec::new();

        for record in &candidates {
            let speed = record.speed.unwrap_or_default();
            let resolved = match (policy, self.lookup) {
                (LimitPolicy::Lookup, Some(lookup)) => Self::resolve(lookup, record)
                    .map(|limit| limit.map(|l| (l, LimitSource::Lookup))),
                _ => Ok(Some((FALLBACK_LIMIT_KMH, LimitSource::Fixed))),
            };

            match resolved {
                Ok(Some((limit, limit_source))) => {
                    let delta = speed - limit;
                    violations.push(SpeedViolation {
                        row: record.row,
                        timestamp: record.timestamp,
                        speed,
                        latitude: record.latitude,
                        longitude: record.longitude,
                        limit,
                        limit_source,
                        delta,
                        points: penalty_points(delta),
                    });
                }
                outcome => {
                    let reason = match outcome {
                        Err(e) => e.to_string(),
                        _ => "no speed limit at this location".to_string(),
                    };
                    warn!(
                        "Skipping speed violation at row {} ({}): {}",
                        record.row,
                        format_timestamp(record.timestamp),
                        reason
                    );
                    unresolved.push(UnresolvedViolation {
                        row: record.row,
                        timestamp: record.timestamp,
                        speed,
                        latitude: record.latitude,
                        longitude: record.longitude,
                        reason,
                    });
                }
            }
        }

        let points: u32 = violations.iter().map(|v| v.points).sum();
        debug!(
            "Speed violations: {} candidates, {} scored, {} unresolved, {} points ({:?})",
            candidates.len(),
            violations.len(),
            unresolved.len(),
            points,
            policy
        );

        SpeedViolationResult {
            candidates: candidates.len(),
            policy,
            review_required: policy.review_required(),
            violations,
            unresolved,
            points,
        }
    }

    fn resolve(
        lookup: &dyn SpeedLimitLookup,
        record: &EventRecord,
    ) -> Result<Option<f64>, LookupError> {
        let (latitude, longitude) = record
            .coordinates()
            .ok_or(LookupError::MissingCoordinates)?;
        lookup.speed_limit(latitude, longitude)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
