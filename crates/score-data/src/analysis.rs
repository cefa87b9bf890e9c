//! Main scoring pipeline.
//!
//! Loads a movement report, preprocesses it once and runs the harsh-braking,
//! night-driving and speed-violation analyzers over the same records,
//! returning a [`DriverReport`] ready for rendering.

use std::path::Path;

use chrono::Utc;
use score_core::error::Result;
use score_core::models::EventRecord;
use serde::Serialize;
use tracing::{debug, info};

use crate::braking::{HarshBrakingAnalyzer, HarshBrakingResult};
use crate::night::{NightDrivingAnalyzer, NightDrivingResult};
use crate::preprocess::{PreprocessStats, Preprocessor};
use crate::reader::load_rows;
use crate::speed_limit::SpeedLimitLookup;
use crate::speeding::{SpeedViolationAnalyzer, SpeedViolationResult};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Path of the movement report, if read from disk.
    pub source: Option<String>,
    /// Preprocessing counters (rows, parse failures, trips).
    pub preprocess: PreprocessStats,
    /// Whether limits were resolved through the external lookup.
    pub lookup_used: bool,
    /// Wall-clock seconds spent reading the CSV.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent in the analyzers.
    pub analysis_time_seconds: f64,
}

/// The complete output of [`analyze_report`].
#[derive(Debug, Clone, Serialize)]
pub struct DriverReport {
    pub metadata: ReportMetadata,
    pub harsh_braking: HarshBrakingResult,
    pub night_driving: NightDrivingResult,
    pub speed_violations: SpeedViolationResult,
    /// Odometer reading of the last record in file order.
    pub odometer_km: Option<f64>,
    /// [`odometer_km`](Self::odometer_km) rounded to whole kilometres.
    pub distance_km: Option<i64>,
    /// Sum of the three analyzers' points.
    pub total_points: u32,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline on the movement report at `path`.
///
/// 1. Load raw rows (a missing or unreadable file is the only hard error).
/// 2. Preprocess into trip-tagged records.
/// 3. Score harsh braking, night driving, then speed violations.
pub fn analyze_report(
    path: &Path,
    lookup: Option<&dyn SpeedLimitLookup>,
) -> Result<DriverReport> {
    let load_start = std::time::Instant::now();
    let rows = load_rows(path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let (records, stats) = Preprocessor::new().process(&rows);
    let mut report = analyze_records(&records, stats, lookup);
    report.metadata.source = Some(path.display().to_string());
    report.metadata.load_time_seconds = load_time;

    info!(
        "Scored {}: {} points over {} trips",
        path.display(),
        report.total_points,
        report.metadata.preprocess.trips_started
    );
    Ok(report)
}

/// Run the analyzers over already preprocessed records.
pub fn analyze_records(
    records: &[EventRecord],
    stats: PreprocessStats,
    lookup: Option<&dyn SpeedLimitLookup>,
) -> DriverReport {
    let analysis_start = std::time::Instant::now();

    let harsh_braking = HarshBrakingAnalyzer::analyze(records);
    let night_driving = NightDrivingAnalyzer::analyze(records);
    let speed_violations = SpeedViolationAnalyzer::new(lookup).analyze(records);

    let odometer_km = records.last().and_then(|r| r.odometer);
    let total_points = harsh_braking.points + night_driving.points + speed_violations.points;

    debug!(
        "Points: braking {}, night {}, speed {}",
        harsh_braking.points, night_driving.points, speed_violations.points
    );

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        source: None,
        preprocess: stats,
        lookup_used: speed_violations.policy.uses_lookup(),
        load_time_seconds: 0.0,
        analysis_time_seconds: analysis_start.elapsed().as_secs_f64(),
    };

    DriverReport {
        metadata,
        harsh_braking,
        night_driving,
        speed_violations,
        odometer_km,
        distance_km: odometer_km.map(|km| km.round() as i64),
        total_points,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
