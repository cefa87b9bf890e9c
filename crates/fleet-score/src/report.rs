//! Plain-text rendering of a [`DriverReport`].

use std::fmt::Write;

use score_core::formatting::{
    format_coordinate, format_distance_km, format_hours_minutes, format_points, format_speed,
    format_speed_delta, format_timestamp,
};
use score_data::analysis::DriverReport;
use score_data::speeding::{LimitPolicy, LimitSource};

/// Render the report as the console summary.
pub fn render_text(report: &DriverReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &DriverReport) -> std::fmt::Result {
    if let Some(source) = &report.metadata.source {
        writeln!(out, "Movement report: {}", source)?;
    }
    writeln!(
        out,
        "Records: {}, trips: {}",
        report.metadata.preprocess.rows, report.metadata.preprocess.trips_started
    )?;
    writeln!(out)?;

    let braking = &report.harsh_braking;
    writeln!(out, "Harsh Braking")?;
    writeln!(
        out,
        "Harsh Braking Count: {} ({} false alarms suppressed)",
        braking.count(),
        braking.suppressed
    )?;
    writeln!(out, "Harsh Braking Penalty: {}", format_points(braking.points))?;
    writeln!(out)?;

    let night = &report.night_driving;
    writeln!(out, "Night Driving")?;
    for trip in &night.trips {
        writeln!(
            out,
            "Trip Number: {}, Duration: {}, Night Penalty: {}",
            trip.trip_number,
            format_hours_minutes(trip.duration_hours, trip.duration_minutes),
            format_points(trip.penalty)
        )?;
    }
    writeln!(out, "Night Driving Penalty: {}", format_points(night.points))?;
    writeln!(out)?;

    let speed = &report.speed_violations;
    writeln!(out, "Speed Violations")?;
    writeln!(out, "Speed Violation Count: {}", speed.candidates)?;
    if speed.policy == LimitPolicy::FixedTooManyCandidates {
        writeln!(
            out,
            "Too many violations for limit lookups; all scored against the fixed limit. Review required."
        )?;
    }
    let mut running = 0u32;
    for v in &speed.violations {
        running += v.points;
        let source = match v.limit_source {
            LimitSource::Fixed => "fixed",
            LimitSource::Lookup => "lookup",
        };
        writeln!(
            out,
            "{}  {} (limit {}, {})  at ({}, {})  {}  {}  [total {}]",
            format_timestamp(v.timestamp),
            format_speed(v.speed),
            format_speed(v.limit),
            source,
            format_coordinate(v.latitude),
            format_coordinate(v.longitude),
            format_speed_delta(v.delta),
            format_points(v.points),
            running
        )?;
    }
    for u in &speed.unresolved {
        writeln!(
            out,
            "{}  {}  at ({}, {})  not scored: {}",
            format_timestamp(u.timestamp),
            format_speed(u.speed),
            format_coordinate(u.latitude),
            format_coordinate(u.longitude),
            u.reason
        )?;
    }
    writeln!(out, "Speed Violation Penalty: {}", format_points(speed.points))?;
    writeln!(out)?;

    match report.odometer_km {
        Some(km) => writeln!(out, "Month-to-date Distance: {}", format_distance_km(km))?,
        None => writeln!(out, "Month-to-date Distance: unknown")?,
    }
    writeln!(out, "Total Penalty: {}", format_points(report.total_points))?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
