//! Harsh-braking scoring with false-alarm suppression.

use chrono::{NaiveDateTime, TimeDelta};
use score_core::models::{EventRecord, VehicleStatus};
use serde::Serialize;
use tracing::debug;

/// Alerts this close to the previous alert (after sorting) are false alarms.
pub const FALSE_ALARM_WINDOW_SECS: i64 = 120;

/// Penalty per surviving harsh-braking event.
pub const POINTS_PER_EVENT: u32 = 8;

/// A harsh-braking alert that survived suppression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrakingEvent {
    pub row: usize,
    pub timestamp: Option<NaiveDateTime>,
    pub speed: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&EventRecord> for BrakingEvent {
    fn from(r: &EventRecord) -> Self {
        Self {
            row: r.row,
            timestamp: r.timestamp,
            speed: r.speed,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

/// Outcome of the harsh-braking analysis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HarshBrakingResult {
    /// Harsh-braking alerts in the report before suppression.
    pub alerts: usize,
    /// Alerts dropped as false alarms.
    pub suppressed: usize,
    /// Surviving events in chronological order.
    pub events: Vec<BrakingEvent>,
    pub points: u32,
}

impl HarshBrakingResult {
    /// Number of scored events.
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

/// Scores harsh-braking alerts.
pub struct HarshBrakingAnalyzer;

impl HarshBrakingAnalyzer {
    /// Filter, sort and de-duplicate harsh-braking alerts, then score them.
    ///
    /// Each alert is compared only with its immediate predecessor in the
    /// sorted list, whether or not that predecessor itself survived. Alerts
    /// with invalid timestamps sort last and are never suppressed.
    pub fn analyze(records: &[EventRecord]) -> HarshBrakingResult {
        let mut alerts: Vec<&EventRecord> = records
            .iter()
            .filter(|r| r.status == VehicleStatus::HarshBraking)
            .collect();
        alerts.sort_by_key(|r| (r.timestamp.is_none(), r.timestamp));

        let window = TimeDelta::seconds(FALSE_ALARM_WINDOW_SECS);
        let events: Vec<BrakingEvent> = alerts
            .iter()
            .enumerate()
            .filter(|(i, r)| {
                let Some(prev) = i.checked_sub(1).map(|p| alerts[p]) else {
                    return true;
                };
                match (prev.timestamp, r.timestamp) {
                    (Some(a), Some(b)) => (b - a).abs() > window,
                    _ => true,
                }
            })
            .map(|(_, r)| BrakingEvent::from(*r))
            .collect();

        let suppressed = alerts.len() - events.len();
        if suppressed > 0 {
            debug!("Suppressed {} harsh-braking false alarms", suppressed);
        }

        HarshBrakingResult {
            alerts: alerts.len(),
            suppressed,
            points: events.len() as u32 * POINTS_PER_EVENT,
            events,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
