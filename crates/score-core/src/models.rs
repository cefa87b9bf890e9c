use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status tag carried in the `VehicleStatus` column of a movement report.
///
/// Known tags are mapped to dedicated variants; anything else is passed
/// through verbatim as [`VehicleStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VehicleStatus {
    /// `"Start up"`: opens a new trip.
    StartUp,
    /// `"Ignition off"`: closes a trip.
    IgnitionOff,
    /// `"Harsh Braking"` alert.
    HarshBraking,
    /// `"Speed Violation"` alert.
    SpeedViolation,
    /// `"Health Check; (Ignition off)"`: periodic ping while parked.
    HealthCheckIgnitionOff,
    /// Any other status string.
    Other(String),
}

impl VehicleStatus {
    pub const START_UP: &'static str = "Start up";
    pub const IGNITION_OFF: &'static str = "Ignition off";
    pub const HARSH_BRAKING: &'static str = "Harsh Braking";
    pub const SPEED_VIOLATION: &'static str = "Speed Violation";
    pub const HEALTH_CHECK_IGNITION_OFF: &'static str = "Health Check; (Ignition off)";

    /// Map a raw column value to a status. Matching is exact.
    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::START_UP => Self::StartUp,
            Self::IGNITION_OFF => Self::IgnitionOff,
            Self::HARSH_BRAKING => Self::HarshBraking,
            Self::SPEED_VIOLATION => Self::SpeedViolation,
            Self::HEALTH_CHECK_IGNITION_OFF => Self::HealthCheckIgnitionOff,
            other => Self::Other(other.to_string()),
        }
    }

    /// The string form as it appears in the report.
    pub fn as_str(&self) -> &str {
        match self {
            Self::StartUp => Self::START_UP,
            Self::IgnitionOff => Self::IGNITION_OFF,
            Self::HarshBraking => Self::HARSH_BRAKING,
            Self::SpeedViolation => Self::SPEED_VIOLATION,
            Self::HealthCheckIgnitionOff => Self::HEALTH_CHECK_IGNITION_OFF,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for VehicleStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<VehicleStatus> for String {
    fn from(s: VehicleStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single telemetry sample from the movement report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based row index in the source file.
    pub row: usize,
    /// Local report time; `None` when the source value did not parse.
    pub timestamp: Option<NaiveDateTime>,
    /// Vehicle status tag.
    pub status: VehicleStatus,
    /// Speed in km/h.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Cumulative odometer in km.
    #[serde(default)]
    pub odometer: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Running count of "Start up" events up to and including this record.
    #[serde(default)]
    pub trip_number: u32,
    /// Remaining source columns that were neither consumed nor dropped.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl EventRecord {
    /// Hour of day (0-23) of the timestamp, if valid.
    pub fn hour(&self) -> Option<u32> {
        self.timestamp.map(|ts| ts.hour())
    }

    /// `(latitude, longitude)` when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(status: &str) -> EventRecord {
        EventRecord {
            row: 0,
            timestamp: NaiveDate::from_ymd_opt(2025, 4, 1)
                .and_then(|d| d.and_hms_opt(4, 0, 26)),
            status: VehicleStatus::parse(status),
            speed: None,
            odometer: None,
            latitude: None,
            longitude: None,
            trip_number: 0,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_status_parse_known_tags() {
        assert_eq!(VehicleStatus::parse("Start up"), VehicleStatus::StartUp);
        assert_eq!(VehicleStatus::parse("Ignition off"), VehicleStatus::IgnitionOff);
        assert_eq!(VehicleStatus::parse("Harsh Braking"), VehicleStatus::HarshBraking);
        assert_eq!(
            VehicleStatus::parse("Speed Violation"),
            VehicleStatus::SpeedViolation
        );
        assert_eq!(
            VehicleStatus::parse("Health Check; (Ignition off)"),
            VehicleStatus::HealthCheckIgnitionOff
        );
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert_eq!(
            VehicleStatus::parse("start up"),
            VehicleStatus::Other("start up".to_string())
        );
    }

    #[test]
    fn test_status_other_round_trips_verbatim() {
        let status = VehicleStatus::parse("Idle; Engine On");
        assert_eq!(status.as_str(), "Idle; Engine On");
        assert_eq!(status.to_string(), "Idle; Engine On");
    }

    #[test]
    fn test_status_serde_uses_report_string() {
        let json = serde_json::to_string(&VehicleStatus::HarshBraking).unwrap();
        assert_eq!(json, r#""Harsh Braking""#);
        let back: VehicleStatus = serde_json::from_str(r#""Ignition off""#).unwrap();
        assert_eq!(back, VehicleStatus::IgnitionOff);
    }

    #[test]
    fn test_record_hour() {
        assert_eq!(record("Start up").hour(), Some(4));
        let mut r = record("Start up");
        r.timestamp = None;
        assert_eq!(r.hour(), None);
    }

    #[test]
    fn test_record_coordinates_require_both() {
        let mut r = record("Speed Violation");
        assert!(r.coordinates().is_none());
        r.latitude = Some(-26.2);
        assert!(r.coordinates().is_none());
        r.longitude = Some(28.04);
        assert_eq!(r.coordinates(), Some((-26.2, 28.04)));
    }
}
