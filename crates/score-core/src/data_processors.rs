use chrono::NaiveDateTime;
use regex::Regex;
use tracing::trace;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Format of the `Report Group Date` column, e.g. `4/1/2025 4:00:26 AM`.
pub const REPORT_TIME_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Parses the 12-hour local timestamps found in movement reports.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a report timestamp. Surrounding whitespace is ignored.
    ///
    /// Returns `None` for empty or non-conforming values; callers keep the
    /// row and treat the time as invalid.
    pub fn parse_report_time(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        match NaiveDateTime::parse_from_str(s, REPORT_TIME_FORMAT) {
            Ok(ts) => Some(ts),
            Err(e) => {
                trace!("TimestampProcessor: could not parse \"{}\": {}", s, e);
                None
            }
        }
    }
}

// ── LocationExtractor ─────────────────────────────────────────────────────────

/// Coordinates extracted from a `Long: <x>. Lat: <y>` location field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedLocation {
    pub longitude: f64,
    pub latitude: f64,
}

/// Pulls longitude and latitude out of the combined `Location` column.
pub struct LocationExtractor {
    pattern: Regex,
}

impl LocationExtractor {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"Long\s*:\s*([\d.\-]+)\.\s*Lat\s*:\s*([\d.\-]+)")
                .expect("regex is valid"),
        }
    }

    /// Extract the coordinates, or `None` when the field does not match or
    /// either captured number is malformed.
    pub fn extract(&self, field: &str) -> Option<ParsedLocation> {
        let cap = self.pattern.captures(field)?;
        let longitude = parse_coordinate(&cap[1])?;
        let latitude = parse_coordinate(&cap[2])?;
        Some(ParsedLocation {
            longitude,
            latitude,
        })
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// The latitude capture may swallow a sentence-ending dot (`Lat: -26.2.`).
fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim_end_matches('.').parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── NumberParser ──────────────────────────────────────────────────────────────

/// Lenient numeric parsing for CSV cells.
pub struct NumberParser;

impl NumberParser {
    /// Parse a numeric cell. Empty, non-numeric and non-finite values yield
    /// `None`.
    pub fn parse(s: &str) -> Option<f64> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        s.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
