use chrono::{NaiveDateTime, TimeDelta};

// ── Minute stepping ───────────────────────────────────────────────────────────

/// The first scan instant for an interval starting at `start`: one second
/// before the first full minute has elapsed (`start + 1m - 1s`).
///
/// Returns `None` only on calendar overflow.
pub fn first_completed_minute(start: NaiveDateTime) -> Option<NaiveDateTime> {
    start.checked_add_signed(TimeDelta::minutes(1) - TimeDelta::seconds(1))
}

/// Iterator over one-minute instants from [`first_completed_minute`] of
/// `start` through `end` inclusive.
///
/// Yields nothing when `end` is before the first instant, which covers
/// `end < start`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use score_core::time_utils::MinuteSteps;
///
/// let day = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
/// let start = day.and_hms_opt(23, 0, 0).unwrap();
/// let end = day.and_hms_opt(23, 2, 0).unwrap();
/// let steps: Vec<_> = MinuteSteps::new(start, end).collect();
/// assert_eq!(steps.len(), 2);
/// assert_eq!(steps[0], day.and_hms_opt(23, 0, 59).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct MinuteSteps {
    next: Option<NaiveDateTime>,
    end: NaiveDateTime,
}

impl MinuteSteps {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            next: first_completed_minute(start),
            end,
        }
    }
}

impl Iterator for MinuteSteps {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add_signed(TimeDelta::minutes(1));
        Some(current)
    }
}

// ── Duration breakdown ────────────────────────────────────────────────────────

/// Whole-unit breakdown of a duration: `(days, hours, minutes)`, with hours
/// in `0..24` and minutes in `0..60`. Seconds are truncated, never rounded.
/// Negative durations yield `(0, 0, 0)`.
///
/// ```
/// use chrono::TimeDelta;
/// use score_core::time_utils::duration_components;
///
/// assert_eq!(duration_components(TimeDelta::seconds(2 * 3600 + 5 * 60 + 59)), (0, 2, 5));
/// assert_eq!(duration_components(TimeDelta::minutes(26 * 60 + 15)), (1, 2, 15));
/// ```
pub fn duration_components(duration: TimeDelta) -> (i64, i64, i64) {
    if duration < TimeDelta::zero() {
        return (0, 0, 0);
    }
    let total_minutes = duration.num_minutes();
    let total_hours = total_minutes / 60;
    (total_hours / 24, total_hours % 24, total_minutes % 60)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
