use chrono::NaiveDateTime;

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use score_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Nudge by an epsilon at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // "0.50" -> ".50"
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative && result.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a distance in kilometres, rounded to the nearest whole km.
///
/// ```
/// use score_core::formatting::format_distance_km;
///
/// assert_eq!(format_distance_km(2345.6), "2,346 km");
/// ```
pub fn format_distance_km(km: f64) -> String {
    format!("{} km", format_number(km, 0))
}

/// Format an hours/minutes breakdown as `"3h:05m"`.
///
/// ```
/// use score_core::formatting::format_hours_minutes;
///
/// assert_eq!(format_hours_minutes(3, 5), "3h:05m");
/// assert_eq!(format_hours_minutes(0, 42), "0h:42m");
/// ```
pub fn format_hours_minutes(hours: i64, minutes: i64) -> String {
    format!("{}h:{:02}m", hours, minutes)
}

/// Format a speed in km/h without trailing zeros for whole values.
pub fn format_speed(kmh: f64) -> String {
    if kmh.fract() == 0.0 {
        format!("{:.0} km/h", kmh)
    } else {
        format!("{:.1} km/h", kmh)
    }
}

/// Format a signed speed difference, keeping one decimal only when the
/// value is fractional.
///
/// ```
/// use score_core::formatting::format_speed_delta;
///
/// assert_eq!(format_speed_delta(10.0), "+10");
/// assert_eq!(format_speed_delta(9.5), "+9.5");
/// assert_eq!(format_speed_delta(-20.0), "-20");
/// ```
pub fn format_speed_delta(delta: f64) -> String {
    if delta.fract() == 0.0 {
        format!("{:+.0}", delta)
    } else {
        format!("{:+.1}", delta)
    }
}

/// Format an optional report timestamp; invalid times render as `"NaT"`.
pub fn format_timestamp(ts: Option<NaiveDateTime>) -> String {
    match ts {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "NaT".to_string(),
    }
}

/// Format an optional coordinate to six decimals; absent renders as `"-"`.
pub fn format_coordinate(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => "-".to_string(),
    }
}

/// Singular/plural "point(s)" suffix.
pub fn format_points(points: u32) -> String {
    if points == 1 {
        "1 point".to_string()
    } else {
        format!("{} points", points)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
