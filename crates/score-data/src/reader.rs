//! CSV loading for movement reports.
//!
//! Reads the telematics export into [`RawRow`] maps (header → cell text) for
//! the preprocessor. Only a missing or unreadable file is fatal.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use score_core::error::{Result, ScoreError};
use tracing::{debug, warn};

/// One CSV row keyed by (whitespace-trimmed) header name.
pub type RawRow = HashMap<String, String>;

// ── Public API ────────────────────────────────────────────────────────────────

/// Load every row of the movement report at `path`.
///
/// Malformed rows are logged and skipped; the rest of the file is kept in
/// source order.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).map_err(|source| ScoreError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows(file)?;
    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse CSV rows from any reader. The first record is the header.
///
/// Cells are decoded lossily so that stray non-UTF-8 bytes in free-text
/// columns do not cost the whole row.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    let mut skipped = 0usize;

    for (index, record) in csv_reader.byte_records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed CSV row {}: {}", index + 1, e);
                skipped += 1;
                continue;
            }
        };
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect();
        rows.push(row);
    }

    if skipped > 0 {
        debug!("{} malformed rows skipped", skipped);
    }

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_load_rows_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "report.csv",
            &[
                "VehicleStatus,Report Group Date,MOBILESPEED,MOBILEODO,Location",
                "Start up,4/1/2025 4:00:26 AM,0,1200.5,\"Long: 28.0473. Lat: -26.2041\"",
                "Ignition off,4/1/2025 4:30:00 AM,0,1210.0,\"Long: 28.1. Lat: -26.3\"",
            ],
        );

        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["VehicleStatus"], "Start up");
        assert_eq!(rows[0]["Location"], "Long: 28.0473. Lat: -26.2041");
        assert_eq!(rows[1]["MOBILEODO"], "1210.0");
    }

    #[test]
    fn test_load_rows_missing_file_is_error() {
        let err = load_rows(Path::new("/tmp/does-not-exist-fleet-score-xyz.csv")).unwrap_err();
        assert!(matches!(err, ScoreError::FileRead { .. }));
    }

    #[test]
    fn test_read_rows_trims_headers() {
        let data = " VehicleStatus ,  MOBILESPEED \nSpeed Violation,88\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["VehicleStatus"], "Speed Violation");
        assert_eq!(rows[0]["MOBILESPEED"], "88");
    }

    #[test]
    fn test_read_rows_short_rows_are_kept() {
        let data = "VehicleStatus,MOBILESPEED,MOBILEODO\nStart up,0\nIgnition off,0,15\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[0].contains_key("MOBILEODO"));
        assert_eq!(rows[1]["MOBILEODO"], "15");
    }

    #[test]
    fn test_read_rows_empty_input() {
        let rows = read_rows("".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_read_rows_header_only() {
        let rows = read_rows("VehicleStatus,MOBILESPEED\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_read_rows_lossy_utf8() {
        let mut data = b"VehicleStatus,Driver\nStart up,Jos".to_vec();
        data.push(0xe9);
        data.extend_from_slice(b"\n");
        let rows = read_rows(data.as_slice()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["VehicleStatus"], "Start up");
        assert!(rows[0]["Driver"].starts_with("Jos"));
    }
}
