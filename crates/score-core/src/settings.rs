use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reverse-geocoding endpoint queried for posted speed limits.
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://revgeocode.search.hereapi.com/v1/revgeocode";

/// Search radius around a violation's coordinates, in metres.
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 50;

/// Number of ranked matches requested from the lookup service.
pub const DEFAULT_RESULT_LIMIT: u32 = 1;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Driver-behaviour penalty scoring for telematics movement reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fleet-score",
    about = "Driver-behaviour penalty scoring for telematics movement reports",
    version
)]
pub struct Settings {
    /// Movement report CSV export
    pub input: PathBuf,

    /// Resolve speed limits through the external lookup service
    #[arg(long)]
    pub lookup: bool,

    /// API key for the speed-limit lookup service
    #[arg(long, env = "FLEET_SCORE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Speed-limit lookup endpoint
    #[arg(long)]
    pub lookup_endpoint: Option<String>,

    /// Lookup search radius in metres
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub search_radius: Option<u32>,

    /// Report output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Store the lookup key, endpoint and radius in the config file
    #[arg(long)]
    pub save_config: bool,
}

/// Resolved connection parameters for the speed-limit lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub endpoint: String,
    pub api_key: String,
    pub search_radius_m: u32,
    pub result_limit: u32,
}

// ── FileConfig ─────────────────────────────────────────────────────────────────

/// Optional defaults read from `~/.fleet-score/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_radius_m: Option<u32>,
}

impl FileConfig {
    /// Default location of the config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".fleet-score").join("config.json")
    }

    /// Load from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and merge the config file underneath them.
    pub fn load() -> Self {
        Self::load_impl(std::env::args_os().collect(), &FileConfig::config_path())
    }

    /// Same as [`Settings::load`] with explicit arguments and config path.
    pub fn load_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let mut settings = Settings::parse_from(args);
        let file = FileConfig::load_from(config_path);

        // CLI and env always win over the file.
        if settings.api_key.is_none() {
            settings.api_key = file.api_key;
        }
        if settings.lookup_endpoint.is_none() {
            settings.lookup_endpoint = file.lookup_endpoint;
        }
        if settings.search_radius.is_none() {
            settings.search_radius = file.search_radius_m;
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.save_config {
            if let Err(e) = settings.file_config().save_to(config_path) {
                warn!("Could not save config to {}: {}", config_path.display(), e);
            }
        }

        settings
    }

    /// The persistable subset of these settings.
    pub fn file_config(&self) -> FileConfig {
        FileConfig {
            api_key: self.api_key.clone(),
            lookup_endpoint: self.lookup_endpoint.clone(),
            search_radius_m: self.search_radius,
        }
    }

    /// Whether the report should be rendered as JSON.
    pub fn json_output(&self) -> bool {
        self.format == "json"
    }

    /// Lookup parameters when the external lookup is requested and usable.
    ///
    /// `--lookup` without an API key logs a warning and yields `None`, which
    /// leaves the run on the fixed fallback limit.
    pub fn lookup_settings(&self) -> Option<LookupSettings> {
        if !self.lookup {
            return None;
        }
        let Some(api_key) = self.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            warn!("--lookup requested but no API key is configured; using the fixed limit");
            return None;
        };
        Some(LookupSettings {
            endpoint: self
                .lookup_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_LOOKUP_ENDPOINT.to_string()),
            api_key,
            search_radius_m: self.search_radius.unwrap_or(DEFAULT_SEARCH_RADIUS_M),
            result_limit: DEFAULT_RESULT_LIMIT,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        FileConfig::config_path_in(tmp.path())
    }

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| (*s).into()).collect()
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["fleet-score", "report.csv"]);
        assert_eq!(settings.input, PathBuf::from("report.csv"));
        assert!(!settings.lookup);
        assert!(settings.lookup_endpoint.is_none());
        assert!(settings.search_radius.is_none());
        assert_eq!(settings.format, "text");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.save_config);
    }

    #[test]
    fn test_settings_cli_flags() {
        let settings = Settings::parse_from([
            "fleet-score",
            "report.csv",
            "--lookup",
            "--api-key",
            "k-123",
            "--search-radius",
            "80",
            "--format",
            "json",
        ]);
        assert!(settings.lookup);
        assert_eq!(settings.api_key.as_deref(), Some("k-123"));
        assert_eq!(settings.search_radius, Some(80));
        assert!(settings.json_output());
    }

    #[test]
    fn test_settings_rejects_unknown_format() {
        let result = Settings::try_parse_from(["fleet-score", "r.csv", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_config_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = FileConfig::load_from(&tmp_config_path(&tmp));
        assert_eq!(loaded, FileConfig::default());
    }

    #[test]
    fn test_file_config_default_when_malformed() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(FileConfig::load_from(&path), FileConfig::default());
    }

    #[test]
    fn test_file_config_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let cfg = FileConfig {
            api_key: Some("file-key".to_string()),
            lookup_endpoint: Some("http://localhost:9000/rev".to_string()),
            search_radius_m: Some(25),
        };
        cfg.save_to(&path).expect("save");
        assert_eq!(FileConfig::load_from(&path), cfg);
    }

    #[test]
    fn test_load_impl_merges_file_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            api_key: Some("file-key".to_string()),
            lookup_endpoint: Some("http://localhost:9000/rev".to_string()),
            search_radius_m: Some(25),
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_impl(args(&["fleet-score", "r.csv", "--lookup"]), &path);
        let lookup = settings.lookup_settings().expect("lookup enabled");
        assert_eq!(lookup.endpoint, "http://localhost:9000/rev");
        assert_eq!(lookup.search_radius_m, 25);
        assert_eq!(lookup.result_limit, 1);
    }

    #[test]
    fn test_load_impl_cli_overrides_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            api_key: Some("file-key".to_string()),
            lookup_endpoint: None,
            search_radius_m: Some(25),
        }
        .save_to(&path)
        .expect("save");

        let settings = Settings::load_impl(
            args(&[
                "fleet-score",
                "r.csv",
                "--lookup",
                "--api-key",
                "cli-key",
                "--search-radius",
                "60",
            ]),
            &path,
        );
        let lookup = settings.lookup_settings().expect("lookup enabled");
        assert_eq!(lookup.api_key, "cli-key");
        assert_eq!(lookup.search_radius_m, 60);
        assert_eq!(lookup.endpoint, DEFAULT_LOOKUP_ENDPOINT);
    }

    #[test]
    fn test_load_impl_save_config_persists_merged_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        FileConfig {
            api_key: None,
            lookup_endpoint: Some("http://localhost:9000/rev".to_string()),
            search_radius_m: None,
        }
        .save_to(&path)
        .expect("save");

        Settings::load_impl(
            args(&[
                "fleet-score",
                "r.csv",
                "--api-key",
                "cli-key",
                "--search-radius",
                "40",
                "--save-config",
            ]),
            &path,
        );

        let saved = FileConfig::load_from(&path);
        assert_eq!(saved.api_key.as_deref(), Some("cli-key"));
        assert_eq!(saved.lookup_endpoint.as_deref(), Some("http://localhost:9000/rev"));
        assert_eq!(saved.search_radius_m, Some(40));
    }

    #[test]
    fn test_load_impl_without_save_config_leaves_file_alone() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        Settings::load_impl(args(&["fleet-score", "r.csv", "--api-key", "k"]), &path);
        assert!(!path.exists());
    }

    #[test]
    fn test_load_impl_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_impl(
            args(&["fleet-score", "r.csv", "--debug"]),
            &tmp_config_path(&tmp),
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_lookup_settings_disabled_without_flag() {
        let settings = Settings::parse_from(["fleet-score", "r.csv", "--api-key", "k"]);
        assert!(settings.lookup_settings().is_none());
    }

    #[test]
    fn test_lookup_settings_disabled_without_key() {
        let mut settings = Settings::parse_from(["fleet-score", "r.csv", "--lookup"]);
        settings.api_key = None;
        assert!(settings.lookup_settings().is_none());
        settings.api_key = Some("   ".to_string());
        assert!(settings.lookup_settings().is_none());
    }
}
