//! Posted speed-limit resolution through a reverse-geocoding service.
//!
//! [`SpeedLimitLookup`] is the seam the speed analyzer depends on;
//! [`HttpSpeedLimitClient`] is the blocking HTTP implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use score_core::settings::LookupSettings;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const KMH_PER_MPH: f64 = 1.609_344;

/// Failures while resolving a speed limit. All of them are non-fatal for the
/// run: the affected violation is left unscored.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Transport-level failure (connect, timeout, TLS, ...).
    #[error("speed-limit request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("speed-limit service returned HTTP {0}")]
    Status(u16),

    /// The response body was not the expected JSON shape.
    #[error("could not decode speed-limit response: {0}")]
    Decode(#[source] reqwest::Error),

    /// The violation has no coordinates to look up.
    #[error("record has no coordinates")]
    MissingCoordinates,

    /// The configured endpoint is not an absolute http(s) URL.
    #[error("invalid speed-limit endpoint: {0}")]
    Url(String),
}

/// Resolves the posted speed limit (km/h) nearest to a coordinate.
pub trait SpeedLimitLookup {
    /// `Ok(None)` means the service had no usable limit for this location.
    fn speed_limit(&self, latitude: f64, longitude: f64) -> Result<Option<f64>, LookupError>;
}

// ── Response shape ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct RevGeocodeResponse {
    #[serde(default)]
    items: Vec<RevGeocodeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevGeocodeItem {
    #[serde(default)]
    navigation_attributes: Option<NavigationAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavigationAttributes {
    #[serde(default)]
    speed_limits: Vec<SpeedLimitAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedLimitAttribute {
    #[serde(default)]
    max_speed: Option<f64>,
    #[serde(default)]
    speed_unit: Option<String>,
}

impl RevGeocodeResponse {
    /// Maximum speed of the top-ranked match, converted to km/h.
    pub(crate) fn top_speed_limit(&self) -> Option<f64> {
        let attr = self
            .items
            .first()?
            .navigation_attributes
            .as_ref()?
            .speed_limits
            .iter()
            .find(|s| s.max_speed.is_some())?;
        let max_speed = attr.max_speed?;
        if !max_speed.is_finite() || max_speed <= 0.0 {
            return None;
        }
        match attr.speed_unit.as_deref() {
            Some(unit) if unit.eq_ignore_ascii_case("mph") => Some(max_speed * KMH_PER_MPH),
            _ => Some(max_speed),
        }
    }
}

// ── HttpSpeedLimitClient ──────────────────────────────────────────────────────

/// Blocking HTTP client for the reverse-geocoding speed-limit lookup.
#[derive(Debug, Clone)]
pub struct HttpSpeedLimitClient {
    client: Client,
    settings: LookupSettings,
}

impl HttpSpeedLimitClient {
    pub fn new(settings: LookupSettings) -> Result<Self, LookupError> {
        let endpoint = reqwest::Url::parse(&settings.endpoint)
            .map_err(|e| LookupError::Url(format!("{}: {}", settings.endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LookupError::Url(settings.endpoint.clone()));
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }

    fn query_pairs(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("at", format!("{},{}", latitude, longitude)),
            (
                "in",
                format!(
                    "circle:{},{};r={}",
                    latitude, longitude, self.settings.search_radius_m
                ),
            ),
            ("limit", self.settings.result_limit.to_string()),
            ("types", "street".to_string()),
            ("showNavAttributes", "speedLimits".to_string()),
            ("apiKey", self.settings.api_key.clone()),
        ]
    }
}

impl SpeedLimitLookup for HttpSpeedLimitClient {
    fn speed_limit(&self, latitude: f64, longitude: f64) -> Result<Option<f64>, LookupError> {
        let response = self
            .client
            .get(&self.settings.endpoint)
            .query(&self.query_pairs(latitude, longitude))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let parsed: RevGeocodeResponse = response.json().map_err(LookupError::Decode)?;
        let limit = parsed.top_speed_limit();
        debug!(
            "Speed limit at ({}, {}): {:?}",
            latitude, longitude, limit
        );
        Ok(limit)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> RevGeocodeResponse {
        serde_json::from_str(json).unwrap()
    }

    fn settings() -> LookupSettings {
        LookupSettings {
            endpoint: "http://127.0.0.1:9/revgeocode".to_string(),
            api_key: "secret".to_string(),
            search_radius_m: 50,
            result_limit: 1,
        }
    }

    #[test]
    fn test_top_speed_limit_kph() {
        let resp = parse(
            r#"{"items":[{"title":"Main Rd","navigationAttributes":{"speedLimits":[
                {"maxSpeed":60,"direction":"N","speedUnit":"kph"}]}}]}"#,
        );
        assert_eq!(resp.top_speed_limit(), Some(60.0));
    }

    #[test]
    fn test_top_speed_limit_mph_converted() {
        let resp = parse(
            r#"{"items":[{"navigationAttributes":{"speedLimits":[
                {"maxSpeed":50,"speedUnit":"mph"}]}}]}"#,
        );
        let limit = resp.top_speed_limit().unwrap();
        assert!((limit - 80.4672).abs() < 1e-9);
    }

    #[test]
    fn test_top_speed_limit_uses_top_item_only() {
        let resp = parse(
            r#"{"items":[{"title":"no attrs"},
                {"navigationAttributes":{"speedLimits":[{"maxSpeed":120}]}}]}"#,
        );
        assert_eq!(resp.top_speed_limit(), None);
    }

    #[test]
    fn test_top_speed_limit_skips_entries_without_max_speed() {
        let resp = parse(
            r#"{"items":[{"navigationAttributes":{"speedLimits":[
                {"direction":"S"},{"maxSpeed":80}]}}]}"#,
        );
        assert_eq!(resp.top_speed_limit(), Some(80.0));
    }

    #[test]
    fn test_top_speed_limit_empty_and_invalid() {
        assert_eq!(parse(r#"{"items":[]}"#).top_speed_limit(), None);
        assert_eq!(parse(r#"{}"#).top_speed_limit(), None);
        let zero = parse(r#"{"items":[{"navigationAttributes":{"speedLimits":[{"maxSpeed":0}]}}]}"#);
        assert_eq!(zero.top_speed_limit(), None);
    }

    #[test]
    fn test_query_pairs() {
        let client = HttpSpeedLimitClient::new(settings()).unwrap();
        let pairs = client.query_pairs(-26.2041, 28.0473);
        assert_eq!(pairs[0], ("at", "-26.2041,28.0473".to_string()));
        assert_eq!(pairs[1], ("in", "circle:-26.2041,28.0473;r=50".to_string()));
        assert!(pairs.contains(&("limit", "1".to_string())));
        assert!(pairs.contains(&("types", "street".to_string())));
        assert!(pairs.contains(&("showNavAttributes", "speedLimits".to_string())));
        assert!(pairs.contains(&("apiKey", "secret".to_string())));
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let mut bad = settings();
        bad.endpoint = "not a url".to_string();
        assert!(matches!(HttpSpeedLimitClient::new(bad), Err(LookupError::Url(_))));

        let mut ftp = settings();
        ftp.endpoint = "ftp://example.com/revgeocode".to_string();
        assert!(matches!(HttpSpeedLimitClient::new(ftp), Err(LookupError::Url(_))));
    }

    #[test]
    fn test_unreachable_service_is_an_error_not_a_panic() {
        let client = HttpSpeedLimitClient::new(settings()).unwrap();
        let result = client.speed_limit(-26.2, 28.0);
        assert!(matches!(result, Err(LookupError::Http(_))));
    }
}
