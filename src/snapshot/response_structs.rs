//! Response structures for the dashboard backend API.
//!
//! Every field is optional and lenient: the backend reports unavailable sensors
//! as `null` and a few fields changed names across versions.

use serde::Deserialize;
use serde_json::Value;

/// Response of `/api/current`.
#[derive(Deserialize, Debug, Default)]
pub struct OutdoorResponse {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    #[serde(alias = "dewPoint")]
    pub dew_point: Option<f64>,
    #[serde(default, alias = "warnings")]
    pub sensor_warnings: Vec<String>,
}

/// Response of `/api/indoor`.
#[derive(Deserialize, Debug, Default)]
pub struct IndoorResponse {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub eco2: Option<f64>,
    /// Older backends report eCO2 as `co2`
    pub co2: Option<f64>,
    pub tvoc: Option<f64>,
    #[serde(default, alias = "warnings")]
    pub air_quality_warnings: Vec<String>,
}

/// Response of `/api/aurora`.
///
/// On upstream failure the backend answers with zeroes and the description
/// `Data Unavailable`.
#[derive(Deserialize, Debug, Default)]
pub struct AuroraResponse {
    pub probability: Option<f64>,
    pub kp_index: Option<f64>,
    /// Older backends report the index as `kp`
    pub kp: Option<f64>,
    pub description: Option<String>,
}

/// Response of `/api/smhi`.
#[derive(Deserialize, Debug, Default)]
pub struct WarningsResponse {
    #[serde(default)]
    pub warnings: Vec<WarningResponse>,
    /// Set when the backend could not reach the warning service
    pub error: Option<String>,
}

/// One warning of `/api/smhi`.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct WarningResponse {
    /// Numeric level, 1 to 3
    pub severity: Option<Value>,
    /// Level name such as `gul` or `orange`
    pub level: Option<String>,
    pub event: Option<String>,
    pub description: Option<String>,
    pub headline: Option<String>,
    pub area: Option<String>,
}
