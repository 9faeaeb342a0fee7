//! HTTP client for the weather dashboard backend.
//!
//! This module provides the [`BackendRequester`] struct that fetches the
//! current readings the notifier evaluates alerts against.

use std::time::Duration;

use log::{debug, info};
use mockall::automock;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::snapshot::response_structs::{
    AuroraResponse, IndoorResponse, OutdoorResponse, WarningsResponse,
};

/// Trait for fetching the readings making up a snapshot.
///
/// This trait abstracts the HTTP operations for easier testing with mocks.
#[automock]
pub trait SnapshotRequester {
    /// Fetches the latest outdoor sensor readings.
    async fn get_outdoor(&self) -> Result<OutdoorResponse, anyhow::Error>;
    /// Fetches the latest indoor sensor readings.
    async fn get_indoor(&self) -> Result<IndoorResponse, anyhow::Error>;
    /// Fetches the aurora forecast and K index.
    async fn get_aurora(&self) -> Result<AuroraResponse, anyhow::Error>;
    /// Fetches the current official weather warnings.
    async fn get_official_warnings(&self) -> Result<WarningsResponse, anyhow::Error>;
}

/// HTTP client requesting the dashboard backend.
///
/// # Examples
///
/// ```no_run
/// let requester = BackendRequester::new("http://localhost:5000", 10)?;
/// let indoor = requester.get_indoor().await?;
/// println!("eCO2: {:?}", indoor.eco2);
/// ```
pub struct BackendRequester {
    /// Backend base url, without trailing slash
    url: String,
    /// HTTP client
    client: Client,
}

impl BackendRequester {
    /// Create a new [BackendRequester].
    ///
    /// # Arguments
    ///
    /// * `url` - The base URL of the dashboard backend.
    /// * `timeout` - Timeout of every request, in seconds.
    pub fn new(url: &str, timeout: u64) -> Result<Self, anyhow::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()?;

        Ok(BackendRequester {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Requests `path` and deserializes its JSON body.
    ///
    /// Non success statuses are errors.
    async fn get_json<T: DeserializeOwned + std::fmt::Debug>(
        &self,
        path: &str,
    ) -> Result<T, anyhow::Error> {
        let url = format!("{}{}", &self.url, path);
        debug!("request {}", &url);

        let response: T = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!("response from {} -> {:?}", &url, &response);

        Ok(response)
    }
}

impl SnapshotRequester for BackendRequester {
    /// Request `/api/current`.
    ///
    /// ```text
    /// { "temperature": -3.2, "humidity": 81.0, "pressure": 1012.4,
    ///   "dew_point": -5.9, "sensor_warnings": ["frost"] }
    /// ```
    async fn get_outdoor(&self) -> Result<OutdoorResponse, anyhow::Error> {
        info!("request outdoor readings");
        self.get_json("/api/current").await
    }

    /// Request `/api/indoor`.
    ///
    /// ```text
    /// { "temperature": 21.4, "humidity": 28.0, "eco2": 912, "tvoc": 140,
    ///   "air_quality_warnings": ["low_humidity"] }
    /// ```
    async fn get_indoor(&self) -> Result<IndoorResponse, anyhow::Error> {
        info!("request indoor readings");
        self.get_json("/api/indoor").await
    }

    /// Request `/api/aurora`.
    ///
    /// ```text
    /// { "kp_index": 5.3, "probability": 42, "description": "Strong Storm", ... }
    /// ```
    async fn get_aurora(&self) -> Result<AuroraResponse, anyhow::Error> {
        info!("request aurora forecast");
        self.get_json("/api/aurora").await
    }

    /// Request `/api/smhi`.
    ///
    /// ```text
    /// { "warnings": [{ "severity": 2, "level": "orange", "event": "Snöfall",
    ///                  "description": "...", "area": "Dalarna" }], "count": 1 }
    /// ```
    async fn get_official_warnings(&self) -> Result<WarningsResponse, anyhow::Error> {
        info!("request official warnings");
        self.get_json("/api/smhi").await
    }
}
