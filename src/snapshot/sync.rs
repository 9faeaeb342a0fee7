//! Snapshot capture.
//!
//! This module provides the [`SnapshotSync`] struct that fetches every source
//! once and assembles the [`Snapshot`] a poll cycle is evaluated against.

use futures::join;
use log::{debug, info, warn};
use serde_json::Value;

use crate::snapshot::requester::SnapshotRequester;
use crate::snapshot::response_structs::{
    AuroraResponse, IndoorResponse, OutdoorResponse, WarningResponse, WarningsResponse,
};
use crate::snapshot::structs::{Aurora, Indoor, OfficialWarning, Outdoor, Severity, Snapshot};

/// Description the backend uses when the aurora upstream failed.
const AURORA_UNAVAILABLE: &str = "Data Unavailable";

/// Captures snapshots through a [SnapshotRequester].
///
/// # Examples
///
/// ```no_run
/// let requester = BackendRequester::new("http://localhost:5000", 10)?;
/// let snapshot_sync = SnapshotSync::new(requester);
/// let snapshot = snapshot_sync.capture().await;
/// ```
pub struct SnapshotSync<R: SnapshotRequester> {
    /// Requester to interact with the dashboard backend
    requester: R,
}

impl<R: SnapshotRequester> SnapshotSync<R> {
    /// Create a new [SnapshotSync].
    pub fn new(requester: R) -> Self {
        SnapshotSync { requester }
    }

    /// Fetches all sources concurrently and assembles a [`Snapshot`].
    ///
    /// A failing source is logged once and left out of the snapshot; it never
    /// fails the capture, so alert kinds relying on other sources still work.
    pub async fn capture(&self) -> Snapshot {
        info!("capture snapshot");

        let (outdoor, indoor, aurora, warnings) = join!(
            self.requester.get_outdoor(),
            self.requester.get_indoor(),
            self.requester.get_aurora(),
            self.requester.get_official_warnings(),
        );

        let snapshot = Snapshot {
            outdoor: available("outdoor readings", outdoor).map(convert_outdoor),
            indoor: available("indoor readings", indoor).map(convert_indoor),
            aurora: available("aurora forecast", aurora).and_then(convert_aurora),
            warnings: available("official warnings", warnings).and_then(convert_warnings),
        };

        debug!("captured snapshot {:?}", snapshot);

        snapshot
    }
}

/// Logs a failed source and turns it into `None`.
fn available<T>(source: &str, result: Result<T, anyhow::Error>) -> Option<T> {
    match result {
        Ok(response) => Some(response),
        Err(e) => {
            warn!("{} unavailable: {}", source, e);
            None
        }
    }
}

fn convert_outdoor(response: OutdoorResponse) -> Outdoor {
    Outdoor {
        temperature: response.temperature,
        humidity: response.humidity,
        pressure: response.pressure,
        dew_point: response.dew_point,
        warnings: response.sensor_warnings,
    }
}

fn convert_indoor(response: IndoorResponse) -> Indoor {
    Indoor {
        temperature: response.temperature,
        humidity: response.humidity,
        eco2: response.eco2.or(response.co2),
        tvoc: response.tvoc,
        warnings: response.air_quality_warnings,
    }
}

/// Returns `None` when the backend answered with its placeholder payload.
fn convert_aurora(response: AuroraResponse) -> Option<Aurora> {
    if response.description.as_deref() == Some(AURORA_UNAVAILABLE) {
        warn!("aurora forecast unavailable upstream");
        return None;
    }

    Some(Aurora {
        probability: response.probability,
        kp_index: response.kp_index.or(response.kp),
    })
}

/// Returns `None` when the backend reported a fetch error.
fn convert_warnings(response: WarningsResponse) -> Option<Vec<OfficialWarning>> {
    if let Some(error) = response.error {
        warn!("official warnings unavailable upstream: {}", error);
        return None;
    }

    Some(response.warnings.into_iter().map(convert_warning).collect())
}

fn convert_warning(response: WarningResponse) -> OfficialWarning {
    let severity = match (&response.severity, &response.level) {
        (Some(Value::Number(level)), _) => level.as_f64().map(Severity::from_level),
        (Some(Value::String(level)), _) => level.trim().parse().ok().map(Severity::from_level),
        _ => None,
    }
    .or_else(|| response.level.as_deref().map(Severity::from_name))
    .unwrap_or(Severity::Yellow);

    OfficialWarning {
        severity,
        event: response.event.unwrap_or_default(),
        description: response
            .description
            .or(response.headline)
            .unwrap_or_default(),
        area: response.area.unwrap_or_default(),
    }
}
