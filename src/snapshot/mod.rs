//! Dashboard backend integration.
//!
//! This module fetches the readings alerts are evaluated against and bundles
//! them into one immutable [`Snapshot`] per poll cycle.
//!
//! # Modules
//!
//! - `requester` - HTTP client for the dashboard backend API
//! - `response_structs` - Internal data structures for API responses
//! - `structs` - Public data structures representing a snapshot
//! - `sync` - Capture of a snapshot from all sources

mod requester;
mod response_structs;
mod structs;
mod sync;

pub use crate::snapshot::requester::{BackendRequester, SnapshotRequester};
#[cfg(test)]
pub use crate::snapshot::requester::MockSnapshotRequester;
#[cfg(test)]
pub use crate::snapshot::response_structs::{
    AuroraResponse, IndoorResponse, OutdoorResponse, WarningsResponse,
};
pub use crate::snapshot::structs::{Observation, OfficialWarning, Snapshot};
#[cfg(test)]
pub use crate::snapshot::structs::{Aurora, Indoor, Severity};
pub use crate::snapshot::sync::SnapshotSync;
