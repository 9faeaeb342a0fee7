//! Utility functions for paths and time.

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

/// Name of the subscriber store inside the data directory.
pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";

/// Joins a directory path with a file or subdirectory name.
///
/// # Examples
///
/// ```
/// let path = get_path("/var/lib/skywatch", "subscriptions.json");
/// assert_eq!(path, PathBuf::from("/var/lib/skywatch/subscriptions.json"));
/// ```
pub fn get_path(dir_path: &str, subdir_path: &str) -> PathBuf {
    [dir_path, subdir_path].iter().collect()
}

/// Current time in seconds since the Unix epoch, with sub-second precision.
pub fn epoch_now() -> Result<f64, anyhow::Error> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs_f64())
}
