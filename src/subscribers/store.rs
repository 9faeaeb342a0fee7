//! Durable subscriber store.
//!
//! This module provides the [`SubscriberStore`] that loads and saves the
//! subscriber collection as one JSON file. Every write goes through a temporary
//! file in the same directory which is synced then renamed over the store, so
//! a crash never leaves a truncated store behind.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

use crate::alerts::{AlertKind, AlertSetting};
use crate::subscribers::{PendingChanges, Subscriber, endpoint_of, normalize, to_record};

/// Failure to read or write the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("{0} holds neither a list nor a map of subscribers")]
    MalformedRoot(String),
    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),
}

/// Content of the store file.
#[derive(Debug, Default)]
struct Stored {
    subscribers: Vec<Subscriber>,
    /// Records without a usable subscription, written back verbatim
    unrecognized: Vec<Value>,
    /// Later records of an already loaded endpoint, written back verbatim
    duplicates: Vec<(String, Value)>,
}

/// Handles loading and persisting subscribers to disk.
///
/// Clones share the same lock, so every read-modify-write of the file made
/// through any clone is serialized. Records that are not usable subscribers,
/// such as records written by a newer version, are kept in the file.
///
/// # Examples
///
/// ```no_run
/// let store = SubscriberStore::new("data/subscriptions.json");
/// let subscribers = store.load_all().await?;
/// store.remove(&subscribers[0].endpoint).await?;
/// ```
#[derive(Clone, Debug)]
pub struct SubscriberStore {
    /// Path to the JSON file where subscribers are stored.
    path: PathBuf,
    /// Serializes read-modify-write sequences.
    lock: Arc<Mutex<()>>,
}

impl SubscriberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SubscriberStore {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every subscriber.
    ///
    /// A missing store is an empty store. An unreadable or corrupt store is an
    /// error, so callers never overwrite data they could not read.
    pub async fn load_all(&self) -> Result<Vec<Subscriber>, StoreError> {
        Ok(self.read().await?.subscribers)
    }

    async fn read(&self) -> Result<Stored, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no subscribers stored at {}", self.path.display());
                return Ok(Stored::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            warn!("{} is empty", self.path.display());
            return Ok(Stored::default());
        }

        let root: Value = serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;

        let records: Vec<&Value> = match &root {
            Value::Array(records) => records.iter().collect(),
            Value::Object(records) => records.values().collect(),
            _ => return Err(StoreError::MalformedRoot(self.path.display().to_string())),
        };

        let mut endpoints = HashSet::new();
        let mut stored = Stored::default();
        for record in records {
            let Some(subscriber) = normalize(record) else {
                stored.unrecognized.push(record.clone());
                continue;
            };
            if !endpoints.insert(subscriber.endpoint.clone()) {
                warn!("ignoring duplicate subscriber {}", subscriber.endpoint);
                stored.duplicates.push((subscriber.endpoint, record.clone()));
                continue;
            }
            stored.subscribers.push(subscriber);
        }

        debug!(
            "loaded {} subscribers, {} records kept as is",
            stored.subscribers.len(),
            stored.unrecognized.len() + stored.duplicates.len()
        );

        Ok(stored)
    }

    /// Writes the pending changes of poll cycles.
    ///
    /// The store is re-read under the lock so registrations made since the
    /// cycle loaded it are kept.
    pub async fn commit(&self, pending: &PendingChanges) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let mut stored = self.read().await?;
        pending.apply_to(&mut stored.subscribers);
        self.save_all(&stored).await?;

        info!("committed subscriber changes");

        Ok(())
    }

    /// Registers a push subscription, or updates the settings of an existing one.
    ///
    /// Gate state is kept on update. Settings are merged over the current ones,
    /// kind by kind.
    ///
    /// # Returns
    ///
    /// `true` when a new subscriber was created.
    pub async fn upsert(
        &self,
        subscription: Value,
        settings: Option<Value>,
    ) -> Result<bool, StoreError> {
        let endpoint = endpoint_of(&subscription).ok_or_else(|| {
            StoreError::InvalidSubscription("subscription has no endpoint".to_owned())
        })?;

        let _guard = self.lock.lock().await;
        let mut stored = self.read().await?;
        let subscribers = &mut stored.subscribers;

        let created = match subscribers.iter().position(|s| s.endpoint == endpoint) {
            Some(index) => {
                subscribers[index].subscription = subscription;
                false
            }
            None => {
                subscribers.push(Subscriber::new(endpoint.clone(), subscription));
                true
            }
        };

        if let Some(settings) = settings {
            let Some(settings) = settings.as_object() else {
                return Err(StoreError::InvalidSubscription(
                    "settings must be an object".to_owned(),
                ));
            };
            if let Some(subscriber) = subscribers.iter_mut().find(|s| s.endpoint == endpoint) {
                apply_settings(subscriber, settings);
            }
        }

        self.save_all(&stored).await?;

        info!(
            "{} subscriber {}",
            if created { "registered" } else { "updated" },
            endpoint
        );

        Ok(created)
    }

    /// Removes a subscriber.
    ///
    /// # Returns
    ///
    /// `true` when the endpoint was registered.
    pub async fn remove(&self, endpoint: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read().await?;

        let count = stored.subscribers.len();
        stored.subscribers.retain(|s| s.endpoint != endpoint);
        if stored.subscribers.len() == count {
            return Ok(false);
        }

        self.save_all(&stored).await?;
        info!("removed subscriber {}", endpoint);

        Ok(true)
    }

    /// Clears the once flag of one kind, or of every kind, so a `once` alert
    /// can fire again. The last dispatch time is kept.
    ///
    /// # Returns
    ///
    /// `false` when the endpoint is not registered.
    pub async fn reset_once(
        &self,
        endpoint: &str,
        kind: Option<AlertKind>,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut stored = self.read().await?;

        let Some(subscriber) = stored
            .subscribers
            .iter_mut()
            .find(|s| s.endpoint == endpoint)
        else {
            return Ok(false);
        };

        for (state_kind, state) in subscriber.state.iter_mut() {
            if kind.is_none_or(|kind| kind == *state_kind) {
                state.once_fired = false;
            }
        }

        self.save_all(&stored).await?;
        info!("reset once flags of {}", endpoint);

        Ok(true)
    }

    /// Atomically replaces the store with `stored`, through a synced
    /// temporary file renamed over it.
    ///
    /// This is a blind write: callers hold the store lock across the read
    /// that produced `stored`. Duplicates of an endpoint that is no longer
    /// registered are dropped with it.
    async fn save_all(&self, stored: &Stored) -> Result<(), StoreError> {
        let io_error = |source: std::io::Error| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let registered: HashSet<&str> = stored
            .subscribers
            .iter()
            .map(|subscriber| subscriber.endpoint.as_str())
            .collect();
        let records: Vec<Value> = stored
            .subscribers
            .iter()
            .map(to_record)
            .chain(stored.unrecognized.iter().cloned())
            .chain(
                stored
                    .duplicates
                    .iter()
                    .filter(|(endpoint, _)| registered.contains(endpoint.as_str()))
                    .map(|(_, record)| record.clone()),
            )
            .collect();
        let serialized = serde_json::to_vec_pretty(&records).map_err(|source| StoreError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let mut file = fs::File::create(&tmp_path).await.map_err(io_error)?;
        file.write_all(&serialized).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            error!("failed to replace {}: {}", self.path.display(), e);
            let _ = fs::remove_file(&tmp_path).await;
            return Err(io_error(e));
        }

        debug!("persisted {} subscribers", stored.subscribers.len());

        Ok(())
    }
}

/// Merges registration settings over the current ones.
fn apply_settings(subscriber: &mut Subscriber, settings: &serde_json::Map<String, Value>) {
    for (key, value) in settings {
        match key.parse::<AlertKind>() {
            Ok(kind) => {
                let mut merged = subscriber.setting(kind).to_value(kind);
                if let (Some(merged), Some(value)) = (merged.as_object_mut(), value.as_object()) {
                    for (field, field_value) in value {
                        merged.insert(field.clone(), field_value.clone());
                    }
                    // An explicit threshold key overrides the persisted alias
                    if value.contains_key("threshold") != value.contains_key("severity") {
                        let given = if value.contains_key("threshold") {
                            "threshold"
                        } else {
                            "severity"
                        };
                        if let Some(threshold) = value.get(given).cloned() {
                            merged.insert(kind.threshold_key().to_owned(), threshold);
                        }
                    }
                }
                subscriber
                    .settings
                    .insert(kind, AlertSetting::from_value(kind, &merged));
            }
            Err(_) => {
                subscriber.extra_settings.insert(key.clone(), value.clone());
            }
        }
    }
}
