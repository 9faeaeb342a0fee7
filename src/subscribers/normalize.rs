//! Migration of persisted records to [`Subscriber`].
//!
//! Records were written by several versions of the dashboard. All the
//! versioning logic lives here so the rest of the engine only sees normalized
//! subscribers:
//!
//! ```json
//! {
//!   "subscription": { "endpoint": "https://fcm.googleapis.com/...", "keys": { ... } },
//!   "settings": { "co2": { "enabled": true, "threshold": 1000, "cooldown": 3600, "once": false } },
//!   "state": { "co2": { "lastSentEpoch": 1718000000, "onceFired": false } }
//! }
//! ```
//!
//! The oldest records are a bare push subscription (`{"endpoint": ..., "keys": ...}`)
//! without settings nor state.

use log::warn;
use serde_json::{Map, Value};

use crate::alerts::{AlertKind, AlertSetting, AlertState};
use crate::subscribers::Subscriber;

const SUBSCRIPTION: &str = "subscription";
const SETTINGS: &str = "settings";
const STATE: &str = "state";

/// Normalizes a persisted record, or returns `None` when it has no endpoint.
pub fn normalize(record: &Value) -> Option<Subscriber> {
    let Some(object) = record.as_object() else {
        warn!("ignoring malformed subscriber record {}", record);
        return None;
    };

    let Some(subscription) = object.get(SUBSCRIPTION) else {
        // Bare subscription written before settings existed
        let endpoint = endpoint_of(record)?;
        return Some(Subscriber::new(endpoint, record.clone()));
    };

    let endpoint = endpoint_of(subscription)?;
    let mut subscriber = Subscriber::new(endpoint, subscription.clone());

    if let Some(settings) = object.get(SETTINGS).and_then(Value::as_object) {
        for (key, value) in settings {
            match kind_of(key) {
                Some(kind) => {
                    subscriber
                        .settings
                        .insert(kind, AlertSetting::from_value(kind, value));
                }
                None => {
                    subscriber.extra_settings.insert(key.clone(), value.clone());
                }
            }
        }
    }

    if let Some(state) = object.get(STATE).and_then(Value::as_object) {
        for (key, value) in state {
            match kind_of(key) {
                Some(kind) => {
                    subscriber.state.insert(kind, AlertState::from_value(value));
                }
                None => {
                    subscriber.extra_state.insert(key.clone(), value.clone());
                }
            }
        }
    }

    subscriber.extra = object
        .iter()
        .filter(|(key, _)| ![SUBSCRIPTION, SETTINGS, STATE].contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(subscriber)
}

/// Serializes a subscriber in the current record format.
pub fn to_record(subscriber: &Subscriber) -> Value {
    let mut settings = subscriber.extra_settings.clone();
    for (kind, setting) in &subscriber.settings {
        settings.insert(kind.as_str().to_owned(), setting.to_value(*kind));
    }

    let mut state = subscriber.extra_state.clone();
    for (kind, alert_state) in &subscriber.state {
        state.insert(kind.as_str().to_owned(), alert_state.to_value());
    }

    let mut record: Map<String, Value> = subscriber.extra.clone();
    record.insert(SUBSCRIPTION.to_owned(), subscriber.subscription.clone());
    record.insert(SETTINGS.to_owned(), Value::Object(settings));
    record.insert(STATE.to_owned(), Value::Object(state));

    Value::Object(record)
}

/// Endpoint of a push subscription.
pub fn endpoint_of(subscription: &Value) -> Option<String> {
    match subscription.get("endpoint").and_then(Value::as_str) {
        Some(endpoint) if !endpoint.is_empty() => Some(endpoint.to_owned()),
        _ => {
            warn!("ignoring subscription without endpoint {}", subscription);
            None
        }
    }
}

fn kind_of(key: &str) -> Option<AlertKind> {
    AlertKind::ALL.into_iter().find(|kind| kind.as_str() == key)
}
