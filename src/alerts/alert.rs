//! Per-subscriber configuration and bookkeeping for one alert kind.
//!
//! [`AlertSetting`] is what the subscriber asked for, [`AlertState`] is what the
//! gate remembers about past notifications. Both are read from loosely shaped
//! persisted JSON, so parsing is lenient: known fields are picked out, anything
//! else is kept aside and written back untouched.

use log::warn;
use serde_json::{Map, Value};

use crate::alerts::AlertKind;

/// Notification preferences of one subscriber for one [`AlertKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct AlertSetting {
    /// Whether the subscriber wants this kind at all.
    pub enabled: bool,
    /// Threshold of the reading, or minimum severity level for warnings.
    pub threshold: f64,
    /// Minimum number of seconds between two dispatched notifications.
    pub cooldown: u64,
    /// Fire at most once, until the once flag is reset.
    pub once: bool,
    /// Keys this version does not know about.
    pub extra: Map<String, Value>,
}

/// What the gate remembers for one subscriber and one [`AlertKind`].
///
/// Only mutated when a notification is actually dispatched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertState {
    /// Epoch seconds of the last dispatched notification.
    pub last_sent: Option<f64>,
    /// Set after the first dispatch of a `once` setting.
    pub once_fired: bool,
    /// Keys this version does not know about.
    pub extra: Map<String, Value>,
}

impl AlertSetting {
    /// Builds the setting of `kind` from a persisted value, falling back to the
    /// kind default for every missing or malformed field.
    ///
    /// The threshold is accepted under both `threshold` and `severity`, the key
    /// matching [`AlertKind::threshold_key`] taking precedence.
    pub fn from_value(kind: AlertKind, value: &Value) -> Self {
        let mut setting = kind.default_setting();

        let Some(object) = value.as_object() else {
            warn!("ignoring malformed {} setting {}, using defaults", kind, value);
            return setting;
        };

        let other_key = match kind.threshold_key() {
            "severity" => "threshold",
            _ => "severity",
        };

        for (key, field) in object {
            match key.as_str() {
                "enabled" => {
                    if let Some(enabled) = field.as_bool() {
                        setting.enabled = enabled;
                    }
                }
                "cooldown" => {
                    if let Some(cooldown) = field.as_f64() {
                        setting.cooldown = cooldown.max(0.0) as u64;
                    }
                }
                "once" => {
                    if let Some(once) = field.as_bool() {
                        setting.once = once;
                    }
                }
                "threshold" | "severity" => {}
                _ => {
                    setting.extra.insert(key.clone(), field.clone());
                }
            }
        }

        if let Some(threshold) = object
            .get(kind.threshold_key())
            .or_else(|| object.get(other_key))
            .and_then(Value::as_f64)
        {
            setting.threshold = threshold;
        }

        setting
    }

    /// Serializes the setting in the current persisted shape.
    pub fn to_value(&self, kind: AlertKind) -> Value {
        let mut object = self.extra.clone();
        object.insert("enabled".to_owned(), Value::Bool(self.enabled));
        object.insert(kind.threshold_key().to_owned(), number(self.threshold));
        object.insert("cooldown".to_owned(), Value::from(self.cooldown));
        object.insert("once".to_owned(), Value::Bool(self.once));
        Value::Object(object)
    }
}

impl AlertState {
    /// Reads a persisted state, accepting the older `lastSent`/`once` names.
    pub fn from_value(value: &Value) -> Self {
        let mut state = AlertState::default();

        let Some(object) = value.as_object() else {
            return state;
        };

        for (key, field) in object {
            match key.as_str() {
                "lastSentEpoch" | "lastSent" => {
                    if let Some(last_sent) = field.as_f64() {
                        state.last_sent = Some(state.last_sent.map_or(last_sent, |s| s.max(last_sent)));
                    }
                }
                "onceFired" | "once" => {
                    state.once_fired |= field.as_bool().unwrap_or(false);
                }
                _ => {
                    state.extra.insert(key.clone(), field.clone());
                }
            }
        }

        state
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert(
            "lastSentEpoch".to_owned(),
            self.last_sent.map_or(Value::Null, number),
        );
        object.insert("onceFired".to_owned(), Value::Bool(self.once_fired));
        Value::Object(object)
    }

    /// Whether this state records a dispatch more recent than `other`.
    pub fn is_newer_than(&self, other: &AlertState) -> bool {
        match (self.last_sent, other.last_sent) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Writes integral numbers without a fractional part.
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_setting_merges_partial_value_with_defaults() {
        let setting = AlertSetting::from_value(AlertKind::Co2, &json!({"enabled": true}));

        assert!(setting.enabled);
        assert_eq!(setting.threshold, 800.0);
        assert_eq!(setting.cooldown, 3600);
        assert!(!setting.once);
    }

    #[test]
    fn test_setting_reads_severity_for_warnings() {
        let setting = AlertSetting::from_value(
            AlertKind::Smhi,
            &json!({"enabled": true, "severity": 2, "cooldown": 60, "once": true}),
        );

        assert_eq!(setting.threshold, 2.0);
        assert_eq!(setting.cooldown, 60);
        assert!(setting.once);
        assert_eq!(
            setting.to_value(AlertKind::Smhi),
            json!({"enabled": true, "severity": 2, "cooldown": 60, "once": true})
        );
    }

    #[test]
    fn test_setting_accepts_renamed_threshold_key() {
        let setting = AlertSetting::from_value(AlertKind::Smhi, &json!({"threshold": 3}));
        assert_eq!(setting.threshold, 3.0);

        let setting = AlertSetting::from_value(AlertKind::Kp, &json!({"severity": 7}));
        assert_eq!(setting.threshold, 7.0);
    }

    #[test]
    fn test_setting_ignores_malformed_fields() {
        let setting = AlertSetting::from_value(
            AlertKind::AuroraChance,
            &json!({"enabled": "yes", "threshold": "high", "cooldown": -5}),
        );

        assert!(!setting.enabled);
        assert_eq!(setting.threshold, 30.0);
        assert_eq!(setting.cooldown, 0);

        let setting = AlertSetting::from_value(AlertKind::AuroraChance, &json!(true));
        assert_eq!(setting, AlertKind::AuroraChance.default_setting());
    }

    #[test]
    fn test_setting_keeps_unknown_keys() {
        let value = json!({"enabled": true, "threshold": 900.5, "cooldown": 10, "once": false, "sound": "chime"});
        let setting = AlertSetting::from_value(AlertKind::Co2, &value);

        assert_eq!(setting.extra.get("sound"), Some(&json!("chime")));
        assert_eq!(setting.to_value(AlertKind::Co2), value);
    }

    #[test]
    fn test_state_reads_legacy_names() {
        let state = AlertState::from_value(&json!({"lastSent": 1700000000.5, "once": true}));

        assert_eq!(state.last_sent, Some(1700000000.5));
        assert!(state.once_fired);
        assert_eq!(
            state.to_value(),
            json!({"lastSentEpoch": 1700000000.5, "onceFired": true})
        );
    }

    #[test]
    fn test_state_null_last_sent_is_absent() {
        let state = AlertState::from_value(&json!({"lastSentEpoch": null, "onceFired": false}));
        assert_eq!(state.last_sent, None);
        assert_eq!(state, AlertState::default());
    }

    #[test]
    fn test_state_is_newer_than() {
        let never = AlertState::default();
        let early = AlertState {
            last_sent: Some(10.0),
            ..Default::default()
        };
        let late = AlertState {
            last_sent: Some(20.0),
            ..Default::default()
        };

        assert!(late.is_newer_than(&early));
        assert!(early.is_newer_than(&never));
        assert!(!early.is_newer_than(&late));
        assert!(!early.is_newer_than(&early));
        assert!(!never.is_newer_than(&never));
    }
}
