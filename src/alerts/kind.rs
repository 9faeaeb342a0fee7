//! The fixed set of conditions a subscriber can be alerted about.
//!
//! Each [`AlertKind`] knows which comparison arms it, which default
//! [`AlertSetting`] applies when a subscriber never configured it, and under
//! which key its threshold is persisted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::alerts::AlertSetting;

/// A monitored condition.
///
/// The serialized names are the keys used in persisted settings and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    /// Indoor eCO2 at or above the threshold (ppm).
    Co2,
    /// Aurora visibility probability at or above the threshold (%).
    AuroraChance,
    /// Planetary K index at or above the threshold.
    Kp,
    /// An official weather warning at or above the configured severity.
    Smhi,
    /// Indoor relative humidity at or below the threshold (%).
    LowHumidity,
}

/// How a reading is compared against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Armed when `value >= threshold`.
    AtLeast,
    /// Armed when `0 < value <= threshold`. Non-positive readings are invalid.
    AtMost,
}

impl AlertKind {
    /// Every kind, in evaluation order.
    pub const ALL: [AlertKind; 5] = [
        AlertKind::Co2,
        AlertKind::AuroraChance,
        AlertKind::Kp,
        AlertKind::Smhi,
        AlertKind::LowHumidity,
    ];

    /// Name used in persisted records and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Co2 => "co2",
            AlertKind::AuroraChance => "auroraChance",
            AlertKind::Kp => "kp",
            AlertKind::Smhi => "smhi",
            AlertKind::LowHumidity => "lowHumidity",
        }
    }

    pub fn comparison(&self) -> Comparison {
        match self {
            AlertKind::LowHumidity => Comparison::AtMost,
            _ => Comparison::AtLeast,
        }
    }

    /// Key holding the threshold inside a persisted setting.
    ///
    /// Warnings are compared by severity level rather than by a reading.
    pub fn threshold_key(&self) -> &'static str {
        match self {
            AlertKind::Smhi => "severity",
            _ => "threshold",
        }
    }

    /// Setting applied when a subscriber has not configured this kind.
    ///
    /// Every default is disabled, so a subscriber only gets what they opted in to.
    pub fn default_setting(&self) -> AlertSetting {
        let (threshold, cooldown) = match self {
            AlertKind::Co2 => (800.0, 3600),
            AlertKind::AuroraChance => (30.0, 7200),
            AlertKind::Kp => (5.0, 10800),
            AlertKind::Smhi => (1.0, 10800),
            AlertKind::LowHumidity => (30.0, 7200),
        };

        AlertSetting {
            enabled: false,
            threshold,
            cooldown,
            once: false,
            extra: Default::default(),
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown alert kind {}, expected one of co2, auroraChance, kp, smhi, lowHumidity",
                    s
                )
            })
    }
}
