//! Threshold evaluation.
//!
//! Decides whether an alert kind is armed for a subscriber's setting, given
//! the observed data. Pure: no time, no state, no I/O.

use crate::{
    alerts::{AlertKind, AlertSetting, Comparison},
    snapshot::{Observation, OfficialWarning},
};

/// The data that armed an alert, kept for message composition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger<'a> {
    /// Indoor CO₂ in ppm
    Co2(f64),
    /// Aurora probability in percent
    AuroraChance(f64),
    Kp(f64),
    /// Indoor relative humidity in percent
    LowHumidity(f64),
    /// The most severe warning at or above the configured severity
    Warning(&'a OfficialWarning),
}

impl Trigger<'_> {
    /// Wraps a threshold crossing of `kind`, `None` for kinds not driven by a
    /// single reading.
    fn reading(kind: AlertKind, value: f64) -> Option<Self> {
        match kind {
            AlertKind::Co2 => Some(Trigger::Co2(value)),
            AlertKind::AuroraChance => Some(Trigger::AuroraChance(value)),
            AlertKind::Kp => Some(Trigger::Kp(value)),
            AlertKind::LowHumidity => Some(Trigger::LowHumidity(value)),
            AlertKind::Smhi => None,
        }
    }

    pub fn kind(&self) -> AlertKind {
        match self {
            Trigger::Co2(_) => AlertKind::Co2,
            Trigger::AuroraChance(_) => AlertKind::AuroraChance,
            Trigger::Kp(_) => AlertKind::Kp,
            Trigger::LowHumidity(_) => AlertKind::LowHumidity,
            Trigger::Warning(_) => AlertKind::Smhi,
        }
    }
}

/// Returns whether `kind` is armed for `setting` given `observation`.
///
/// Never armed when the setting is disabled or the data is unavailable.
pub fn evaluate(kind: AlertKind, setting: &AlertSetting, observation: Option<Observation>) -> bool {
    trigger(kind, setting, observation).is_some()
}

/// Like [`evaluate`], also returning what armed the alert.
pub fn trigger<'a>(
    kind: AlertKind,
    setting: &AlertSetting,
    observation: Option<Observation<'a>>,
) -> Option<Trigger<'a>> {
    if !setting.enabled {
        return None;
    }

    let value = match (kind, observation?) {
        (AlertKind::Smhi, Observation::Warnings(warnings)) => {
            return most_severe(warnings, setting.threshold).map(Trigger::Warning);
        }
        (_, Observation::Warnings(_)) => return None,
        (_, Observation::Reading(value)) => value,
    };

    let armed = match kind.comparison() {
        Comparison::AtLeast => value >= setting.threshold,
        // A zero or negative reading is a broken sensor, not a dry room
        Comparison::AtMost => value > 0.0 && value <= setting.threshold,
    };
    if !armed {
        return None;
    }

    Trigger::reading(kind, value)
}

/// Picks the most severe warning whose level reaches `min_severity`.
///
/// The first one wins among equally severe warnings.
fn most_severe(warnings: &[OfficialWarning], min_severity: f64) -> Option<&OfficialWarning> {
    warnings
        .iter()
        .filter(|warning| f64::from(warning.severity.level()) >= min_severity)
        .fold(None, |best: Option<&OfficialWarning>, warning| match best {
            Some(best) if best.severity >= warning.severity => Some(best),
            _ => Some(warning),
        })
}
