//! Notification texts.

use crate::alerts::{AlertKind, AlertSetting, Trigger};

/// A composed notification, ready to hand to a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: AlertKind,
    pub title: String,
    pub body: String,
}

/// Composes the notification for what armed an alert.
pub fn compose(setting: &AlertSetting, trigger: &Trigger) -> Notification {
    let threshold = format_number(setting.threshold);

    let (title, body) = match trigger {
        Trigger::Co2(value) => (
            "High CO₂ Detected",
            format!(
                "Indoor CO₂ is {} ppm (≥ {} ppm). Open windows to ventilate.",
                value.trunc(),
                threshold
            ),
        ),
        Trigger::AuroraChance(value) => (
            "Aurora Opportunity!",
            format!(
                "Aurora chance is {}% (≥ {}%). Good viewing conditions!",
                value.trunc(),
                threshold
            ),
        ),
        Trigger::Kp(value) => (
            "High KP Index",
            format!(
                "KP index is {} (≥ {}). Increased aurora activity expected.",
                format_number(*value),
                threshold
            ),
        ),
        Trigger::LowHumidity(value) => (
            "Low Indoor Humidity",
            format!(
                "Indoor humidity is {}% (≤ {}%). Consider using a humidifier.",
                value.trunc(),
                threshold
            ),
        ),
        Trigger::Warning(warning) => (
            "SMHI Weather Warning",
            format!(
                "{}: {} from {}",
                non_empty(&warning.event, "Weather alert"),
                warning.description,
                non_empty(&warning.area, "Dalarna")
            ),
        ),
    };

    Notification {
        kind: trigger.kind(),
        title: title.to_owned(),
        body,
    }
}

fn non_empty<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Formats a number without a trailing `.0` when it is integral.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
