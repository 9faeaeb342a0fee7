//! Text responses printed by the subcommands.

use crate::{notifier::CycleReport, subscribers::Subscriber};

/// Number of trailing endpoint characters shown in listings.
const ENDPOINT_PREVIEW_LEN: usize = 50;

/// Friendly device name derived from the push service of `endpoint`.
///
/// # Examples
///
/// ```
/// assert_eq!(device_name("https://fcm.googleapis.com/fcm/send/abc", 0), "Android Device 1");
/// ```
pub fn device_name(endpoint: &str, index: usize) -> String {
    let device = if endpoint.contains("fcm.googleapis.com") {
        "Android Device"
    } else if endpoint.contains("mozilla.com") || endpoint.contains("mozilla.org") {
        "Firefox Device"
    } else if endpoint.contains("push.apple.com") {
        "Safari Device"
    } else if endpoint.contains("windows.com") {
        "Edge Device"
    } else {
        "Device"
    };

    format!("{} {}", device, index + 1)
}

/// Last characters of an endpoint, where push services put the token,
/// prefixed with `...` when cut.
fn endpoint_preview(endpoint: &str) -> String {
    let count = endpoint.chars().count();
    if count <= ENDPOINT_PREVIEW_LEN {
        return endpoint.to_owned();
    }
    let start = endpoint
        .char_indices()
        .nth(count - ENDPOINT_PREVIEW_LEN)
        .map_or(0, |(index, _)| index);
    format!("...{}", &endpoint[start..])
}

/// Formats registered subscribers with their enabled alert kinds.
pub fn format_subscribers(subscribers: &[Subscriber]) -> String {
    if subscribers.is_empty() {
        return "No subscriptions.".to_owned();
    }

    let mut body = String::new();
    for (index, subscriber) in subscribers.iter().enumerate() {
        let kinds: Vec<String> = subscriber
            .enabled_kinds()
            .into_iter()
            .map(|kind| {
                if subscriber.setting(kind).once {
                    format!("{} (once)", kind)
                } else {
                    kind.to_string()
                }
            })
            .collect();

        body.push_str(&format!(
            "{}: {}\n  {} enabled: {}\n",
            device_name(&subscriber.endpoint, index),
            endpoint_preview(&subscriber.endpoint),
            kinds.len(),
            if kinds.is_empty() {
                "-".to_owned()
            } else {
                kinds.join(", ")
            }
        ));
    }

    body
}

/// Formats the outcome of a single poll cycle.
pub fn format_check(report: &CycleReport) -> String {
    format!("{}\n\n{}", report.snapshot, report)
}

pub fn format_subscribed(endpoint: &str, created: bool) -> String {
    if created {
        format!("Subscribed {}.", endpoint)
    } else {
        format!("Updated {}.", endpoint)
    }
}

pub fn format_unsubscribed(endpoint: &str, removed: bool) -> String {
    if removed {
        format!("Unsubscribed {}.", endpoint)
    } else {
        format!("No subscription for {}.", endpoint)
    }
}

pub fn format_reset_once(endpoint: &str, found: bool) -> String {
    if found {
        format!("Once alerts of {} can fire again.", endpoint)
    } else {
        format!("No subscription for {}.", endpoint)
    }
}
