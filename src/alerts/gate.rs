//! Cooldown and once gating.
//!
//! An armed alert only turns into a notification when the subscriber's
//! cooldown has elapsed since the last dispatched notification and, for
//! `once` settings, nothing was dispatched yet.

use log::debug;

use crate::alerts::{AlertKind, AlertSetting, AlertState};

/// Decides whether an armed alert fires, and records the dispatch in `state`
/// when it does.
///
/// The state is marked as sent before the caller attempts delivery: a failed
/// delivery is not retried until the cooldown elapses again, but a retried
/// delivery can never produce a duplicate.
///
/// # Arguments
///
/// * `endpoint` - Subscriber identity, for logging
/// * `kind` - Alert kind, for logging
/// * `armed` - Result of the threshold evaluation
/// * `setting` - Subscriber setting for `kind`
/// * `state` - Subscriber state for `kind`, only mutated when returning `true`
/// * `now` - Current time in epoch seconds
pub fn should_notify(
    endpoint: &str,
    kind: AlertKind,
    armed: bool,
    setting: &AlertSetting,
    state: &mut AlertState,
    now: f64,
) -> bool {
    if !armed {
        return false;
    }

    if setting.once && state.once_fired {
        debug!("{} already notified once for {}", endpoint, kind);
        return false;
    }

    if let Some(last_sent) = state.last_sent {
        let elapsed = now - last_sent;
        if elapsed < setting.cooldown as f64 {
            debug!(
                "{} in cooldown for {}, {}s of {}s elapsed",
                endpoint, kind, elapsed, setting.cooldown
            );
            return false;
        }
    }

    state.last_sent = Some(now);
    if setting.once {
        state.once_fired = true;
    }

    true
}
