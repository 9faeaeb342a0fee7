//! Alert rules for weather and air quality notifications.
//!
//! This module holds everything needed to decide whether a subscriber gets a
//! notification for one alert kind during a poll cycle:
//!
//! - [`AlertKind`]: The fixed set of monitored conditions and their defaults
//! - [`AlertSetting`] / [`AlertState`]: What a subscriber asked for and what was
//!   already sent to them
//! - [`evaluate`] / [`trigger`]: Pure threshold evaluation against a snapshot
//! - [`should_notify`]: Cooldown and once gating, recording the dispatch
//! - [`compose`]: Notification texts
//!
//! # Decision flow
//!
//! ```text
//! Snapshot ─► observe(kind) ─► trigger() ─► should_notify() ─► compose() ─► Dispatcher
//!                                 │               │
//!                                 └─ not armed    └─ cooling down / already fired once
//! ```

mod alert;
mod evaluator;
mod gate;
mod kind;
mod message;

pub use crate::alerts::alert::{AlertSetting, AlertState};
pub use crate::alerts::evaluator::{Trigger, evaluate, trigger};
pub use crate::alerts::gate::should_notify;
pub use crate::alerts::kind::{AlertKind, Comparison};
pub use crate::alerts::message::{Notification, compose};
