//! Notification delivery.
//!
//! - `gateway` - [`Dispatcher`] trait and its HTTP implementation [`PushGateway`]

mod gateway;

pub use crate::push::gateway::{Dispatcher, PushGateway};
#[cfg(test)]
pub use crate::push::gateway::MockDispatcher;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The push service accepted the notification.
    Delivered,
    /// The delivery failed but the subscription may still be valid.
    Failed(String),
    /// The subscription expired or was revoked; it should be dropped.
    Gone,
}
