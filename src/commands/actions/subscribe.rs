//! Subscribe command handler.
//!
//! Registers a push subscription, or updates the settings of a registered one.
//! Gate state of an existing subscription is kept.

use log::debug;
use serde_json::Value;

use crate::{
    commands::{CommandContext, response::format_subscribed},
    subscribers::endpoint_of,
};

pub async fn handle_subscribe(
    context: &CommandContext,
    subscription: Value,
    settings: Option<Value>,
) -> Result<String, anyhow::Error> {
    debug!("handling subscribe command");

    let endpoint = endpoint_of(&subscription).unwrap_or_default();
    let created = context.store.upsert(subscription, settings).await?;

    Ok(format_subscribed(&endpoint, created))
}
