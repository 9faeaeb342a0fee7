//! Reset once command handler.
//!
//! Clears the once flag so `once` alerts of a subscription can fire again.
//! The cooldown still applies from the last dispatched notification.

use log::debug;

use crate::{
    alerts::AlertKind,
    commands::{CommandContext, response::format_reset_once},
};

pub async fn handle_reset_once(
    context: &CommandContext,
    endpoint: &str,
    kind: Option<AlertKind>,
) -> Result<String, anyhow::Error> {
    debug!("handling reset once command");

    let found = context.store.reset_once(endpoint, kind).await?;

    Ok(format_reset_once(endpoint, found))
}
