//! Unsubscribe command handler.

use log::debug;

use crate::commands::{CommandContext, response::format_unsubscribed};

pub async fn handle_unsubscribe(
    context: &CommandContext,
    endpoint: &str,
) -> Result<String, anyhow::Error> {
    debug!("handling unsubscribe command");

    let removed = context.store.remove(endpoint).await?;

    Ok(format_unsubscribed(endpoint, removed))
}
