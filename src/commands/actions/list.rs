//! List command handler.

use log::debug;

use crate::commands::{CommandContext, response::format_subscribers};

/// Lists every registered subscription with its enabled alert kinds.
pub async fn handle_list(context: &CommandContext) -> Result<String, anyhow::Error> {
    debug!("handling list command");

    let subscribers = context.store.load_all().await?;

    Ok(format_subscribers(&subscribers))
}
