//! Check command handler.
//!
//! Runs a single poll cycle, delivering what fires exactly like the poll loop,
//! and reports the readings and the outcome.

use log::debug;

use crate::{
    commands::response::format_check,
    notifier::{CycleContext, Notifier},
    push::Dispatcher,
    snapshot::SnapshotRequester,
};

pub async fn handle_check<R: SnapshotRequester, D: Dispatcher>(
    notifier: &Notifier<R, D>,
) -> Result<String, anyhow::Error> {
    debug!("handling check command");

    let report = notifier.run_cycle(&mut CycleContext::default()).await?;

    Ok(format_check(&report))
}
