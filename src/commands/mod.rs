//! Command line surface.
//!
//! Besides running the poll loop, the binary is the registration surface of
//! the subscriber store: the dashboard (or an operator) registers, updates and
//! removes push subscriptions through these subcommands.
//!
//! | Command | Arguments | Description |
//! |---------|-----------|-------------|
//! | `run` | None | Poll and deliver until Ctrl-C (default) |
//! | `check` | None | Run one cycle and print the readings and outcome |
//! | `subscribe` | `--subscription <json> [--settings <json>]` | Register or update a subscription |
//! | `unsubscribe` | `--endpoint <url>` | Remove a subscription |
//! | `list` | None | List subscriptions and their enabled alerts |
//! | `reset-once` | `--endpoint <url> [--kind <kind>]` | Let `once` alerts fire again |
//!
//! Every store mutation reads the current file and replaces it atomically
//! through [`SubscriberStore`]. The poll loop re-reads the store before each
//! commit, so registrations made while it runs are kept.

pub mod actions;
mod command;
mod response;

pub use crate::commands::command::Command;

use crate::subscribers::SubscriberStore;

/// What subcommand handlers work on.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Durable subscribers
    pub store: SubscriberStore,
}
