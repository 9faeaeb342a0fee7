//! Skywatch - Push notifications for a home weather dashboard.
//!
//! Skywatch periodically reads the dashboard backend (indoor and outdoor
//! sensors, aurora forecast, official weather warnings) and sends web push
//! notifications to the subscribers whose alert conditions are met.
//!
//! # Features
//!
//! - **Alert kinds**: high indoor CO₂, aurora chance, high KP index, official
//!   weather warnings and low indoor humidity, each with its own threshold
//! - **Cooldowns**: at most one notification per kind and subscriber within the
//!   configured cooldown, measured from the last dispatched notification
//! - **Once alerts**: fire a single time until explicitly reset
//! - **Durable state**: cooldowns survive restarts, the store is always
//!   replaced atomically
//! - **Legacy records**: subscriptions written by older dashboards are migrated
//!   on load, unknown fields are preserved
//! - **YAML Configuration**: optional configuration file with environment
//!   variable support
//!
//! # Configuration
//!
//! ```yaml
//! backend:
//!   url: "http://localhost:5000"
//! push:
//!   url: "http://localhost:5000/api/push/deliver"
//! polling:
//!   interval: 300
//! ```
//!
//! Override any value using environment variables with the `SKYWATCH_` prefix:
//!
//! ```bash
//! export SKYWATCH_BACKEND__URL="http://dashboard.local:5000"
//! export SKYWATCH_POLLING__INTERVAL=120
//! ```
//!
//! # Usage
//!
//! ```bash
//! skywatch --config config.yaml --data ./data
//! skywatch --data ./data subscribe --subscription '{"endpoint": "...", "keys": {...}}' \
//!     --settings '{"kp": {"enabled": true, "threshold": 6}}'
//! skywatch --data ./data list
//! skywatch --config config.yaml --data ./data check
//! ```
//!
//! # Architecture
//!
//! - [`alerts`] - Alert kinds, threshold evaluation, cooldown gate and messages
//! - [`commands`] - Subcommands, including the subscription registration surface
//! - [`config`] - YAML configuration structures and loading
//! - [`notifier`] - The poll loop
//! - [`push`] - Notification delivery through the push gateway
//! - [`snapshot`] - Dashboard backend client
//! - [`subscribers`] - Subscriber model and durable store
//! - [`utils`] - Path and time helpers
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//!   - Set to `debug` to see every gate decision

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{
    commands::{
        Command, CommandContext,
        actions::{
            handle_check, handle_list, handle_reset_once, handle_subscribe, handle_unsubscribe,
        },
    },
    config::Config,
    notifier::Notifier,
    push::PushGateway,
    snapshot::{BackendRequester, SnapshotSync},
    subscribers::SubscriberStore,
    utils::{SUBSCRIPTIONS_FILE, get_path},
};

mod alerts;
mod commands;
mod config;
mod notifier;
mod push;
mod snapshot;
mod subscribers;
mod utils;

/// Command-line arguments for Skywatch.
///
/// # Examples
///
/// ```bash
/// skywatch --config config.yaml --data ./skywatch-data
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    ///
    /// The file is optional: every setting has a default and can be set with
    /// `SKYWATCH_` environment variables. See the [`config`] module.
    #[arg(short, long, global = true, default_value = "config.yaml")]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// This directory will contain `subscriptions.json`, the push subscriptions
    /// with their alert settings and the time of the last notifications.
    /// Push subscriptions allow sending notifications to their devices: keep
    /// the directory private.
    #[arg(short, long, global = true, default_value = ".")]
    data: String,

    /// Subcommand, `run` when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

/// Main entry point for Skywatch.
///
/// 1. **Logging Setup**: `info` level by default, overridden by `RUST_LOG`
/// 2. **Argument Parsing**: with `clap`
/// 3. **Configuration Loading**: YAML file merged with the environment
/// 4. **Command Execution**: the poll loop by default
///
/// A failing command is logged. The poll loop itself never stops on error,
/// only on Ctrl-C.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();

    info!("Starting skywatch {}...", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&args.data).await {
        error!("Failed to create data directory {}: {}", args.data, e);
        return;
    }

    let context = CommandContext {
        store: SubscriberStore::new(get_path(&args.data, SUBSCRIPTIONS_FILE)),
    };

    match execute(args.command.unwrap_or(Command::Run), &config, &context).await {
        Ok(Some(response)) => println!("{}", response),
        Ok(None) => {}
        Err(e) => error!("{:#}", e),
    }
}

/// Runs `command`, returning the text to print.
async fn execute(
    command: Command,
    config: &Config,
    context: &CommandContext,
) -> Result<Option<String>, anyhow::Error> {
    match command {
        Command::Run => {
            build_notifier(config, context)?.start().await;
            Ok(None)
        }
        Command::Check => Ok(Some(handle_check(&build_notifier(config, context)?).await?)),
        Command::Subscribe {
            subscription,
            settings,
        } => Ok(Some(
            handle_subscribe(context, subscription, settings).await?,
        )),
        Command::Unsubscribe { endpoint } => Ok(Some(handle_unsubscribe(context, &endpoint).await?)),
        Command::List => Ok(Some(handle_list(context).await?)),
        Command::ResetOnce { endpoint, kind } => {
            Ok(Some(handle_reset_once(context, &endpoint, kind).await?))
        }
    }
}

fn build_notifier(
    config: &Config,
    context: &CommandContext,
) -> Result<Notifier<BackendRequester, PushGateway>, anyhow::Error> {
    let requester = BackendRequester::new(&config.backend.url, config.backend.timeout)?;
    let gateway = PushGateway::new(&config.push.url, config.push.timeout)?;

    Ok(Notifier::new(
        SnapshotSync::new(requester),
        gateway,
        context.store.clone(),
        config,
    ))
}
