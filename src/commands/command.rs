use clap::Subcommand;
use serde_json::Value;

use crate::alerts::AlertKind;

/// Skywatch subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Poll the dashboard and deliver notifications until Ctrl-C (default)
    Run,
    /// Run a single poll cycle and print the readings and what was sent
    Check,
    /// Register a push subscription, or update the settings of a registered one
    ///
    /// Settings are given per alert kind and merged over the current ones, e.g.
    /// `{"co2": {"enabled": true, "threshold": 1000}, "smhi": {"enabled": true, "severity": 2}}`
    Subscribe {
        /// Push subscription JSON, as produced by the browser
        #[arg(long, value_parser = parse_json)]
        subscription: Value,
        /// Alert settings JSON
        #[arg(long, value_parser = parse_json)]
        settings: Option<Value>,
    },
    /// Remove a push subscription
    Unsubscribe {
        /// Push endpoint of the subscription
        #[arg(long)]
        endpoint: String,
    },
    /// List registered subscriptions and their enabled alerts
    List,
    /// Allow `once` alerts of a subscription to fire again
    ResetOnce {
        /// Push endpoint of the subscription
        #[arg(long)]
        endpoint: String,
        /// Only reset this alert kind (co2, auroraChance, kp, smhi, lowHumidity)
        #[arg(long)]
        kind: Option<AlertKind>,
    },
}

fn parse_json(value: &str) -> Result<Value, String> {
    serde_json::from_str(value).map_err(|e| format!("invalid JSON: {}", e))
}
