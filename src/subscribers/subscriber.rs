use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::alerts::{AlertKind, AlertSetting, AlertState};

/// A registered push endpoint with its alert preferences and gate state.
///
/// The endpoint is the identity of a subscriber: it is stable across
/// deletions of other subscribers, unlike a position in the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Subscriber {
    /// Push service URL, unique per subscriber
    pub endpoint: String,
    /// Raw push subscription handed to the dispatcher
    pub subscription: Value,
    /// One setting per alert kind, defaults filled in
    pub settings: BTreeMap<AlertKind, AlertSetting>,
    /// Settings keys that are not alert kinds
    pub extra_settings: Map<String, Value>,
    /// Gate state of the kinds that were dispatched at least once
    pub state: BTreeMap<AlertKind, AlertState>,
    /// State keys that are not alert kinds
    pub extra_state: Map<String, Value>,
    /// Record keys this version does not know about
    pub extra: Map<String, Value>,
}

impl Subscriber {
    /// Creates a subscriber with default settings, every kind disabled.
    pub fn new(endpoint: String, subscription: Value) -> Self {
        Subscriber {
            endpoint,
            subscription,
            settings: AlertKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.default_setting()))
                .collect(),
            extra_settings: Map::new(),
            state: BTreeMap::new(),
            extra_state: Map::new(),
            extra: Map::new(),
        }
    }

    /// Setting of `kind`, the kind default when it is missing.
    pub fn setting(&self, kind: AlertKind) -> AlertSetting {
        self.settings
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_setting())
    }

    /// Kinds the subscriber opted in to.
    pub fn enabled_kinds(&self) -> Vec<AlertKind> {
        self.settings
            .iter()
            .filter(|(_, setting)| setting.enabled)
            .map(|(kind, _)| *kind)
            .collect()
    }
}
