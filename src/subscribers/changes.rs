use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;

use crate::alerts::{AlertKind, AlertState};
use crate::subscribers::Subscriber;

/// Gate state mutations and removals produced by poll cycles and not yet
/// written to the store.
///
/// Changes are kept across cycles until a commit succeeds, so a failed write
/// never loses a dispatch record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingChanges {
    /// New gate states, by endpoint and kind
    states: HashMap<String, BTreeMap<AlertKind, AlertState>>,
    /// Endpoints reported as permanently invalid
    removals: HashSet<String>,
}

impl PendingChanges {
    pub fn record_state(&mut self, endpoint: &str, kind: AlertKind, state: AlertState) {
        let states = self.states.entry(endpoint.to_owned()).or_default();
        match states.get(&kind) {
            Some(pending) if !state.is_newer_than(pending) => {}
            _ => {
                states.insert(kind, state);
            }
        }
    }

    pub fn record_removal(&mut self, endpoint: &str) {
        self.states.remove(endpoint);
        self.removals.insert(endpoint.to_owned());
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.removals.is_empty()
    }

    /// Folds `other` into these changes, keeping the most recent dispatch of
    /// each (endpoint, kind).
    pub fn merge(&mut self, other: PendingChanges) {
        for (endpoint, states) in other.states {
            if self.removals.contains(&endpoint) {
                continue;
            }
            for (kind, state) in states {
                self.record_state(&endpoint, kind, state);
            }
        }
        for endpoint in other.removals {
            self.record_removal(&endpoint);
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.removals.clear();
    }

    /// Applies the changes to freshly loaded subscribers.
    ///
    /// A pending state only replaces the loaded one when it records a more
    /// recent dispatch, so an external once reset or a concurrent writer that
    /// sent later is not overwritten.
    pub fn apply_to(&self, subscribers: &mut Vec<Subscriber>) {
        subscribers.retain(|subscriber| !self.removals.contains(&subscriber.endpoint));

        for subscriber in subscribers.iter_mut() {
            let Some(states) = self.states.get(&subscriber.endpoint) else {
                continue;
            };

            for (kind, pending) in states {
                let newer = match subscriber.state.get(kind) {
                    Some(loaded) => pending.is_newer_than(loaded),
                    None => true,
                };
                if newer {
                    debug!("apply pending {} state to {}", kind, subscriber.endpoint);
                    subscriber.state.insert(*kind, pending.clone());
                }
            }
        }
    }
}
