//! Subscriber registry and persistence.
//!
//! - `subscriber` - The [`Subscriber`] model
//! - `normalize` - Migration of persisted records of every version
//! - `changes` - [`PendingChanges`] produced by poll cycles
//! - `store` - The durable [`SubscriberStore`]

mod changes;
mod normalize;
mod store;
mod subscriber;

pub use crate::subscribers::changes::PendingChanges;
pub use crate::subscribers::normalize::{endpoint_of, normalize, to_record};
pub use crate::subscribers::store::SubscriberStore;
pub use crate::subscribers::subscriber::Subscriber;
