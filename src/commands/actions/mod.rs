//! Subcommand handlers.

mod check;
mod list;
mod reset_once;
mod subscribe;
mod unsubscribe;

pub use crate::commands::actions::check::handle_check;
pub use crate::commands::actions::list::handle_list;
pub use crate::commands::actions::reset_once::handle_reset_once;
pub use crate::commands::actions::subscribe::handle_subscribe;
pub use crate::commands::actions::unsubscribe::handle_unsubscribe;
