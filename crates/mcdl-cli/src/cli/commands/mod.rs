//! CLI command handlers, one file per command.

mod checksum;
mod get;
mod progress;
mod sync;

pub use checksum::run_checksum;
pub use get::{run_get, GetArgs};
#[cfg(test)]
pub(crate) use get::default_output;
#[cfg(test)]
pub(crate) use progress::cancel_on;
pub use sync::run_sync;
