// run-on-arch-common: shared infrastructure for run-on-arch.
// Depends on nothing from the workspace except what it re-exports.

pub mod action_command;
pub mod constants;
pub mod terminal;
pub mod tracing;

pub use action_command::ActionCommand;
pub use constants::{OsPlatform, CURRENT_PLATFORM, SUPPORTED_PLATFORM};
pub use terminal::{CollectingGroupLogger, GroupLogger, LogEvent, Terminal};
pub use tracing::TraceSetting;
