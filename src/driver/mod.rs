//! Terminal front for the screens.

pub mod cli;
mod command;

pub use cli::{CliDriver, CliDriverError, DriverResult};
pub use command::{Command, HELP_TEXT};
