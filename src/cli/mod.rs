//! CLI argument parsing and command handling.

mod args;
pub mod inspect;
mod validators;

pub use args::{BackendsAction, Cli, Command, ConfigAction, RunArgs};
pub use validators::{parse_confidence, parse_positive_count};
