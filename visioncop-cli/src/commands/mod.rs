//! Subcommand implementations.

pub mod analyze;
pub mod index;
pub mod list;
pub mod remove;
pub mod search;
pub mod status;
pub mod verify;
