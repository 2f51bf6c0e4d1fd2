//! Subcommand implementations

pub mod dataset;
pub mod predict;
pub mod status;
