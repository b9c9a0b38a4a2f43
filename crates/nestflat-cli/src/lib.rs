//! CLI components for nestflat.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod progress;
pub mod summary;
pub mod types;
