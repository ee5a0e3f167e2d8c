//! WanderVibe planner CLI library.
//!
//! This crate provides the `wv` command-line interface over the planner's
//! storage and scheduling crates.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, EventCommand, PlanCommand, UserCommand};
pub use config::Config;
