//! Attendance ledger CLI library.
//!
//! This crate provides the CLI interface for the attendance ledger.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, ClockAction, ClockArgs, Commands, EmployeeAction, WindowArgs, parse_month};
pub use config::Config;
