//! Subcommand handlers

pub mod check_config;
pub mod replay;
