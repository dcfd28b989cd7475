//! Enrich CLI Library
//!
//! Subcommand handlers behind the `enrich` binary:
//! - `replay`: drive a captured page and its follow-up pages through the
//!   pipeline the way a reader scrolling the page would
//! - `check-config`: decode a settings file
//!
//! Follow-up pages come from a [`DirectoryPageSource`].

pub mod commands;
pub mod source;

pub use commands::replay::ReplaySummary;
pub use source::DirectoryPageSource;
