//! Retrace command line: workflow management, variable and timing previews,
//! and dry-run rehearsal of recorded workflows.

pub mod cli;
pub mod config;

pub use config::Config;
