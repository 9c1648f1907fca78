//! CLI and output rendering
//!
//! This crate provides the `eventfeed` command-line interface.

pub mod cli;
pub mod error;
pub mod render;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
