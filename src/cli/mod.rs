//! CLI interface for sncfst
//!
//! Provides command-line utilities for validating, compiling, and
//! evaluating Search & Change rule documents.

pub mod args;
pub mod commands;
pub mod io;
pub mod render;

pub use args::{Cli, Commands, OutputFormat, ValidateCommands};
