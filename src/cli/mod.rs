// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for the try-on loop.
//!
//! This module contains the command-line interface logic, including argument parsing,
//! console logging and the `run` command implementation.

// Modules
/// CLI arguments.
pub mod args;

/// Console logging macros.
pub mod logging;

/// Try-on loop driver.
pub mod run;
