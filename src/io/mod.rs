//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - JSON output on stdout, JSON errors on stderr
//! - Exit codes derived from error categories
//! - Parsing of vector arguments

pub mod error;
pub mod exit_code;
pub mod input;
pub mod output;

pub use error::CliError;
pub use exit_code::ExitCode;
pub use input::{parse_vector, read_items};
pub use output::{JsonResponse, OutputManager};
