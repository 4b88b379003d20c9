//! Output management for CLI commands.
//!
//! Results are written to stdout as JSON; errors are written to stderr as
//! JSON with the exit code scripts should branch on.

use std::io::{self, Write};

use serde::Serialize;

use crate::io::error::CliError;
use crate::io::exit_code::ExitCode;

/// JSON envelope for every command result.
#[derive(Debug, Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// "success" or "error"
    pub status: &'static str,

    /// Result code (e.g., "OK", "STORE_TIMEOUT")
    pub code: &'static str,

    /// Error category: "input", "transient" or "configuration"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<&'static str>,

    /// Exit code for shell scripts
    pub exit_code: u8,
}

/// Writes command results and errors.
pub struct OutputManager {
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputManager {
    pub fn new() -> Self {
        Self {
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Create an output manager with custom writers.
    pub fn new_with_writers(stdout: Box<dyn Write>, stderr: Box<dyn Write>) -> Self {
        Self { stdout, stderr }
    }

    /// Output a successful result.
    pub fn success<T: Serialize>(&mut self, data: T) -> io::Result<ExitCode> {
        let response = JsonResponse {
            status: "success",
            code: "OK",
            category: None,
            message: None,
            data: Some(data),
            suggestions: Vec::new(),
            exit_code: ExitCode::Success as u8,
        };
        writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
        Ok(ExitCode::Success)
    }

    /// Output an error with suggestions.
    pub fn error(&mut self, error: &CliError) -> io::Result<ExitCode> {
        let exit_code = error.exit_code();
        let response: JsonResponse<()> = JsonResponse {
            status: "error",
            code: error.status_code(),
            category: error.category().map(|c| c.as_str()),
            message: Some(error.to_string()),
            data: None,
            suggestions: error.recovery_suggestions(),
            exit_code: exit_code as u8,
        };
        writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
        Ok(exit_code)
    }
}
