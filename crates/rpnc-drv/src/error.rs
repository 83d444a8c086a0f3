//! Error handling for the compiler driver.
//!
//! Per-line language errors travel as diagnostics through the shared
//! handler and never abort the run; this module covers the failures that
//! do: unreadable input, unwritable output, bad configuration, and code
//! generation running out of machine resources.

use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of a driver invocation.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Reading or writing a file failed.
    #[error("IO error for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A command-line argument had an invalid value.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The AVR backend could not map the program onto the machine.
    #[error("code generation failed: {0}")]
    Codegen(#[from] rpnc_gen::CodegenError),
}

impl DriverError {
    /// Wraps an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using DriverError.
pub type Result<T> = std::result::Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = DriverError::InvalidArguments("unsupported baud rate 300".into());
        assert_eq!(
            err.to_string(),
            "invalid arguments: unsupported baud rate 300"
        );
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = DriverError::io(
            "program.rpn",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("program.rpn"));
    }
}
