//! CLI error types with exit code handling
//!
//! Every failure of a run ends up here so that `main` can print one
//! diagnostic and pick the process exit code.

use chart2sls_core::CoreError;
use chart2sls_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// The chart renderer exited unsuccessfully; its stderr was already shown
    #[error("Renderer failed: {message}")]
    #[diagnostic(code(chart2sls::cli::renderer))]
    Renderer { status: i32, message: String },

    /// Unusable input (manifest stream or drop-set)
    #[error("Invalid input: {message}")]
    #[diagnostic(code(chart2sls::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chart2sls::cli::io))]
    Io {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Renderer { status, .. } => *status,
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Engine(EngineError::Core(err)) => core_exit_code(err),
            CliError::Engine(EngineError::MalformedDocument { .. } | EngineError::Syntax(_)) => {
                exit_codes::TEMPLATE_ERROR
            }
        }
    }

    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an IO error with help text
    pub fn io_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

fn core_exit_code(err: &CoreError) -> i32 {
    match err {
        CoreError::YamlParse(_) | CoreError::DropSet { .. } => exit_codes::INPUT_ERROR,
        CoreError::Io(_) => exit_codes::IO_ERROR,
        CoreError::Serialize { .. } => exit_codes::ERROR,
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
            help: None,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Engine(EngineError::Core(err))
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
