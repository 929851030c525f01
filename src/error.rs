use serde::Serialize;

use crate::dsl::error::CompileError;
use crate::engine::ExecError;
use crate::registry::catalog::CatalogError;
use crate::registry::RegistrationError;
use crate::settings::SettingsError;

/// Crate-level error for the session and the CLI. Each layer keeps its own
/// error type; this only unifies them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{message}")]
    Validation { message: String },
}

/// Serializable view of an error for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Registration(_) => "registration",
            AppError::Compile(CompileError::IncompleteCommand { .. }) => "incomplete_command",
            AppError::Compile(CompileError::UnexpectedKeyword { .. }) => "unexpected_keyword",
            AppError::Compile(CompileError::Invariant(_)) => "invariant_violation",
            AppError::Exec(_) => "execution",
            AppError::Catalog(_) => "catalog",
            AppError::Settings(_) => "settings",
            AppError::Io(_) => "io",
            AppError::Validation { .. } => "validation",
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        AppError::Validation { message }
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Validation {
            message: s.to_string(),
        }
    }
}
