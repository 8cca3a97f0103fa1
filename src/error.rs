//! Unified error hierarchy for goalrs
//!
//! Structured error types for the import, configuration, and reporting
//! surfaces, with severity mapping into the tracing system. The engines
//! themselves are total functions and never construct these.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all goalrs operations
#[derive(Debug, Error)]
pub enum GoalrsError {
    /// Activity or goal file import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report rendering errors
    #[error("Report error: {0}")]
    Report(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Activity and goal file import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported file extension
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    /// TOML parsing failed
    #[error("Parse error: {reason}")]
    ParseError { reason: String },

    /// A setting is out of its valid range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Writing the config file failed
    #[error("Write failed for {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Result type alias for goalrs operations
pub type Result<T> = std::result::Result<T, GoalrsError>;

impl GoalrsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GoalrsError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            GoalrsError::Config(ConfigError::NotFound { .. }) => ErrorSeverity::Warning,
            GoalrsError::Config(ConfigError::InvalidValue { .. }) => ErrorSeverity::Warning,
            GoalrsError::Validation(_) => ErrorSeverity::Warning,
            GoalrsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            GoalrsError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find activity file: {}", path.display())
            }
            GoalrsError::Import(ImportError::ParseError { format, .. }) => {
                format!(
                    "Could not read the {} file. Check that it holds activity records.",
                    format
                )
            }
            GoalrsError::Config(ConfigError::InvalidValue { field, reason }) => {
                format!("Configuration value {} is invalid: {}", field, reason)
            }
            _ => self.to_string(),
        }
    }

    /// Emit the error through tracing at its severity
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::error!("{}", self),
            ErrorSeverity::Warning => tracing::warn!("{}", self),
            ErrorSeverity::Info => tracing::info!("{}", self),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
