use crate::adoption::{AuthError, RepositoryError, StoreError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use std::fmt;

/// Coarse classification shared by every error the application can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Validation failure; the prompt may retry.
    InvalidInput,
    /// A record index outside the current list.
    OutOfRange,
    /// A persistence file could not be read or written.
    FileOperation,
    /// Bad credentials; the login may retry.
    Authentication,
    /// Startup configuration problems.
    Configuration,
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Store(StoreError),
    Repository(RepositoryError),
    Auth(AuthError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) | AppError::Telemetry(_) => ErrorKind::Configuration,
            AppError::Io(_) | AppError::Store(_) => ErrorKind::FileOperation,
            AppError::Repository(err) => err.kind(),
            AppError::Auth(_) => ErrorKind::Authentication,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Store(err) => write!(f, "storage error: {}", err),
            AppError::Repository(err) => write!(f, "{}", err),
            AppError::Auth(err) => write!(f, "authentication failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Auth(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Store(err) => Self::Store(err),
            other => Self::Repository(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}
