use crate::args::ArgumentError;
use configuration::error::ConfigError;
use core_types::StageError;
use database::DbError;
use thiserror::Error;

/// Exit code for a rejected invocation. Every other failure exits with 1.
pub const EXIT_ARGUMENTS_REJECTED: u8 = 2;
pub const EXIT_FATAL: u8 = 1;

/// Everything that can stop the bootstrap. Every variant is fatal.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid startup arguments: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Session configuration error: {0}")]
    Session(DbError),

    #[error("Database connection error: {0}")]
    Connection(DbError),

    #[error("Persistence binding error: {0}")]
    Binding(DbError),

    #[error("Bootstrap state error: {0}")]
    Stage(#[from] StageError),
}

impl From<DbError> for BootstrapError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::InvalidSessionName(_) => BootstrapError::Session(error),
            DbError::BindingError { .. } => BootstrapError::Binding(error),
            DbError::ConnectionError(_) | DbError::TransactionError { .. } => {
                BootstrapError::Connection(error)
            }
        }
    }
}

impl BootstrapError {
    /// The failure class, as reported in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BootstrapError::Argument(_) => "ArgumentError",
            BootstrapError::Configuration(_) | BootstrapError::Session(_) => "ConfigurationError",
            BootstrapError::Connection(_) => "ConnectionError",
            BootstrapError::Binding(_) | BootstrapError::Stage(_) => "BindingError",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Argument(_) => EXIT_ARGUMENTS_REJECTED,
            _ => EXIT_FATAL,
        }
    }
}
