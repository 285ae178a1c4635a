use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Invalid session name {0:?}: the session name must not be empty")]
    InvalidSessionName(String),

    #[error("Cannot bind persistence unit '{unit}': {missing} is absent")]
    BindingError {
        unit: &'static str,
        missing: &'static str,
    },

    #[error("Transaction {action} failed: {source}")]
    TransactionError {
        action: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl DbError {
    pub(crate) fn transaction(action: &'static str) -> impl FnOnce(sqlx::Error) -> DbError {
        move |source| DbError::TransactionError { action, source }
    }
}
