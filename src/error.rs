use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgExecError {
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Scan error on column {column}: {message}")]
    ScanError { column: usize, message: String },

    #[error("Other database error: {0}")]
    Other(String),
}

impl PgExecError {
    pub(crate) fn scan(column: usize, message: impl Into<String>) -> Self {
        PgExecError::ScanError {
            column,
            message: message.into(),
        }
    }
}
