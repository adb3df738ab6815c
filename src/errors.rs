use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("DATABASE_UNAVAILABLE: {0}")]
    DatabaseUnavailable(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("TRANSACTION_FAILED: {0}")]
    Transaction(String),
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
    #[error("CONFIG: {0}")]
    Config(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Transaction(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Transaction(value.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Transaction(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
