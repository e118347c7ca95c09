use thiserror::Error;

#[derive(Error, Debug)]
pub enum HoldoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl HoldoutError {
    pub fn validation(msg: impl Into<String>) -> Self {
        HoldoutError::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HoldoutError>;
