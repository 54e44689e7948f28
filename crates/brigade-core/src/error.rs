use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrigadeError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown rank: {0}")]
    UnknownRank(String),

    #[error("Data error: {0}")]
    Data(String),
}

pub type Result<T> = std::result::Result<T, BrigadeError>;
