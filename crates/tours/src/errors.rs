use thiserror::Error;
use uuid::Uuid;

use crate::file_parsers::ParseError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid track file: {0}")]
    Format(ParseError),

    #[error("Track file contains no points and no waypoints")]
    EmptyTrack,

    #[error("Tour with external id {0} already exists")]
    Duplicate(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tour {0} not found")]
    NotFound(Uuid),
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Empty => AppError::EmptyTrack,
            ParseError::UnsupportedFileType(ext) => AppError::UnsupportedFileType(ext),
            other => AppError::Format(other),
        }
    }
}

impl AppError {
    /// Maps a failed insert to [`AppError::Duplicate`] when the store rejected it
    /// for a repeated external id.
    pub fn from_insert(e: sqlx::Error, external_id: Option<&str>) -> Self {
        match (&e, external_id) {
            (sqlx::Error::Database(db), Some(id)) if db.is_unique_violation() => {
                AppError::Duplicate(id.to_string())
            }
            _ => AppError::Storage(e),
        }
    }
}
