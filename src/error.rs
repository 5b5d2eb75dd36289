use thiserror::Error;

pub type MapResult<T> = Result<T, MapError>;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
