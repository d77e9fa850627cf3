use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PagingError {
    #[error("Unknown sort property: {0}")]
    UnknownProperty(String),

    #[error("Invalid default sort: {0}")]
    InvalidDefaultSort(String),
}
