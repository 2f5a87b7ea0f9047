use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HarnessError {
    #[error("invalid unit list: {0}")]
    InvalidUnit(String),
}
