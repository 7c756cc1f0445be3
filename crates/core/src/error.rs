use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid email address: {0:?}")]
    InvalidAddress(String),
}
