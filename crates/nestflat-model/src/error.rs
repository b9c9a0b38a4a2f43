use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid locale: {0:?}")]
    InvalidLocale(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
