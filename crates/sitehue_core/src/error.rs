use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ColorError {
    #[error("not a hex color: {0}")]
    NotHex(String),

    #[error("unknown palette key: {0}")]
    UnknownKey(String),
}

pub type Result<T> = std::result::Result<T, ColorError>;
