use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("encoding error: {0}")]
    Encoding(String),
}
