use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("failed to encode signed data: {0}")]
    Encoding(#[from] eutl_types::TypesError),

    #[error("system randomness unavailable: {0}")]
    Randomness(String),
}
