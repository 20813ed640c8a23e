use eutl_types::Fingerprint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("cryptographic check failed: {0}")]
    Crypto(String),

    #[error("token is already bound to certificate {0}")]
    AlreadyBound(Fingerprint),

    #[error("invalid revocation policy: {0}")]
    InvalidPolicy(String),
}

impl From<eutl_types::TypesError> for RevocationError {
    fn from(e: eutl_types::TypesError) -> Self {
        RevocationError::Decode(e.to_string())
    }
}
