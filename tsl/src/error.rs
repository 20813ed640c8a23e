use eutl_store::StoreError;
use eutl_types::Fingerprint;
use thiserror::Error;

/// Failure reported by a [`crate::DataLoader`]. Always retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Opaque decoder failure. Always treated as an integrity error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("unsupported document format: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum TslError {
    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("invalid refresh configuration: {0}")]
    InvalidConfig(String),

    #[error("document is not signed")]
    SignatureMissing,

    #[error("signing certificate {0} is not declared for this list")]
    UnknownSigner(Fingerprint),

    #[error("signature does not verify against {0}")]
    InvalidSignature(Fingerprint),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("metrics registration failed: {0}")]
    Metrics(#[from] prometheus::Error),
}
