use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported signature namespace: {0}")]
    UnsupportedDialect(String),

    #[error("byte range {offset}+{length} exceeds document of {size} bytes")]
    InvalidByteRange {
        offset: usize,
        length: usize,
        size: usize,
    },
}
