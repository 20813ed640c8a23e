use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("cannot load certificate {path}: {reason}")]
    Certificate { path: String, reason: String },

    #[error("http client error: {0}")]
    Http(String),
}
