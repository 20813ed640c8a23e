//! The boundary between trust data and signature-format validators.
//!
//! Format validators ask [`CertificateVerifier`] whether a certificate is
//! trusted, what its revocation status is, and what a signing chain amounts
//! to. [`DocumentValidator`] turns a [`SignedArtifact`] into a
//! [`SimpleReport`] whose signature identifiers are unique within the artifact.

pub mod artifact;
pub mod dialect;
pub mod error;
pub mod identifier;
pub mod report;
pub mod validator;
pub mod verifier;

pub use artifact::{ByteRange, EmbeddedSignature, SignedArtifact};
pub use dialect::{DialectAttribute, SignatureDialect};
pub use error::ValidationError;
pub use identifier::{IdentifierRegistry, SignatureIdentifier};
pub use report::{Conclusion, SignatureReport, SimpleReport};
pub use validator::DocumentValidator;
pub use verifier::CertificateVerifier;
