//! Fundamental types for trusted-list synchronisation and revocation checking.
//!
//! This crate defines the values shared across every other crate in the workspace:
//! timestamps, digests and fingerprints, key material, certificates, the decoded
//! trusted-list model, and the ETSI indication codes reported to signature validators.

pub mod certificate;
pub mod clock;
pub mod error;
pub mod hash;
pub mod indication;
pub mod keys;
pub mod time;
pub mod tsl;

pub use certificate::{CertificateToken, CommonCertificateSource, TbsCertificate};
pub use clock::{Clock, SystemClock};
pub use error::TypesError;
pub use hash::{ContentDigest, Fingerprint};
pub use indication::{Indication, SubIndication};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
pub use tsl::{
    DocumentSignature, OtherTslPointer, ParsingResult, ServiceStatus, TrustService,
    TrustServiceProvider, ValidationResult,
};
