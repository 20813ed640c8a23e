//! Cryptographic primitives for trusted lists and revocation evidence.
//!
//! - **Ed25519** for certificate, trusted-list and revocation-token signatures
//! - **SHA-256** for content digests and certificate fingerprints

pub mod certificate;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use certificate::{issue_certificate, is_signed_by, self_signed_certificate};
pub use error::CryptoError;
pub use hash::{content_digest, sha256, sha256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_digest, sign_message, verify_digest, verify_signature};
