//! Revocation evidence and the verifier chain that consumes it.
//!
//! [`RevocationVerifierChain::check`] asks each configured
//! [`RevocationSource`] in [`RevocationPolicy`] order and returns the first
//! token that passes [`check_token`]. Source failures and rejected tokens
//! only skip that source; when nothing is accepted the answer is
//! [`RevocationOutcome::Unknown`].

pub mod chain;
pub mod crl;
pub mod error;
pub mod ocsp;
pub mod policy;
pub mod reason;
pub mod source;
pub mod token;
pub mod verifier;

pub use chain::{RevocationOutcome, RevocationVerifierChain};
pub use crl::{CrlEntry, CrlList, OfflineCrlSource};
pub use error::RevocationError;
pub use ocsp::{OcspResponse, OfflineOcspSource, SingleResponse};
pub use policy::RevocationPolicy;
pub use reason::RevocationReason;
pub use source::{CachingRevocationSource, RevocationSource};
pub use token::{CertificateStatus, RevocationKind, RevocationToken, TokenFields, TokenValidity};
pub use verifier::{check_token, SourceVerifier};
