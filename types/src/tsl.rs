//! Decoded trusted-list content.
//!
//! Sequence fields are always present (possibly empty) so consumers never
//! branch on a missing collection.

use serde::{Deserialize, Serialize};

use crate::{
    CertificateToken, ContentDigest, Fingerprint, Indication, Signature, SubIndication, Timestamp,
};

/// A LOTL entry pointing at one trusted list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherTslPointer {
    pub location: String,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Certificates the pointed list is expected to be signed with.
    #[serde(default)]
    pub certificates: Vec<CertificateToken>,
}

/// Current status of a trust service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Granted,
    Withdrawn,
    Recognised,
    Deprecated,
    Other(String),
}

impl ServiceStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Granted | Self::Recognised)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustService {
    pub name: String,
    /// Service type identifier URI (e.g. `http://uri.etsi.org/TrstSvc/Svctype/CA/QC`).
    pub service_type: String,
    pub status: ServiceStatus,
    pub status_starting_time: Timestamp,
    #[serde(default)]
    pub certificates: Vec<CertificateToken>,
    #[serde(default)]
    pub qualifiers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustServiceProvider {
    pub name: String,
    #[serde(default)]
    pub trade_names: Vec<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub services: Vec<TrustService>,
}

/// Enveloped signature information extracted by the document decoder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSignature {
    /// Fingerprint of the declared signing certificate.
    pub signer: Fingerprint,
    pub signature: Signature,
    /// Digest of the canonicalised signed content.
    pub signed_digest: ContentDigest,
    #[serde(default)]
    pub signing_time: Option<Timestamp>,
}

/// Decoded content of a fetched LOTL or TL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsingResult {
    #[serde(default)]
    pub sequence_number: Option<u64>,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub issue_date: Option<Timestamp>,
    #[serde(default)]
    pub next_update: Option<Timestamp>,
    #[serde(default)]
    pub distribution_points: Vec<String>,
    /// Child list pointers (LOTL only).
    #[serde(default)]
    pub pointers: Vec<OtherTslPointer>,
    /// Trust service providers (TL only).
    #[serde(default)]
    pub providers: Vec<TrustServiceProvider>,
    #[serde(default)]
    pub signature: Option<DocumentSignature>,
}

impl ParsingResult {
    /// Number of certificates declared across all services.
    pub fn certificate_count(&self) -> usize {
        self.providers
            .iter()
            .flat_map(|p| p.services.iter())
            .map(|s| s.certificates.len())
            .sum()
    }
}

/// Outcome of the validation stage for one list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub indication: Indication,
    pub sub_indication: Option<SubIndication>,
    pub signing_certificate: Option<Fingerprint>,
    pub signing_time: Option<Timestamp>,
    pub validated_at: Timestamp,
    /// The list's `next_update` had already elapsed at validation time.
    pub expired: bool,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.indication.is_passed()
    }
}
