//! Certificate revocation lists.

use async_trait::async_trait;
use eutl_crypto::{content_digest, sign_digest};
use eutl_types::{CertificateToken, ContentDigest, PrivateKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CertificateStatus, RevocationError, RevocationKind, RevocationReason, RevocationSource,
    RevocationToken, TokenFields,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlEntry {
    pub serial_number: u64,
    pub revocation_date: Timestamp,
    pub reason: RevocationReason,
}

#[derive(Serialize)]
struct TbsCrl<'a> {
    issuer_name: &'a str,
    this_update: Timestamp,
    next_update: Option<Timestamp>,
    entries: &'a [CrlEntry],
}

/// A signed CRL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrlList {
    pub issuer_name: String,
    pub this_update: Timestamp,
    pub next_update: Option<Timestamp>,
    #[serde(default)]
    pub entries: Vec<CrlEntry>,
    pub signer: CertificateToken,
    pub signature: Signature,
    #[serde(default)]
    pub url: Option<String>,
}

impl CrlList {
    /// Sign a CRL body with `key`, the private key of `signer`.
    pub fn sign(
        issuer_name: &str,
        this_update: Timestamp,
        next_update: Option<Timestamp>,
        entries: Vec<CrlEntry>,
        signer: CertificateToken,
        key: &PrivateKey,
    ) -> Result<Self, RevocationError> {
        let mut crl = Self {
            issuer_name: issuer_name.to_string(),
            this_update,
            next_update,
            entries,
            signer,
            signature: Signature([0; 64]),
            url: None,
        };
        crl.signature = sign_digest(&crl.signed_digest()?, key);
        Ok(crl)
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    /// Digest of the signed CRL body.
    pub fn signed_digest(&self) -> Result<ContentDigest, RevocationError> {
        let tbs = TbsCrl {
            issuer_name: &self.issuer_name,
            this_update: self.this_update,
            next_update: self.next_update,
            entries: &self.entries,
        };
        let encoded = bincode::serialize(&tbs).map_err(|e| RevocationError::Decode(e.to_string()))?;
        Ok(content_digest(&encoded))
    }

    pub fn find(&self, serial_number: u64) -> Option<&CrlEntry> {
        self.entries.iter().find(|e| e.serial_number == serial_number)
    }

    /// Token for `certificate` if this CRL is published by `issuer`.
    ///
    /// A serial absent from an issuer-matching CRL is GOOD.
    pub fn token_for(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        if self.issuer_name != issuer.subject() || certificate.issuer() != issuer.subject() {
            return Ok(None);
        }
        let status = match self.find(certificate.serial_number()) {
            Some(entry) => CertificateStatus::Revoked {
                revoked_at: entry.revocation_date,
                reason: entry.reason,
            },
            None => CertificateStatus::Good,
        };
        let mut token = RevocationToken::new(TokenFields {
            kind: RevocationKind::Crl,
            issuer: issuer.fingerprint(),
            serial_number: certificate.serial_number(),
            status,
            production_time: self.this_update,
            this_update: self.this_update,
            next_update: self.next_update,
            archive_cutoff: None,
            cert_hash: None,
            signer: self.signer.clone(),
            signed_digest: self.signed_digest()?,
            signature: self.signature.clone(),
            source_url: self.url.clone(),
        });
        token.bind_to(certificate)?;
        Ok(Some(token))
    }
}

/// CRLs supplied up front (embedded in a signature or loaded from disk).
#[derive(Clone, Debug, Default)]
pub struct OfflineCrlSource {
    crls: Vec<CrlList>,
}

impl OfflineCrlSource {
    pub fn new(crls: Vec<CrlList>) -> Self {
        Self { crls }
    }

    pub fn add(&mut self, crl: CrlList) {
        self.crls.push(crl);
    }

    pub fn len(&self) -> usize {
        self.crls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crls.is_empty()
    }
}

#[async_trait]
impl RevocationSource for OfflineCrlSource {
    fn kind(&self) -> RevocationKind {
        RevocationKind::Crl
    }

    async fn get_revocation_token(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        // Most recent CRL of the issuer first.
        let mut candidates: Vec<&CrlList> = self
            .crls
            .iter()
            .filter(|crl| crl.issuer_name == issuer.subject())
            .collect();
        candidates.sort_by(|a, b| b.this_update.cmp(&a.this_update));
        for crl in candidates {
            if let Some(token) = crl.token_for(certificate, issuer)? {
                return Ok(Some(token));
            }
        }
        debug!(serial = certificate.serial_number(), "no CRL for issuer");
        Ok(None)
    }
}
