//! OCSP responses.

use async_trait::async_trait;
use eutl_crypto::{content_digest, sign_digest};
use eutl_types::{CertificateToken, ContentDigest, Fingerprint, PrivateKey, Signature, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    CertificateStatus, RevocationError, RevocationKind, RevocationSource, RevocationToken,
    TokenFields,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleResponse {
    pub serial_number: u64,
    /// Fingerprint of the issuer of the certificate being answered for.
    pub issuer: Fingerprint,
    pub status: CertificateStatus,
    pub this_update: Timestamp,
    #[serde(default)]
    pub next_update: Option<Timestamp>,
    /// id-pkix-ocsp-archive-cutoff
    #[serde(default)]
    pub archive_cutoff: Option<Timestamp>,
    /// ISIS-MTT CertHash extension.
    #[serde(default)]
    pub cert_hash: Option<Fingerprint>,
}

impl SingleResponse {
    pub fn is_cert_hash_present(&self) -> bool {
        self.cert_hash.is_some()
    }

    /// False only when a CertHash is present and names another certificate.
    pub fn is_cert_hash_match(&self, certificate: &CertificateToken) -> bool {
        self.cert_hash
            .map_or(true, |hash| hash == certificate.fingerprint())
    }

    fn answers_for(&self, certificate: &CertificateToken, issuer: &CertificateToken) -> bool {
        self.serial_number == certificate.serial_number()
            && self.issuer == issuer.fingerprint()
            && self.is_cert_hash_match(certificate)
    }
}

#[derive(Serialize)]
struct TbsResponse<'a> {
    responder: Fingerprint,
    produced_at: Timestamp,
    responses: &'a [SingleResponse],
}

/// A signed basic OCSP response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcspResponse {
    pub responder: CertificateToken,
    pub produced_at: Timestamp,
    pub responses: Vec<SingleResponse>,
    pub signature: Signature,
    #[serde(default)]
    pub url: Option<String>,
}

impl OcspResponse {
    pub fn sign(
        responder: CertificateToken,
        key: &PrivateKey,
        produced_at: Timestamp,
        responses: Vec<SingleResponse>,
    ) -> Result<Self, RevocationError> {
        let mut response = Self {
            responder,
            produced_at,
            responses,
            signature: Signature([0; 64]),
            url: None,
        };
        response.signature = sign_digest(&response.signed_digest()?, key);
        Ok(response)
    }

    pub fn signed_digest(&self) -> Result<ContentDigest, RevocationError> {
        let tbs = TbsResponse {
            responder: self.responder.fingerprint(),
            produced_at: self.produced_at,
            responses: &self.responses,
        };
        let encoded = bincode::serialize(&tbs).map_err(|e| RevocationError::Decode(e.to_string()))?;
        Ok(content_digest(&encoded))
    }

    pub fn token_for(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        let Some(single) = self
            .responses
            .iter()
            .find(|r| r.answers_for(certificate, issuer))
        else {
            return Ok(None);
        };
        let mut token = RevocationToken::new(TokenFields {
            kind: RevocationKind::Ocsp,
            issuer: single.issuer,
            serial_number: single.serial_number,
            status: single.status.clone(),
            production_time: self.produced_at,
            this_update: single.this_update,
            next_update: single.next_update,
            archive_cutoff: single.archive_cutoff,
            cert_hash: single.cert_hash,
            signer: self.responder.clone(),
            signed_digest: self.signed_digest()?,
            signature: self.signature.clone(),
            source_url: self.url.clone(),
        });
        token.bind_to(certificate)?;
        Ok(Some(token))
    }
}

/// OCSP responses supplied up front.
#[derive(Clone, Debug, Default)]
pub struct OfflineOcspSource {
    responses: Vec<OcspResponse>,
}

impl OfflineOcspSource {
    pub fn new(responses: Vec<OcspResponse>) -> Self {
        Self { responses }
    }

    pub fn add(&mut self, response: OcspResponse) {
        self.responses.push(response);
    }
}

#[async_trait]
impl RevocationSource for OfflineOcspSource {
    fn kind(&self) -> RevocationKind {
        RevocationKind::Ocsp
    }

    async fn get_revocation_token(
        &self,
        certificate: &CertificateToken,
        issuer: &CertificateToken,
    ) -> Result<Option<RevocationToken>, RevocationError> {
        let mut latest: Option<RevocationToken> = None;
        for response in &self.responses {
            if let Some(token) = response.token_for(certificate, issuer)? {
                if latest
                    .as_ref()
                    .map_or(true, |l| token.production_time() > l.production_time())
                {
                    latest = Some(token);
                }
            }
        }
        Ok(latest)
    }
}
