//! Certificate issuance and issuer-signature checks.

use eutl_types::{CertificateToken, PrivateKey, TbsCertificate};

use crate::{sign_message, verify_signature, CryptoError};

/// Sign `tbs` with the issuer's private key.
pub fn issue_certificate(
    tbs: TbsCertificate,
    issuer_key: &PrivateKey,
) -> Result<CertificateToken, CryptoError> {
    let encoded = tbs.encode()?;
    let signature = sign_message(&encoded, issuer_key);
    Ok(CertificateToken::from_parts(tbs, signature)?)
}

/// Issue a certificate signed by its own subject key (trust anchor).
pub fn self_signed_certificate(
    mut tbs: TbsCertificate,
    key: &PrivateKey,
) -> Result<CertificateToken, CryptoError> {
    tbs.issuer = tbs.subject.clone();
    issue_certificate(tbs, key)
}

/// Whether `certificate` names `issuer` as its issuer and carries a valid
/// signature from the issuer's key.
pub fn is_signed_by(certificate: &CertificateToken, issuer: &CertificateToken) -> bool {
    if certificate.issuer() != issuer.subject() {
        return false;
    }
    let Ok(encoded) = certificate.tbs().encode() else {
        return false;
    };
    verify_signature(&encoded, certificate.signature(), issuer.public_key())
}
