//! Ed25519 message signing and verification.

use eutl_types::{ContentDigest, PrivateKey, PublicKey, Signature};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Uses strict verification, so non-canonical signatures are rejected.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Sign a precomputed content digest (enveloped document signatures).
pub fn sign_digest(digest: &ContentDigest, private_key: &PrivateKey) -> Signature {
    sign_message(digest.as_bytes(), private_key)
}

pub fn verify_digest(digest: &ContentDigest, signature: &Signature, public_key: &PublicKey) -> bool {
    verify_signature(digest.as_bytes(), signature, public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let msg = b"trusted list content";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"correct", &kp.private);
        assert!(!verify_signature(b"tampered", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"msg", &kp1.private);
        assert!(!verify_signature(b"msg", &sig, &kp2.public));
    }

    #[test]
    fn invalid_public_key_is_rejected() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"msg", &kp.private);
        assert!(!verify_signature(b"msg", &sig, &PublicKey([0xFF; 32])));
    }

    #[test]
    fn digest_signatures_round_trip() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let digest = crate::content_digest(b"<TrustServiceStatusList/>");
        let sig = sign_digest(&digest, &kp.private);
        assert!(verify_digest(&digest, &sig, &kp.public));
        assert!(!verify_digest(&crate::content_digest(b"other"), &sig, &kp.public));
    }
}
