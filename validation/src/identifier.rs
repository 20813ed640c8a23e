//! Artifact-unique signature identifiers.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use eutl_crypto::sha256_multi;
use eutl_types::{Fingerprint, Signature, Timestamp};

use crate::ByteRange;

/// Stable identifier of one signature within one artifact.
///
/// Derived from what distinguishes the signature: who signed, when, the
/// signature value and which bytes it covers. Revalidating the same artifact
/// yields the same identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureIdentifier([u8; 32]);

impl SignatureIdentifier {
    pub fn compute(
        signing_certificate: &Fingerprint,
        signing_time: Timestamp,
        signature: &Signature,
        byte_range: ByteRange,
    ) -> Self {
        let time = signing_time.as_secs().to_be_bytes();
        let offset = (byte_range.offset as u64).to_be_bytes();
        let length = (byte_range.length as u64).to_be_bytes();
        Self(sha256_multi(&[
            signing_certificate.as_bytes().as_slice(),
            time.as_slice(),
            signature.as_bytes().as_slice(),
            offset.as_slice(),
            length.as_slice(),
        ]))
    }

    /// Derive the `counter`-th alternative of this identifier.
    fn with_counter(&self, counter: u32) -> Self {
        Self(sha256_multi(&[self.0.as_slice(), counter.to_be_bytes().as_slice()]))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for SignatureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", hex::encode_upper(self.0))
    }
}

impl fmt::Debug for SignatureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureIdentifier({})", hex::encode(&self.0[..4]))
    }
}

/// Hands out identifiers for one artifact, never the same one twice.
#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    issued: HashSet<SignatureIdentifier>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `candidate`, falling back to counter-derived variants on collision.
    pub fn assign(&mut self, candidate: SignatureIdentifier) -> SignatureIdentifier {
        let mut id = candidate;
        let mut counter = 0u32;
        while !self.issued.insert(id) {
            counter += 1;
            id = candidate.with_counter(counter);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
