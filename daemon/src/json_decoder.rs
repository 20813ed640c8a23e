//! JSON trusted-list interchange format.
//!
//! ```json
//! {
//!   "payload": "{\"next_update\": 1767225600, \"providers\": [...]}",
//!   "signature": { "signer": "<hex fingerprint>", "value": "<hex>", "signing_time": 1735689600 }
//! }
//! ```
//!
//! `payload` is the list itself as a JSON string; the signature covers its
//! UTF-8 bytes exactly as transmitted.

use eutl_crypto::content_digest;
use eutl_store::SourceRole;
use eutl_tsl::{DecodeError, DocumentDecoder};
use eutl_types::{DocumentSignature, Fingerprint, ParsingResult, Signature, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub payload: String,
    #[serde(default)]
    pub signature: Option<EnvelopeSignature>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvelopeSignature {
    pub signer: String,
    pub value: String,
    #[serde(default)]
    pub signing_time: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonListDecoder;

impl JsonListDecoder {
    fn signature(
        payload: &str,
        envelope: &EnvelopeSignature,
    ) -> Result<DocumentSignature, DecodeError> {
        let signer = Fingerprint::from_hex(&envelope.signer)
            .map_err(|e| DecodeError::Malformed(format!("signer: {e}")))?;
        let value: [u8; 64] = hex::decode(&envelope.value)
            .map_err(|e| DecodeError::Malformed(format!("signature value: {e}")))?
            .try_into()
            .map_err(|v: Vec<u8>| {
                DecodeError::Malformed(format!("signature value is {} bytes, expected 64", v.len()))
            })?;
        Ok(DocumentSignature {
            signer,
            signature: Signature(value),
            signed_digest: content_digest(payload.as_bytes()),
            signing_time: envelope.signing_time.map(Timestamp::new),
        })
    }
}

impl DocumentDecoder for JsonListDecoder {
    fn decode(&self, role: SourceRole, bytes: &[u8]) -> Result<ParsingResult, DecodeError> {
        let envelope: SignedEnvelope =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        let mut parsed: ParsingResult = serde_json::from_str(&envelope.payload)
            .map_err(|e| DecodeError::Malformed(format!("payload: {e}")))?;
        match role {
            SourceRole::Lotl if !parsed.providers.is_empty() => {
                return Err(DecodeError::Unsupported(
                    "LOTL declares trust service providers".into(),
                ))
            }
            SourceRole::Tl if !parsed.pointers.is_empty() => {
                debug!(pointers = parsed.pointers.len(), "ignoring pointers in trusted list");
                parsed.pointers.clear();
            }
            _ => {}
        }
        parsed.signature = envelope
            .signature
            .as_ref()
            .map(|s| Self::signature(&envelope.payload, s))
            .transpose()?;
        Ok(parsed)
    }
}
