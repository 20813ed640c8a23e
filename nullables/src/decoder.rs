//! Nullable decoder: maps known byte strings to parse results.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use eutl_crypto::content_digest;
use eutl_store::SourceRole;
use eutl_tsl::{DecodeError, DocumentDecoder};
use eutl_types::{ContentDigest, ParsingResult};

/// Decodes only bytes registered with [`NullDecoder::register`]; anything
/// else is malformed.
#[derive(Default)]
pub struct NullDecoder {
    documents: Mutex<HashMap<ContentDigest, ParsingResult>>,
    decodes: AtomicUsize,
}

impl NullDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, bytes: &[u8], parsed: ParsingResult) {
        self.documents
            .lock()
            .unwrap()
            .insert(content_digest(bytes), parsed);
    }

    /// Number of `decode` calls so far.
    pub fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl DocumentDecoder for NullDecoder {
    fn decode(&self, _role: SourceRole, bytes: &[u8]) -> Result<ParsingResult, DecodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .get(&content_digest(bytes))
            .cloned()
            .ok_or_else(|| DecodeError::Malformed(format!("{} unregistered bytes", bytes.len())))
    }
}
