//! Document decoding collaborator.

use eutl_store::SourceRole;
use eutl_types::ParsingResult;

use crate::DecodeError;

/// Turns raw LOTL/TL bytes into a [`ParsingResult`].
///
/// The signed digest placed in [`ParsingResult::signature`] must cover
/// exactly the content the signature was produced over.
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, role: SourceRole, bytes: &[u8]) -> Result<ParsingResult, DecodeError>;
}
