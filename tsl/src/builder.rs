//! Derivation of child trusted-list sources from parsed LOTLs.

use tracing::debug;

use crate::cache::CacheSnapshot;
use crate::{LotlSource, TlSource};

/// Builds the ordered list of [`TlSource`]s for one cycle.
pub struct TlSourceBuilder<'a> {
    lotl_sources: &'a [LotlSource],
    snapshot: &'a CacheSnapshot,
}

impl<'a> TlSourceBuilder<'a> {
    pub fn new(lotl_sources: &'a [LotlSource], snapshot: &'a CacheSnapshot) -> Self {
        Self {
            lotl_sources,
            snapshot,
        }
    }

    /// One source per pointer of every LOTL with a usable parse, in LOTL
    /// order then pointer declaration order.
    ///
    /// A LOTL without a successful parse contributes nothing this cycle.
    pub fn build(&self) -> Vec<TlSource> {
        let mut sources = Vec::new();
        for lotl in self.lotl_sources {
            let parsed = self
                .snapshot
                .get(&lotl.key())
                .and_then(|record| record.parsing.last_known_good());
            let Some(parsed) = parsed else {
                debug!(url = lotl.url(), "no parsed LOTL yet; skipping its pointers");
                continue;
            };
            sources.extend(
                parsed
                    .pointers
                    .iter()
                    .filter(|p| !p.location.trim().is_empty())
                    .map(|p| lotl.child(p)),
            );
        }
        sources
    }
}
