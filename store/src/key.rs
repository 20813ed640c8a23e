//! Stable source identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a source is a root pointer document or a derived trusted list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceRole {
    Lotl,
    Tl,
}

impl SourceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lotl => "lotl",
            Self::Tl => "tl",
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one source across refresh cycles.
///
/// Derived from the role and the trimmed origin URL, so the same list
/// rediscovered in a later cycle maps onto the same record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(role: SourceRole, url: &str) -> Self {
        Self(format!("{}:{}", role.as_str(), url.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn role(&self) -> Option<SourceRole> {
        if self.0.starts_with("lotl:") {
            Some(SourceRole::Lotl)
        } else if self.0.starts_with("tl:") {
            Some(SourceRole::Tl)
        } else {
            None
        }
    }

    /// Rebuild a key from its persisted string form.
    pub fn from_persisted(s: &str) -> Option<Self> {
        let key = Self(s.to_string());
        key.role().map(|_| key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
