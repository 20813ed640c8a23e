//! Which evidence to consult, in which order, and how fresh it must be.

use std::collections::HashMap;

use eutl_types::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::{RevocationError, RevocationKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationPolicy {
    /// Default consultation order.
    #[serde(default = "default_order")]
    pub order: Vec<RevocationKind>,

    /// Maximum age of a token without `next_update` or archive cutoff.
    #[serde(default = "default_max_freshness_secs")]
    pub max_freshness_secs: u64,

    /// Per trust anchor (fingerprint hex) override of `order`.
    #[serde(default)]
    pub anchor_orders: HashMap<String, Vec<RevocationKind>>,
}

fn default_order() -> Vec<RevocationKind> {
    vec![RevocationKind::Crl, RevocationKind::Ocsp]
}

fn default_max_freshness_secs() -> u64 {
    24 * 60 * 60
}

impl Default for RevocationPolicy {
    fn default() -> Self {
        Self {
            order: default_order(),
            max_freshness_secs: default_max_freshness_secs(),
            anchor_orders: HashMap::new(),
        }
    }
}

impl RevocationPolicy {
    pub fn with_anchor_order(mut self, anchor: &Fingerprint, order: Vec<RevocationKind>) -> Self {
        self.anchor_orders.insert(anchor.to_hex(), order);
        self
    }

    /// The order to use under `anchor`, falling back to the default.
    pub fn order_for(&self, anchor: Option<&Fingerprint>) -> &[RevocationKind] {
        anchor
            .and_then(|a| self.anchor_orders.get(&a.to_hex()))
            .unwrap_or(&self.order)
    }

    pub fn validate(&self) -> Result<(), RevocationError> {
        check_order("order", &self.order)?;
        for (anchor, order) in &self.anchor_orders {
            Fingerprint::from_hex(anchor)
                .map_err(|e| RevocationError::InvalidPolicy(format!("anchor {anchor}: {e}")))?;
            check_order(anchor, order)?;
        }
        Ok(())
    }
}

fn check_order(name: &str, order: &[RevocationKind]) -> Result<(), RevocationError> {
    if order.is_empty() {
        return Err(RevocationError::InvalidPolicy(format!("{name} is empty")));
    }
    for (i, kind) in order.iter().enumerate() {
        if order[..i].contains(kind) {
            return Err(RevocationError::InvalidPolicy(format!(
                "{name} lists {kind} twice"
            )));
        }
    }
    Ok(())
}
