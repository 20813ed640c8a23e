//! Refresh cycle tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TslError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Sources processed concurrently within one phase of a cycle.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Hard bound on one whole cycle.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// Delay between cycles in periodic mode.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Log a warning when a validated list is past its `next_update`.
    #[serde(default = "default_true")]
    pub tl_freshness_warning: bool,
}

fn default_max_workers() -> usize {
    4
}

fn default_cycle_timeout_secs() -> u64 {
    300
}

fn default_refresh_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_true() -> bool {
    true
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            tl_freshness_warning: default_true(),
        }
    }
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), TslError> {
        if self.max_workers == 0 {
            return Err(TslError::InvalidConfig("max_workers must be at least 1".into()));
        }
        if self.cycle_timeout_secs == 0 {
            return Err(TslError::InvalidConfig(
                "cycle_timeout_secs must be positive".into(),
            ));
        }
        if self.refresh_interval_secs == 0 {
            return Err(TslError::InvalidConfig(
                "refresh_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
