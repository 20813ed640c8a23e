use thiserror::Error;

use crate::{Stage, StageState};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("cache is corrupted: {0}")]
    Corruption(String),

    #[error("illegal {stage} transition: cannot {action} from {from}")]
    IllegalTransition {
        stage: Stage,
        from: StageState,
        action: &'static str,
    },

    #[error("{stage} cannot start: predecessor {predecessor} is {state}")]
    PredecessorNotReady {
        stage: Stage,
        predecessor: Stage,
        state: StageState,
    },
}
