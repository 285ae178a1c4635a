use crate::error::StageError;
use std::fmt;

/// Process-level bootstrap state.
///
/// Stages only ever move forward one step at a time. Any stage may move to
/// `Failed`, which is terminal: there is no recovery transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Unstarted,
    ArgsValidated,
    PoolReady,
    SessionConfigured,
    PersistenceBound,
    TransactionReady,
    Failed,
}

impl BootstrapStage {
    /// Returns the stage that follows this one on the happy path.
    pub fn next(&self) -> Option<Self> {
        match self {
            BootstrapStage::Unstarted => Some(BootstrapStage::ArgsValidated),
            BootstrapStage::ArgsValidated => Some(BootstrapStage::PoolReady),
            BootstrapStage::PoolReady => Some(BootstrapStage::SessionConfigured),
            BootstrapStage::SessionConfigured => Some(BootstrapStage::PersistenceBound),
            BootstrapStage::PersistenceBound => Some(BootstrapStage::TransactionReady),
            BootstrapStage::TransactionReady | BootstrapStage::Failed => None,
        }
    }

    /// `TransactionReady` and `Failed` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BootstrapStage::TransactionReady | BootstrapStage::Failed)
    }

    /// Validates a transition and returns the new stage.
    pub fn advance(self, to: BootstrapStage) -> Result<BootstrapStage, StageError> {
        if self == BootstrapStage::Failed {
            return Err(StageError::AlreadyFailed);
        }
        if to == BootstrapStage::Failed || self.next() == Some(to) {
            Ok(to)
        } else {
            Err(StageError::InvalidTransition { from: self, to })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapStage::Unstarted => "UNSTARTED",
            BootstrapStage::ArgsValidated => "ARGS_VALIDATED",
            BootstrapStage::PoolReady => "POOL_READY",
            BootstrapStage::SessionConfigured => "SESSION_CONFIGURED",
            BootstrapStage::PersistenceBound => "PERSISTENCE_BOUND",
            BootstrapStage::TransactionReady => "TRANSACTION_READY",
            BootstrapStage::Failed => "FAILED",
        }
    }
}

impl Default for BootstrapStage {
    fn default() -> Self {
        BootstrapStage::Unstarted
    }
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
