use crate::enums::BootstrapStage;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageError {
    #[error("Invalid bootstrap transition from {from} to {to}")]
    InvalidTransition {
        from: BootstrapStage,
        to: BootstrapStage,
    },

    #[error("Bootstrap already failed; the process must restart from UNSTARTED")]
    AlreadyFailed,
}
