// attune_core/src/error.rs

use thiserror::Error;

/// Every failure in the core is a violated precondition. Nothing is retried;
/// errors surface to the caller immediately.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttuneError {
    /// A state or action cannot be reconciled with the lengths a model (or
    /// cost function, or policy) declares.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("history buffer of length {history} is not a positive multiple of state length {state}")]
    InvalidHistoryLength { history: usize, state: usize },

    #[error("rollout horizon must be at least 1, got {0}")]
    InvalidHorizon(usize),

    #[error("{parameters} PID parameters cannot be partitioned across {controllers} controllers")]
    Partition {
        parameters: usize,
        controllers: usize,
    },

    #[error("the evaluation set of initial states is empty")]
    EmptyEvaluationSet,

    #[error("invalid action space: {0}")]
    InvalidActionSpace(String),

    #[error("invalid parameter bounds: {0}")]
    InvalidBounds(String),

    #[error("the MPC candidate count must be at least 1")]
    InvalidCandidateCount,

    #[error("no mixer column is defined for PID channel '{0}'")]
    UnknownChannel(String),
}

pub type AttuneResult<T> = Result<T, AttuneError>;
