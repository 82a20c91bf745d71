use crate::state::StateKind;
use thiserror::Error;

/// Errors raised by recurrent layers and their fused kernels
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RNNError {
    #[error("State mismatch: expected {expected} state, got {actual} state")]
    StateMismatch {
        expected: StateKind,
        actual: StateKind,
    },

    #[error("Shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Empty sequence: input has dims {0:?}")]
    EmptySequence(Vec<usize>),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Weight layout error: {0}")]
    WeightLayout(String),
}

pub type Result<T> = std::result::Result<T, RNNError>;
