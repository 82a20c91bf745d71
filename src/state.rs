//! Recurrent state carried between time steps
//!
//! Every state tensor has shape `[num_layers * num_directions, batch, hidden_size]`.
//! A state returned by `zero_state`, `step`, `seq` or `seq_init` is owned by the
//! caller; dropping it releases its tensors. Passing a state into `step` or
//! `seq_init` moves it, so the same history cannot be fed into two recurrences
//! without an explicit `clone()`. Doing so is allowed by the reference-counted
//! storage but breaks the recurrence semantics.

use crate::error::RNNError;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use std::fmt;

/// Which cell type a state belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKind {
    LSTM,
    GRU,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::LSTM => write!(f, "LSTM"),
            StateKind::GRU => write!(f, "GRU"),
        }
    }
}

/// The state for a LSTM network, this contains two tensors.
#[derive(Clone, Debug)]
pub struct LSTMState<B: Backend> {
    pub hidden: Tensor<B, 3>,
    pub cell: Tensor<B, 3>,
}

impl<B: Backend> LSTMState<B> {
    pub fn new(hidden: Tensor<B, 3>, cell: Tensor<B, 3>) -> Self {
        Self { hidden, cell }
    }

    /// The hidden state vector, which is also the output of the LSTM.
    pub fn h(&self) -> Tensor<B, 3> {
        self.hidden.clone()
    }

    /// The cell state vector.
    pub fn c(&self) -> Tensor<B, 3> {
        self.cell.clone()
    }

    pub fn dims(&self) -> [usize; 3] {
        self.hidden.dims()
    }

    pub fn into_parts(self) -> (Tensor<B, 3>, Tensor<B, 3>) {
        (self.hidden, self.cell)
    }
}

/// GRU state, a single hidden tensor.
#[derive(Clone, Debug)]
pub struct GRUState<B: Backend> {
    pub hidden: Tensor<B, 3>,
}

impl<B: Backend> GRUState<B> {
    pub fn new(hidden: Tensor<B, 3>) -> Self {
        Self { hidden }
    }

    pub fn value(&self) -> Tensor<B, 3> {
        self.hidden.clone()
    }

    pub fn dims(&self) -> [usize; 3] {
        self.hidden.dims()
    }

    pub fn into_inner(self) -> Tensor<B, 3> {
        self.hidden
    }
}

/// Closed set of recurrent states
///
/// Used when LSTM and GRU layers are driven through the same code path
/// (see [`AnyRNN`](crate::rnn::AnyRNN)).
#[derive(Clone, Debug)]
pub enum State<B: Backend> {
    LSTM(LSTMState<B>),
    GRU(GRUState<B>),
}

impl<B: Backend> State<B> {
    pub fn kind(&self) -> StateKind {
        match self {
            State::LSTM(_) => StateKind::LSTM,
            State::GRU(_) => StateKind::GRU,
        }
    }

    /// Hidden state tensor, present in every variant
    pub fn hidden(&self) -> Tensor<B, 3> {
        match self {
            State::LSTM(s) => s.h(),
            State::GRU(s) => s.value(),
        }
    }

    pub fn dims(&self) -> [usize; 3] {
        match self {
            State::LSTM(s) => s.dims(),
            State::GRU(s) => s.dims(),
        }
    }
}

impl<B: Backend> From<LSTMState<B>> for State<B> {
    fn from(state: LSTMState<B>) -> Self {
        State::LSTM(state)
    }
}

impl<B: Backend> From<GRUState<B>> for State<B> {
    fn from(state: GRUState<B>) -> Self {
        State::GRU(state)
    }
}

impl<B: Backend> TryFrom<State<B>> for LSTMState<B> {
    type Error = RNNError;

    fn try_from(state: State<B>) -> Result<Self, Self::Error> {
        match state {
            State::LSTM(s) => Ok(s),
            other => Err(RNNError::StateMismatch {
                expected: StateKind::LSTM,
                actual: other.kind(),
            }),
        }
    }
}

impl<B: Backend> TryFrom<State<B>> for GRUState<B> {
    type Error = RNNError;

    fn try_from(state: State<B>) -> Result<Self, Self::Error> {
        match state {
            State::GRU(s) => Ok(s),
            other => Err(RNNError::StateMismatch {
                expected: StateKind::GRU,
                actual: other.kind(),
            }),
        }
    }
}
