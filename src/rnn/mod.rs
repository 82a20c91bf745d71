//! # Recurrent Layers
//!
//! This module provides the [`RNN`] contract and the two layers implementing it.
//! **These are the primary APIs most users should use.**
//!
//! ## Available Layers
//!
//! | Layer | State | Gates per layer |
//! |-------|-------|-----------------|
//! | [`LSTM`] | [`LSTMState`] (hidden + cell) | 4 |
//! | [`GRU`] | [`GRUState`] (hidden) | 3 |
//! | [`AnyRNN`] | [`State`] | either |
//!
//! ## Quick Start
//!
//! ```ignore
//! use fused_rnn::prelude::*;
//!
//! let vs = VarStore::<Backend>::new(&device);
//! let lstm = LSTM::new(&vs.root().pp("lstm"), 16, 32, RNNConfig::default())?;
//!
//! // Whole sequence: [batch=4, seq_len=10, features=16]
//! let (output, state) = lstm.seq(input)?;
//! // output: [4, 10, 32], state.h(): [1, 4, 32]
//!
//! // Streaming, one step at a time: [batch=4, features=16]
//! let mut state = lstm.zero_state(4);
//! for x in steps {
//!     state = lstm.step(x, state)?;
//! }
//! ```
//!
//! ## Tensor Shapes
//!
//! | Tensor | Batch-first (default) | Sequence-first |
//! |--------|-----------------------|----------------|
//! | sequence input | `[batch, seq_len, features]` | `[seq_len, batch, features]` |
//! | step input | `[batch, features]` | `[batch, features]` |
//! | output | `[batch, seq_len, directions * hidden]` | `[seq_len, batch, directions * hidden]` |
//! | state tensors | `[layers * directions, batch, hidden]` | same |
//!
//! ## Stateful Processing
//!
//! [`RNN::seq`] starts from [`RNN::zero_state`]. To carry history across chunks
//! (streaming, truncated backpropagation) call [`RNN::seq_init`] with the state
//! returned by the previous chunk:
//!
//! ```ignore
//! let (out1, state) = gru.seq(chunk1)?;
//! let (out2, state) = gru.seq_init(chunk2, state)?;
//! ```
//!
//! States are moved into each call. Feeding the same state into two recurrences
//! requires an explicit `clone()` and is almost always a mistake.

pub mod gru;
pub mod lstm;

pub use gru::GRU;
pub use lstm::LSTM;

use crate::config::RNNConfig;
use crate::error::{RNNError, Result};
use crate::state::{State, StateKind};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Operations every recurrent layer provides
pub trait RNN<B: Backend> {
    /// Recurrent memory of this layer type
    type State;

    /// Configuration the layer was built with
    fn config(&self) -> &RNNConfig;

    /// A zero state from which the recurrent network is usually initialized.
    fn zero_state(&self, batch_dim: usize) -> Self::State;

    /// Applies multiple steps of the recurrent network starting from `state`.
    ///
    /// Returns the full output sequence and the final state.
    fn seq_init(&self, input: Tensor<B, 3>, state: Self::State)
        -> Result<(Tensor<B, 3>, Self::State)>;

    /// Applies a single step of the recurrent network.
    ///
    /// The input should have dimensions `[batch_size, features]`. The step runs
    /// through [`seq_init`](RNN::seq_init) as a sequence of length one.
    fn step(&self, input: Tensor<B, 2>, state: Self::State) -> Result<Self::State> {
        let input = input.unsqueeze_dim::<3>(self.config().time_axis());
        let (_, state) = self.seq_init(input, state)?;
        Ok(state)
    }

    /// Applies multiple steps of the recurrent network from a zero state.
    fn seq(&self, input: Tensor<B, 3>) -> Result<(Tensor<B, 3>, Self::State)> {
        let batch_dim = input.dims()[self.config().batch_axis()];
        let state = self.zero_state(batch_dim);
        self.seq_init(input, state)
    }
}

/// Either recurrent layer, driven through the closed [`State`] enum
///
/// Lets LSTM and GRU layers share one code path. Handing a layer the other
/// layer's state variant fails with [`RNNError::StateMismatch`].
#[derive(Debug, Clone)]
pub enum AnyRNN<B: Backend> {
    LSTM(LSTM<B>),
    GRU(GRU<B>),
}

impl<B: Backend> AnyRNN<B> {
    /// State variant this layer expects
    pub fn state_kind(&self) -> StateKind {
        match self {
            AnyRNN::LSTM(_) => StateKind::LSTM,
            AnyRNN::GRU(_) => StateKind::GRU,
        }
    }

    pub fn hidden_dim(&self) -> usize {
        match self {
            AnyRNN::LSTM(l) => l.hidden_dim(),
            AnyRNN::GRU(g) => g.hidden_dim(),
        }
    }
}

impl<B: Backend> From<LSTM<B>> for AnyRNN<B> {
    fn from(layer: LSTM<B>) -> Self {
        AnyRNN::LSTM(layer)
    }
}

impl<B: Backend> From<GRU<B>> for AnyRNN<B> {
    fn from(layer: GRU<B>) -> Self {
        AnyRNN::GRU(layer)
    }
}

impl<B: Backend> RNN<B> for AnyRNN<B> {
    type State = State<B>;

    fn config(&self) -> &RNNConfig {
        match self {
            AnyRNN::LSTM(l) => l.config(),
            AnyRNN::GRU(g) => g.config(),
        }
    }

    fn zero_state(&self, batch_dim: usize) -> State<B> {
        match self {
            AnyRNN::LSTM(l) => State::LSTM(l.zero_state(batch_dim)),
            AnyRNN::GRU(g) => State::GRU(g.zero_state(batch_dim)),
        }
    }

    fn seq_init(&self, input: Tensor<B, 3>, state: State<B>) -> Result<(Tensor<B, 3>, State<B>)> {
        match (self, state) {
            (AnyRNN::LSTM(l), State::LSTM(s)) => {
                let (output, state) = l.seq_init(input, s)?;
                Ok((output, State::LSTM(state)))
            }
            (AnyRNN::GRU(g), State::GRU(s)) => {
                let (output, state) = g.seq_init(input, s)?;
                Ok((output, State::GRU(state)))
            }
            (layer, state) => Err(RNNError::StateMismatch {
                expected: layer.state_kind(),
                actual: state.kind(),
            }),
        }
    }
}
