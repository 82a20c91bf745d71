//! # fused-rnn - LSTM and GRU layers for Burn
//!
//! Recurrent layers exposing one uniform contract, [`RNN`](rnn::RNN), over a
//! reference-counted tensor backend.
//!
//! ## Features
//!
//! - **LSTM / GRU**: multi-layer, optionally bidirectional, batch-first or sequence-first
//! - **Uniform protocol**: `zero_state`, `step`, `seq`, `seq_init` on every layer
//! - **Typed state**: [`LSTMState`](state::LSTMState) and [`GRUState`](state::GRUState),
//!   or the closed [`State`](state::State) enum through [`AnyRNN`](rnn::AnyRNN)
//! - **Checked weight layout**: flat weights are built group by group in the order
//!   the fused kernels read them
//! - **Named parameters**: scoped [`VarStore`](params::VarStore) allocation
//!
//! ## Quick Start
//!
//! ```rust
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//! use fused_rnn::prelude::*;
//!
//! type Backend = NdArray<f32>;
//! let device = Default::default();
//!
//! let vs = VarStore::<Backend>::new(&device);
//! let lstm = LSTM::new(&vs.root().pp("lstm"), 8, 16, RNNConfig::default()).unwrap();
//!
//! let input = Tensor::<Backend, 3>::zeros([2, 5, 8], &device);
//! let (output, state) = lstm.seq(input).unwrap();
//!
//! assert_eq!(output.dims(), [2, 5, 16]);
//! assert_eq!(state.h().dims(), [1, 2, 16]);
//! ```
//!
//! ## Tensor Ownership
//!
//! Tensors are reference counted and released when their last handle is dropped.
//! Every state returned by a layer belongs to the caller; layer weights belong to
//! the layer and are never modified by the recurrent calls.

pub mod cells;
pub mod config;
pub mod error;
pub mod fused;
pub mod params;
pub mod rnn;
pub mod state;
pub mod weights;

pub mod prelude {
    pub use crate::config::RNNConfig;
    pub use crate::error::RNNError;
    pub use crate::params::{ParamSource, VarPath, VarStore};
    pub use crate::rnn::{AnyRNN, GRU, LSTM, RNN};
    pub use crate::state::{GRUState, LSTMState, State, StateKind};
    pub use crate::weights::{FlatWeights, FlatWeightsBuilder, WeightGroup, WeightLayout};
}
