//! Long Short-Term Memory layer
//!
//! <https://en.wikipedia.org/wiki/Long_short-term_memory>

use super::RNN;
use crate::config::RNNConfig;
use crate::error::{RNNError, Result};
use crate::fused;
use crate::params::ParamSource;
use crate::state::LSTMState;
use crate::weights::{FlatWeights, WeightLayout, LSTM_GATES};
use burn::module::{Ignored, Module};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A Long Short-Term Memory (LSTM) layer.
///
/// Owns one weight group per (layer, direction) pair; the weights are only read by
/// [`RNN`] calls and live as long as the layer.
///
/// # Type Parameters
/// * `B` - The backend type
#[derive(Module, Debug)]
pub struct LSTM<B: Backend> {
    weights: FlatWeights<B>,
    input_dim: usize,
    hidden_dim: usize,
    config: Ignored<RNNConfig>,
}

impl<B: Backend> LSTM<B> {
    /// Create a new LSTM layer
    ///
    /// # Arguments
    /// * `vs` - Parameter source the weights are allocated from
    /// * `input_dim` - Number of input features
    /// * `hidden_dim` - Number of hidden units
    /// * `config` - Layer configuration
    pub fn new<P: ParamSource<B>>(
        vs: &P,
        input_dim: usize,
        hidden_dim: usize,
        config: RNNConfig,
    ) -> Result<Self> {
        config.validate()?;
        if input_dim == 0 || hidden_dim == 0 {
            return Err(RNNError::InvalidConfig(format!(
                "LSTM dims must be positive, got input {input_dim} hidden {hidden_dim}"
            )));
        }

        let layout = WeightLayout {
            gate_multiplier: LSTM_GATES,
            input_dim,
            hidden_dim,
            num_layers: config.num_layers,
            num_directions: config.num_directions(),
        };
        let weights = FlatWeights::init(vs, layout)?;

        log::debug!(
            "built LSTM: input {} hidden {} layers {} directions {} ({} tensors)",
            input_dim,
            hidden_dim,
            config.num_layers,
            config.num_directions(),
            weights.num_tensors()
        );

        Ok(Self {
            weights,
            input_dim,
            hidden_dim,
            config: Ignored(config),
        })
    }

    /// Assemble an LSTM from already built weights
    pub fn from_weights(weights: FlatWeights<B>, config: RNNConfig) -> Result<Self> {
        config.validate()?;
        let layout = *weights.layout();
        if layout.gate_multiplier != LSTM_GATES
            || layout.num_layers != config.num_layers
            || layout.num_directions != config.num_directions()
        {
            return Err(RNNError::WeightLayout(format!(
                "weights {layout:?} do not fit an LSTM with {} layers x {} directions",
                config.num_layers,
                config.num_directions()
            )));
        }

        Ok(Self {
            weights,
            input_dim: layout.input_dim,
            hidden_dim: layout.hidden_dim,
            config: Ignored(config),
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn num_directions(&self) -> usize {
        self.config.num_directions()
    }

    pub fn weights(&self) -> &FlatWeights<B> {
        &self.weights
    }

    pub fn device(&self) -> B::Device {
        self.weights.device()
    }
}

impl<B: Backend> RNN<B> for LSTM<B> {
    type State = LSTMState<B>;

    fn config(&self) -> &RNNConfig {
        &self.config
    }

    fn zero_state(&self, batch_dim: usize) -> LSTMState<B> {
        let shape = [self.config.num_state_layers(), batch_dim, self.hidden_dim];
        let zeros = Tensor::<B, 3>::zeros(shape, &self.device());

        LSTMState::new(zeros.clone(), zeros)
    }

    fn seq_init(
        &self,
        input: Tensor<B, 3>,
        state: LSTMState<B>,
    ) -> Result<(Tensor<B, 3>, LSTMState<B>)> {
        let (output, h, c) =
            fused::lstm(input, state.into_parts(), &self.weights, &self.config)?;

        Ok((output, LSTMState::new(h, c)))
    }
}
