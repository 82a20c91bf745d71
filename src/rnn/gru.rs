//! Gated Recurrent Unit layer
//!
//! <https://en.wikipedia.org/wiki/Gated_recurrent_unit>

use super::RNN;
use crate::config::RNNConfig;
use crate::error::{RNNError, Result};
use crate::fused;
use crate::params::ParamSource;
use crate::state::GRUState;
use crate::weights::{FlatWeights, WeightLayout, GRU_GATES};
use burn::module::{Ignored, Module};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A Gated Recurrent Unit (GRU) layer.
///
/// Same weight layout as [`LSTM`](super::LSTM) with three gates per group and a
/// single hidden state.
#[derive(Module, Debug)]
pub struct GRU<B: Backend> {
    weights: FlatWeights<B>,
    input_dim: usize,
    hidden_dim: usize,
    config: Ignored<RNNConfig>,
}

impl<B: Backend> GRU<B> {
    /// Create a new GRU layer
    pub fn new<P: ParamSource<B>>(
        vs: &P,
        input_dim: usize,
        hidden_dim: usize,
        config: RNNConfig,
    ) -> Result<Self> {
        config.validate()?;
        if input_dim == 0 || hidden_dim == 0 {
            return Err(RNNError::InvalidConfig(format!(
                "GRU dims must be positive, got input {input_dim} hidden {hidden_dim}"
            )));
        }

        let layout = WeightLayout {
            gate_multiplier: GRU_GATES,
            input_dim,
            hidden_dim,
            num_layers: config.num_layers,
            num_directions: config.num_directions(),
        };
        let weights = FlatWeights::init(vs, layout)?;

        log::debug!(
            "built GRU: input {} hidden {} layers {} directions {} ({} tensors)",
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

    /// Assemble a GRU from already built weights
    pub fn from_weights(weights: FlatWeights<B>, config: RNNConfig) -> Result<Self> {
        config.validate()?;
        let layout = *weights.layout();
        if layout.gate_multiplier != GRU_GATES
            || layout.num_layers != config.num_layers
            || layout.num_directions != config.num_directions()
        {
            return Err(RNNError::WeightLayout(format!(
                "weights {layout:?} do not fit a GRU with {} layers x {} directions",
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

impl<B: Backend> RNN<B> for GRU<B> {
    type State = GRUState<B>;

    fn config(&self) -> &RNNConfig {
        &self.config
    }

    fn zero_state(&self, batch_dim: usize) -> GRUState<B> {
        let shape = [self.config.num_state_layers(), batch_dim, self.hidden_dim];
        GRUState::new(Tensor::zeros(shape, &self.device()))
    }

    fn seq_init(
        &self,
        input: Tensor<B, 3>,
        state: GRUState<B>,
    ) -> Result<(Tensor<B, 3>, GRUState<B>)> {
        let (output, h) = fused::gru(input, state.into_inner(), &self.weights, &self.config)?;

        Ok((output, GRUState::new(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::VarStore;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_gru_seq_bidirectional() {
        let device = Default::default();
        let vs = VarStore::<TestBackend>::new(&device);
        let gru = GRU::new(
            &vs.root().pp("gru"),
            6,
            12,
            RNNConfig::default().with_bidirectional(true),
        )
        .unwrap();

        let input = Tensor::<TestBackend, 3>::ones([2, 5, 6], &device);
        let (output, state) = gru.seq(input).unwrap();

        assert_eq!(output.dims(), [2, 5, 24]);
        assert_eq!(state.dims(), [2, 2, 12]);
    }

    #[test]
    fn test_gru_step_sequence_first() {
        let device = Default::default();
        let vs = VarStore::<TestBackend>::new(&device);
        let gru = GRU::new(
            &vs.root(),
            6,
            12,
            RNNConfig::default().with_batch_first(false),
        )
        .unwrap();

        // Steps are always [batch, features], regardless of batch_first
        let state = gru.zero_state(3);
        let x = Tensor::<TestBackend, 2>::ones([3, 6], &device);
        let state = gru.step(x, state).unwrap();
        assert_eq!(state.dims(), [1, 3, 12]);
    }

    #[test]
    fn test_gru_from_weights_rejects_lstm_layout() {
        let device = Default::default();
        let vs = VarStore::<TestBackend>::new(&device);
        let lstm = crate::rnn::LSTM::new(&vs.root(), 4, 8, RNNConfig::default()).unwrap();

        let result = GRU::from_weights(lstm.weights().clone(), RNNConfig::default());
        assert!(matches!(result, Err(RNNError::WeightLayout(_))));
    }
}
