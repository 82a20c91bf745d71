//! Configuration shared by the LSTM and GRU layers

use crate::error::{RNNError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the GRU and LSTM layers
///
/// Both layer types read the same flags; they are forwarded unchanged to the
/// fused kernels on every call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RNNConfig {
    /// Whether the `b_ih` / `b_hh` biases take part in the gate computation
    pub has_biases: bool,
    /// Number of stacked recurrent layers
    pub num_layers: usize,
    /// Dropout probability applied between stacked layers
    pub dropout: f64,
    /// Training mode; dropout is only applied when set
    pub train: bool,
    /// Run a second, time-reversed direction per layer
    pub bidirectional: bool,
    /// Inputs and outputs are `[batch, seq, features]` instead of `[seq, batch, features]`
    pub batch_first: bool,
}

impl Default for RNNConfig {
    fn default() -> Self {
        Self {
            has_biases: true,
            num_layers: 1,
            dropout: 0.0,
            train: true,
            bidirectional: false,
            batch_first: true,
        }
    }
}

impl RNNConfig {
    /// Set whether biases are used (default: true)
    pub fn with_has_biases(mut self, has_biases: bool) -> Self {
        self.has_biases = has_biases;
        self
    }

    /// Set the number of stacked layers (default: 1)
    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Set the inter-layer dropout probability (default: 0.0)
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Set training mode (default: true)
    pub fn with_train(mut self, train: bool) -> Self {
        self.train = train;
        self
    }

    /// Set whether the layer is bidirectional (default: false)
    pub fn with_bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    /// Set whether input is batch-first (default: true)
    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn num_directions(&self) -> usize {
        if self.bidirectional {
            2
        } else {
            1
        }
    }

    /// Leading dimension of every state tensor: `num_layers * num_directions`
    pub fn num_state_layers(&self) -> usize {
        self.num_layers * self.num_directions()
    }

    /// Whether the kernels should sample dropout masks between layers
    pub fn dropout_active(&self) -> bool {
        self.train && self.dropout > 0.0
    }

    /// Axis holding the time dimension of a sequence tensor
    pub fn time_axis(&self) -> usize {
        if self.batch_first {
            1
        } else {
            0
        }
    }

    /// Axis holding the batch dimension of a sequence tensor
    pub fn batch_axis(&self) -> usize {
        if self.batch_first {
            0
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_layers == 0 {
            return Err(RNNError::InvalidConfig(
                "num_layers must be at least 1".to_string(),
            ));
        }
        if !self.dropout.is_finite() || !(0.0..1.0).contains(&self.dropout) {
            return Err(RNNError::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}
