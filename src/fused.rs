//! Fused multi-layer recurrent kernels
//!
//! Entry points taking the whole recurrence in one call: initial state, flat
//! weights and every [`RNNConfig`] flag. They validate shapes, run every layer and
//! direction with the cells from [`crate::cells`] and return the output sequence
//! together with the final state of each (layer, direction) pair.
//!
//! Layer `l > 0` consumes the output of layer `l - 1`, directions concatenated on
//! the feature axis. The reverse direction walks the sequence backwards and writes
//! each output back at its original time position.

use crate::cells::{GRUCell, LSTMCell, RecurrentCell};
use crate::config::RNNConfig;
use crate::error::{RNNError, Result};
use crate::weights::{FlatWeights, GRU_GATES, LSTM_GATES};
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

/// Run a multi-layer LSTM
///
/// # Arguments
/// * `input` - `[batch, seq, features]` if `batch_first`, else `[seq, batch, features]`
/// * `initial` - `(h_0, c_0)`, each `[num_layers * num_directions, batch, hidden_size]`
///
/// # Returns
/// `(output, h_n, c_n)` where output is `[batch, seq, num_directions * hidden_size]`
/// (or sequence-first) and `h_n`, `c_n` have the shape of the initial state.
pub fn lstm<B: Backend>(
    input: Tensor<B, 3>,
    initial: (Tensor<B, 3>, Tensor<B, 3>),
    weights: &FlatWeights<B>,
    config: &RNNConfig,
) -> Result<(Tensor<B, 3>, Tensor<B, 3>, Tensor<B, 3>)> {
    let (h0, c0) = initial;
    let input = check_input(input, weights, config, LSTM_GATES)?;
    let batch = input.dims()[0];
    check_state("LSTM hidden state", &h0, weights, config, batch)?;
    check_state("LSTM cell state", &c0, weights, config, batch)?;

    let initial = split_state(h0, batch)
        .into_iter()
        .zip(split_state(c0, batch))
        .collect();

    let (output, finals) = run_layers::<B, LSTMCell<B>>(input, initial, weights, config)?;
    let (hs, cs): (Vec<_>, Vec<_>) = finals.into_iter().unzip();

    Ok((
        restore_layout(output, config),
        Tensor::stack(hs, 0),
        Tensor::stack(cs, 0),
    ))
}

/// Run a multi-layer GRU
///
/// Shapes follow [`lstm`], with a single hidden state tensor.
pub fn gru<B: Backend>(
    input: Tensor<B, 3>,
    initial: Tensor<B, 3>,
    weights: &FlatWeights<B>,
    config: &RNNConfig,
) -> Result<(Tensor<B, 3>, Tensor<B, 3>)> {
    let input = check_input(input, weights, config, GRU_GATES)?;
    let batch = input.dims()[0];
    check_state("GRU hidden state", &initial, weights, config, batch)?;

    let initial = split_state(initial, batch);
    let (output, finals) = run_layers::<B, GRUCell<B>>(input, initial, weights, config)?;

    Ok((restore_layout(output, config), Tensor::stack(finals, 0)))
}

/// Validate the input and bring it to `[batch, seq, features]`
fn check_input<B: Backend>(
    input: Tensor<B, 3>,
    weights: &FlatWeights<B>,
    config: &RNNConfig,
    gate_multiplier: usize,
) -> Result<Tensor<B, 3>> {
    let layout = weights.layout();
    if layout.gate_multiplier != gate_multiplier {
        return Err(RNNError::WeightLayout(format!(
            "expected {} gates per layer, weights carry {}",
            gate_multiplier, layout.gate_multiplier
        )));
    }
    if layout.num_layers != config.num_layers || layout.num_directions != config.num_directions()
    {
        return Err(RNNError::InvalidConfig(format!(
            "config has {} layers x {} directions, weights have {} x {}",
            config.num_layers,
            config.num_directions(),
            layout.num_layers,
            layout.num_directions
        )));
    }

    let input = if config.batch_first {
        input
    } else {
        input.swap_dims(0, 1)
    };

    let [batch, seq_len, features] = input.dims();
    if batch == 0 || seq_len == 0 {
        return Err(RNNError::EmptySequence(vec![batch, seq_len, features]));
    }
    if features != layout.input_dim {
        return Err(RNNError::ShapeMismatch {
            context: "input features",
            expected: vec![layout.input_dim],
            actual: vec![features],
        });
    }

    Ok(input)
}

fn check_state<B: Backend>(
    context: &'static str,
    state: &Tensor<B, 3>,
    weights: &FlatWeights<B>,
    config: &RNNConfig,
    batch: usize,
) -> Result<()> {
    let expected = vec![
        config.num_state_layers(),
        batch,
        weights.layout().hidden_dim,
    ];
    let actual = state.dims().to_vec();
    if actual != expected {
        return Err(RNNError::ShapeMismatch {
            context,
            expected,
            actual,
        });
    }
    Ok(())
}

/// `[groups, batch, hidden]` into one `[batch, hidden]` tensor per group
fn split_state<B: Backend>(state: Tensor<B, 3>, batch: usize) -> Vec<Tensor<B, 2>> {
    let [groups, _, hidden] = state.dims();
    (0..groups)
        .map(|g| state.clone().narrow(0, g, 1).reshape([batch, hidden]))
        .collect()
}

fn restore_layout<B: Backend>(output: Tensor<B, 3>, config: &RNNConfig) -> Tensor<B, 3> {
    if config.batch_first {
        output
    } else {
        output.swap_dims(0, 1)
    }
}

fn run_layers<B: Backend, C: RecurrentCell<B>>(
    input: Tensor<B, 3>,
    initial: Vec<C::Hidden>,
    weights: &FlatWeights<B>,
    config: &RNNConfig,
) -> Result<(Tensor<B, 3>, Vec<C::Hidden>)> {
    let num_layers = config.num_layers;
    let num_directions = config.num_directions();

    let mut initial = initial.into_iter();
    let mut finals = Vec::with_capacity(num_layers * num_directions);
    let mut layer_input = input;

    for layer in 0..num_layers {
        let mut outputs = Vec::with_capacity(num_directions);

        for direction in 0..num_directions {
            let hidden = initial.next().ok_or_else(|| {
                RNNError::WeightLayout(format!(
                    "no initial state for layer {layer} direction {direction}"
                ))
            })?;
            log::trace!("running layer {layer} direction {direction}");

            let group = weights.group(layer, direction).ok_or_else(|| {
                RNNError::WeightLayout(format!(
                    "no weight group for layer {layer} direction {direction}"
                ))
            })?;
            let cell = C::from_group(group, config.has_biases);
            let (output, hidden) =
                run_direction(&cell, layer_input.clone(), hidden, direction == 1);
            outputs.push(output);
            finals.push(hidden);
        }

        let mut layer_output = Tensor::cat(outputs, 2);
        if config.dropout_active() && layer + 1 < num_layers {
            layer_output = dropout(layer_output, config.dropout);
        }
        layer_input = layer_output;
    }

    Ok((layer_input, finals))
}

fn run_direction<B: Backend, C: RecurrentCell<B>>(
    cell: &C,
    input: Tensor<B, 3>,
    mut hidden: C::Hidden,
    reverse: bool,
) -> (Tensor<B, 3>, C::Hidden) {
    let [batch, seq_len, features] = input.dims();

    let projected = cell.project_input(input.reshape([batch * seq_len, features]));
    let gate_dim = projected.dims()[1];
    let projected = projected.reshape([batch, seq_len, gate_dim]);

    let mut outputs = Vec::with_capacity(seq_len);
    for i in 0..seq_len {
        let t = if reverse { seq_len - 1 - i } else { i };
        let step_input = projected.clone().narrow(1, t, 1).reshape([batch, gate_dim]);
        hidden = cell.forward(step_input, hidden);
        outputs.push(C::output(&hidden));
    }
    if reverse {
        outputs.reverse();
    }

    (Tensor::stack(outputs, 1), hidden)
}

/// Inverted dropout: zero with probability `p`, scale survivors by `1 / (1 - p)`
fn dropout<B: Backend>(x: Tensor<B, 3>, p: f64) -> Tensor<B, 3> {
    let keep = 1.0 - p;
    let mask = Tensor::<B, 3>::random(x.shape(), Distribution::Bernoulli(keep), &x.device());
    (x * mask).div_scalar(keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::VarStore;
    use crate::weights::WeightLayout;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn build_weights(
        gate_multiplier: usize,
        input_dim: usize,
        hidden_dim: usize,
        config: &RNNConfig,
    ) -> FlatWeights<TestBackend> {
        let vs = VarStore::<TestBackend>::new(&Default::default());
        let layout = WeightLayout {
            gate_multiplier,
            input_dim,
            hidden_dim,
            num_layers: config.num_layers,
            num_directions: config.num_directions(),
        };
        FlatWeights::init(&vs.root(), layout).unwrap()
    }

    #[test]
    fn test_lstm_kernel_shapes() {
        let device = Default::default();
        let config = RNNConfig::default()
            .with_num_layers(2)
            .with_bidirectional(true);
        let weights = build_weights(LSTM_GATES, 6, 8, &config);

        let input = Tensor::<TestBackend, 3>::random([3, 5, 6], Distribution::Default, &device);
        let h0 = Tensor::<TestBackend, 3>::zeros([4, 3, 8], &device);
        let c0 = Tensor::<TestBackend, 3>::zeros([4, 3, 8], &device);

        let (output, h, c) = lstm(input, (h0, c0), &weights, &config).unwrap();
        assert_eq!(output.dims(), [3, 5, 16]);
        assert_eq!(h.dims(), [4, 3, 8]);
        assert_eq!(c.dims(), [4, 3, 8]);
    }

    #[test]
    fn test_final_hidden_matches_output() {
        let device = Default::default();
        let config = RNNConfig::default().with_bidirectional(true);
        let weights = build_weights(GRU_GATES, 4, 5, &config);

        let input = Tensor::<TestBackend, 3>::random([2, 7, 4], Distribution::Default, &device);
        let h0 = Tensor::<TestBackend, 3>::zeros([2, 2, 5], &device);
        let (output, h) = gru(input, h0, &weights, &config).unwrap();

        // forward direction ends at the last step, reverse at the first
        let fwd_last = output.clone().narrow(1, 6, 1).narrow(2, 0, 5).reshape([2, 5]);
        let rev_first = output.narrow(1, 0, 1).narrow(2, 5, 5).reshape([2, 5]);
        let h_fwd = h.clone().narrow(0, 0, 1).reshape([2, 5]);
        let h_rev = h.narrow(0, 1, 1).reshape([2, 5]);

        assert!((fwd_last - h_fwd).abs().max().into_scalar() < 1e-6);
        assert!((rev_first - h_rev).abs().max().into_scalar() < 1e-6);
    }

    #[test]
    fn test_sequence_first_layout() {
        let device = Default::default();
        let config = RNNConfig::default().with_batch_first(false);
        let weights = build_weights(GRU_GATES, 4, 5, &config);

        // [seq, batch, features]
        let input = Tensor::<TestBackend, 3>::ones([7, 2, 4], &device);
        let h0 = Tensor::<TestBackend, 3>::zeros([1, 2, 5], &device);
        let (output, h) = gru(input, h0, &weights, &config).unwrap();

        assert_eq!(output.dims(), [7, 2, 5]);
        assert_eq!(h.dims(), [1, 2, 5]);
    }

    #[test]
    fn test_shape_errors() {
        let device = Default::default();
        let config = RNNConfig::default();
        let weights = build_weights(GRU_GATES, 4, 5, &config);

        let wrong_features = Tensor::<TestBackend, 3>::ones([2, 3, 9], &device);
        let h0 = Tensor::<TestBackend, 3>::zeros([1, 2, 5], &device);
        assert!(matches!(
            gru(wrong_features, h0.clone(), &weights, &config),
            Err(RNNError::ShapeMismatch { .. })
        ));

        let wrong_batch = Tensor::<TestBackend, 3>::zeros([1, 3, 5], &device);
        let input = Tensor::<TestBackend, 3>::ones([2, 3, 4], &device);
        assert!(matches!(
            gru(input.clone(), wrong_batch, &weights, &config),
            Err(RNNError::ShapeMismatch { .. })
        ));

        let empty = Tensor::<TestBackend, 3>::zeros([2, 0, 4], &device);
        assert!(matches!(
            gru(empty, h0.clone(), &weights, &config),
            Err(RNNError::EmptySequence(_))
        ));

        // GRU weights cannot drive the LSTM kernel
        let c0 = h0.clone();
        assert!(matches!(
            lstm(input, (h0, c0), &weights, &config),
            Err(RNNError::WeightLayout(_))
        ));
    }

    #[test]
    fn test_dropout_scaling() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::ones([4, 8, 16], &device);
        let dropped = dropout(x, 0.5);

        // Survivors are scaled to 2.0, the rest are zero
        let data = dropped.into_data().to_vec::<f32>().unwrap();
        assert!(data.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));
    }
}
