//! Integration tests for the GRU layer

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use fused_rnn::prelude::*;

type Backend = NdArray<f32>;

fn create_gru(input_dim: usize, hidden_dim: usize, config: RNNConfig) -> GRU<Backend> {
    let device = Default::default();
    let vs = VarStore::<Backend>::new(&device);
    GRU::new(&vs.root().pp("gru"), input_dim, hidden_dim, config).unwrap()
}

fn max_abs_diff(a: Tensor<Backend, 3>, b: Tensor<Backend, 3>) -> f32 {
    (a - b).abs().max().into_scalar()
}

#[test]
fn test_gru_zero_state_shapes() {
    for (num_layers, bidirectional) in [(1, false), (2, true), (3, false)] {
        let config = RNNConfig::default()
            .with_num_layers(num_layers)
            .with_bidirectional(bidirectional);
        let gru = create_gru(4, 6, config.clone());

        let state = gru.zero_state(3);
        assert_eq!(state.dims(), [config.num_state_layers(), 3, 6]);
        assert_eq!(state.value().abs().sum().into_scalar(), 0.0);
    }
}

#[test]
fn test_gru_step_matches_single_step_sequence() {
    let device = Default::default();
    let gru = create_gru(5, 4, RNNConfig::default().with_bidirectional(true));

    let x = Tensor::<Backend, 2>::random([2, 5], Distribution::Default, &device);
    let state = gru.zero_state(2);

    let stepped = gru.step(x.clone(), state.clone()).unwrap();
    let (output, sequenced) = gru.seq_init(x.unsqueeze_dim(1), state).unwrap();

    assert_eq!(output.dims(), [2, 1, 8]);
    assert!(max_abs_diff(stepped.value(), sequenced.value()) < 1e-6);
}

#[test]
fn test_gru_chained_sequences_match_full_sequence() {
    let device = Default::default();
    let config = RNNConfig::default().with_num_layers(2).with_train(false);
    let gru = create_gru(3, 5, config);

    let input = Tensor::<Backend, 3>::random([4, 6, 3], Distribution::Default, &device);
    let (full_output, full_state) = gru.seq(input.clone()).unwrap();

    let (head_output, head_state) = gru.seq(input.clone().narrow(1, 0, 2)).unwrap();
    let (tail_output, tail_state) = gru.seq_init(input.narrow(1, 2, 4), head_state).unwrap();

    let chained = Tensor::cat(vec![head_output, tail_output], 1);
    assert!(max_abs_diff(full_output, chained) < 1e-5);
    assert!(max_abs_diff(full_state.value(), tail_state.value()) < 1e-5);
}

#[test]
fn test_gru_sequence_first_layout() {
    let device = Default::default();
    let config = RNNConfig::default().with_batch_first(false);
    let gru = create_gru(3, 4, config);

    // [seq, batch, features]
    let input = Tensor::<Backend, 3>::random([6, 2, 3], Distribution::Default, &device);
    let (output, state) = gru.seq(input.clone()).unwrap();

    assert_eq!(output.dims(), [6, 2, 4]);
    assert_eq!(state.dims(), [1, 2, 4]);

    let mut stepped = gru.zero_state(2);
    for t in 0..6 {
        let x = input.clone().narrow(0, t, 1).reshape([2, 3]);
        stepped = gru.step(x, stepped).unwrap();
    }
    assert!(max_abs_diff(state.value(), stepped.value()) < 1e-5);
}

#[test]
fn test_gru_zero_input_from_zero_state() {
    let device = Default::default();
    let gru = create_gru(5, 4, RNNConfig::default());

    let input = Tensor::<Backend, 3>::zeros([2, 3, 5], &device);
    let (output, state) = gru.seq(input).unwrap();

    assert_eq!(output.dims(), [2, 3, 4]);
    assert_eq!(output.abs().sum().into_scalar(), 0.0);
    assert_eq!(state.value().abs().sum().into_scalar(), 0.0);
}

#[test]
fn test_gru_weight_count_and_names() {
    let device = Default::default();
    let vs = VarStore::<Backend>::new(&device);
    let config = RNNConfig::default()
        .with_num_layers(2)
        .with_bidirectional(true);
    let gru = GRU::new(&vs.root().pp("gru"), 4, 2, config).unwrap();

    assert_eq!(gru.weights().num_tensors(), 16);
    assert_eq!(gru.weights().flat_shapes()[0], vec![6, 4]);
    assert_eq!(gru.weights().flat_shapes()[8], vec![6, 4]);

    let vars = vs.vars();
    assert_eq!(vars[4].name, "gru.l0_reverse.w_ih");
    assert_eq!(vars[9].name, "gru.l1.w_hh");
    assert_eq!(vars[9].shape, vec![6, 2]);
}

#[test]
fn test_gru_rejects_wrong_feature_dim() {
    let device = Default::default();
    let gru = create_gru(5, 4, RNNConfig::default());

    let input = Tensor::<Backend, 3>::zeros([2, 3, 7], &device);
    assert!(matches!(
        gru.seq(input),
        Err(RNNError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_gru_zeroed_weights_keep_zero_state() {
    let device = Default::default();
    let source = create_gru(3, 4, RNNConfig::default());

    // Zero every weight matrix and keep only the (zero) biases
    let mut builder = FlatWeightsBuilder::new(*source.weights().layout()).unwrap();
    for group in source.weights().groups() {
        builder
            .push(WeightGroup::new(
                group.w_ih.clone().map(|w| w.zeros_like()),
                group.w_hh.clone().map(|w| w.zeros_like()),
                group.b_ih.clone(),
                group.b_hh.clone(),
            ))
            .unwrap();
    }
    let gru = GRU::from_weights(builder.build().unwrap(), RNNConfig::default()).unwrap();

    let input = Tensor::<Backend, 3>::zeros([2, 3, 3], &device);
    let (output, state) = gru.seq(input).unwrap();

    assert_eq!(output.dims(), [2, 3, 4]);
    assert_eq!(state.dims(), [1, 2, 4]);
    assert_eq!(output.abs().sum().into_scalar(), 0.0);
    assert_eq!(state.value().abs().sum().into_scalar(), 0.0);
}
