//! Streaming example for the LSTM and GRU layers
//!
//! Runs a whole sequence with `seq`, then feeds the same data one step at a time
//! and shows that both paths reach the same final state.

use burn::backend::NdArray;
use burn::tensor::{Distribution, Tensor};
use fused_rnn::prelude::*;

fn main() -> Result<(), RNNError> {
    println!("=== fused-rnn Streaming Example ===\n");

    type Backend = NdArray<f32>;
    let device = Default::default();
    let vs = VarStore::<Backend>::new(&device);
    let root = vs.root();

    // Input shape: [batch=2, seq=8, features=6]
    let input = Tensor::<Backend, 3>::random([2, 8, 6], Distribution::Uniform(-1.0, 1.0), &device);

    // Example 1: two-layer LSTM, inference mode
    println!("Example 1: LSTM");
    let config = RNNConfig::default().with_num_layers(2).with_train(false);
    let lstm = LSTM::new(&root.pp("lstm"), 6, 16, config)?;

    let (output, state) = lstm.seq(input.clone())?;
    println!("  Output shape: {:?}", output.dims());
    println!("  h shape:      {:?}", state.h().dims());
    println!("  c shape:      {:?}", state.c().dims());

    let mut streamed = lstm.zero_state(2);
    for t in 0..8 {
        let x = input.clone().narrow(1, t, 1).reshape([2, 6]);
        streamed = lstm.step(x, streamed)?;
    }
    let diff: f32 = (state.h() - streamed.h()).abs().max().into_scalar();
    println!("  Max |h_seq - h_step|: {diff:e}");
    println!();

    // Example 2: bidirectional GRU
    println!("Example 2: Bidirectional GRU");
    let gru = GRU::new(
        &root.pp("gru"),
        6,
        12,
        RNNConfig::default().with_bidirectional(true),
    )?;

    let (output, state) = gru.seq(input.clone())?;
    println!("  Output shape: {:?}", output.dims());
    println!("  h shape:      {:?}", state.dims());
    println!();

    // Example 3: both layers behind one type
    println!("Example 3: AnyRNN");
    let layers: Vec<AnyRNN<Backend>> = vec![lstm.into(), gru.into()];
    for layer in &layers {
        let (output, state) = layer.seq(input.clone())?;
        println!(
            "  {} layer: output {:?}, state {:?}",
            layer.state_kind(),
            output.dims(),
            state.dims()
        );
    }

    let x = Tensor::<Backend, 2>::zeros([2, 6], &device);
    if let Err(err) = layers[0].step(x, layers[1].zero_state(2)) {
        println!("  Mixing states fails: {err}");
    }
    println!();

    println!("Registered {} parameter tensors:", vs.len());
    for var in vs.vars().iter().take(4) {
        println!("  {} {:?}", var.name, var.shape);
    }
    println!("  ...");

    Ok(())
}
