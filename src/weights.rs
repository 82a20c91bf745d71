//! Flat weight layout consumed by the fused recurrent kernels
//!
//! The kernels read one [`WeightGroup`] per (layer, direction) pair, with groups
//! ordered layer-major and direction-minor:
//!
//! ```text
//! l0 fwd, l0 rev, l1 fwd, l1 rev, ...
//! ```
//!
//! Each group flattens to `[w_ih, w_hh, b_ih, b_hh]`. Groups can only be added
//! through [`FlatWeightsBuilder`], which checks every group against the slot it
//! fills, so a reordered or mis-shaped list is rejected at build time.

use crate::error::{RNNError, Result};
use crate::params::ParamSource;
use burn::module::{Ignored, Module, Param};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};

/// Gate count of an LSTM cell (input, forget, cell, output)
pub const LSTM_GATES: usize = 4;
/// Gate count of a GRU cell (reset, update, new)
pub const GRU_GATES: usize = 3;

/// Number of flat tensors contributed by one weight group
pub const TENSORS_PER_GROUP: usize = 4;

/// Dimensions of a flat weight list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightLayout {
    pub gate_multiplier: usize,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub num_layers: usize,
    pub num_directions: usize,
}

impl WeightLayout {
    /// Rows of every weight matrix and length of every bias
    pub fn gate_dim(&self) -> usize {
        self.gate_multiplier * self.hidden_dim
    }

    /// Input width seen by `layer`: the raw input for layer 0, the
    /// concatenated directions of the previous layer otherwise
    pub fn layer_input_dim(&self, layer: usize) -> usize {
        if layer == 0 {
            self.input_dim
        } else {
            self.hidden_dim * self.num_directions
        }
    }

    pub fn num_groups(&self) -> usize {
        self.num_layers * self.num_directions
    }

    pub fn num_tensors(&self) -> usize {
        self.num_groups() * TENSORS_PER_GROUP
    }

    /// (layer, direction) of the group at `index`
    pub fn slot(&self, index: usize) -> (usize, usize) {
        (index / self.num_directions, index % self.num_directions)
    }

    pub fn group_index(&self, layer: usize, direction: usize) -> usize {
        layer * self.num_directions + direction
    }

    /// Expected shapes `[w_ih, w_hh, b_ih, b_hh]` for a group of `layer`
    pub fn group_shapes(&self, layer: usize) -> [Vec<usize>; TENSORS_PER_GROUP] {
        let gate_dim = self.gate_dim();
        [
            vec![gate_dim, self.layer_input_dim(layer)],
            vec![gate_dim, self.hidden_dim],
            vec![gate_dim],
            vec![gate_dim],
        ]
    }
}

/// Weights and biases for one (layer, direction) pair
#[derive(Module, Debug)]
pub struct WeightGroup<B: Backend> {
    pub w_ih: Param<Tensor<B, 2>>,
    pub w_hh: Param<Tensor<B, 2>>,
    pub b_ih: Param<Tensor<B, 1>>,
    pub b_hh: Param<Tensor<B, 1>>,
}

impl<B: Backend> WeightGroup<B> {
    pub fn new(
        w_ih: Param<Tensor<B, 2>>,
        w_hh: Param<Tensor<B, 2>>,
        b_ih: Param<Tensor<B, 1>>,
        b_hh: Param<Tensor<B, 1>>,
    ) -> Self {
        Self {
            w_ih,
            w_hh,
            b_ih,
            b_hh,
        }
    }

    /// Shapes in flat order
    pub fn shapes(&self) -> [Vec<usize>; TENSORS_PER_GROUP] {
        [
            self.w_ih.val().dims().to_vec(),
            self.w_hh.val().dims().to_vec(),
            self.b_ih.val().dims().to_vec(),
            self.b_hh.val().dims().to_vec(),
        ]
    }
}

/// Ordered weight groups of a recurrent layer
#[derive(Module, Debug)]
pub struct FlatWeights<B: Backend> {
    groups: Vec<WeightGroup<B>>,
    layout: Ignored<WeightLayout>,
}

impl<B: Backend> FlatWeights<B> {
    /// Allocate every group of `layout` from `vs`
    ///
    /// Group `(l, d)` is registered under the scope `l{l}` (forward) or
    /// `l{l}_reverse`, with Kaiming-uniform weights and zero biases.
    pub fn init<P: ParamSource<B>>(vs: &P, layout: WeightLayout) -> Result<Self> {
        let gate_dim = layout.gate_dim();
        let mut builder = FlatWeightsBuilder::new(layout)?;

        while let Some((layer, direction)) = builder.next_slot() {
            let scope = if direction == 0 {
                vs.sub(&format!("l{layer}"))
            } else {
                vs.sub(&format!("l{layer}_reverse"))
            };

            builder.push(WeightGroup::new(
                scope.kaiming_uniform("w_ih", [gate_dim, layout.layer_input_dim(layer)]),
                scope.kaiming_uniform("w_hh", [gate_dim, layout.hidden_dim]),
                scope.zeros("b_ih", [gate_dim]),
                scope.zeros("b_hh", [gate_dim]),
            ))?;
        }

        builder.build()
    }

    pub fn layout(&self) -> &WeightLayout {
        &self.layout
    }

    pub fn groups(&self) -> &[WeightGroup<B>] {
        &self.groups
    }

    /// Group of `(layer, direction)`, `None` when either is out of range
    pub fn group(&self, layer: usize, direction: usize) -> Option<&WeightGroup<B>> {
        if layer >= self.layout.num_layers || direction >= self.layout.num_directions {
            return None;
        }
        self.groups.get(self.layout.group_index(layer, direction))
    }

    /// Number of tensors in the flattened list
    pub fn num_tensors(&self) -> usize {
        self.groups.len() * TENSORS_PER_GROUP
    }

    /// Shapes of every tensor, in the exact order the kernels consume them
    pub fn flat_shapes(&self) -> Vec<Vec<usize>> {
        self.groups.iter().flat_map(|g| g.shapes()).collect()
    }

    pub fn device(&self) -> B::Device {
        self.groups[0].w_ih.val().device()
    }
}

/// Incremental, order-checked construction of [`FlatWeights`]
pub struct FlatWeightsBuilder<B: Backend> {
    layout: WeightLayout,
    groups: Vec<WeightGroup<B>>,
}

impl<B: Backend> FlatWeightsBuilder<B> {
    pub fn new(layout: WeightLayout) -> Result<Self> {
        if layout.gate_multiplier == 0
            || layout.input_dim == 0
            || layout.hidden_dim == 0
            || layout.num_layers == 0
            || !(1..=2).contains(&layout.num_directions)
        {
            return Err(RNNError::WeightLayout(format!(
                "degenerate layout {layout:?}"
            )));
        }

        Ok(Self {
            layout,
            groups: Vec::with_capacity(layout.num_groups()),
        })
    }

    /// (layer, direction) the next pushed group will fill, if any
    pub fn next_slot(&self) -> Option<(usize, usize)> {
        if self.groups.len() < self.layout.num_groups() {
            Some(self.layout.slot(self.groups.len()))
        } else {
            None
        }
    }

    /// Append the group for the next slot
    pub fn push(&mut self, group: WeightGroup<B>) -> Result<()> {
        let (layer, direction) = self.next_slot().ok_or_else(|| {
            RNNError::WeightLayout(format!(
                "all {} groups already provided",
                self.layout.num_groups()
            ))
        })?;

        let expected = self.layout.group_shapes(layer);
        let actual = group.shapes();
        for (name, (want, got)) in ["w_ih", "w_hh", "b_ih", "b_hh"]
            .iter()
            .zip(expected.iter().zip(actual.iter()))
        {
            if want != got {
                return Err(RNNError::WeightLayout(format!(
                    "{name} for layer {layer} direction {direction}: expected {want:?}, got {got:?}"
                )));
            }
        }

        self.groups.push(group);
        Ok(())
    }

    pub fn build(self) -> Result<FlatWeights<B>> {
        if let Some((layer, direction)) = self.next_slot() {
            return Err(RNNError::WeightLayout(format!(
                "missing group for layer {layer} direction {direction}"
            )));
        }

        Ok(FlatWeights {
            groups: self.groups,
            layout: Ignored(self.layout),
        })
    }
}
