//! # Single-timestep Recurrent Cells
//!
//! These cells apply one time step of a recurrence on packed gate weights, in the
//! layout used by [`WeightGroup`]. They are driven over whole sequences, layers and
//! directions by the fused kernels in [`crate::fused`].
//!
//! ## Cell Types
//!
//! | Cell | Gates | Hidden |
//! |------|-------|--------|
//! | [`LSTMCell`] | input, forget, cell, output | `(h, c)` |
//! | [`GRUCell`] | reset, update, new | `h` |
//!
//! ## Input Projection
//!
//! The input contribution `x @ W_ih^T + b_ih` does not depend on the recurrence, so
//! it is computed for all time steps at once with [`RecurrentCell::project_input`]
//! and sliced per step before calling [`RecurrentCell::forward`].
//!
//! ## Tensor Shapes
//!
//! | Tensor | Shape |
//! |--------|-------|
//! | `input` | `[n, input_size]` |
//! | `projected` | `[batch, gates * hidden_size]` |
//! | hidden tensors | `[batch, hidden_size]` |

pub mod gru_cell;
pub mod lstm_cell;

pub use gru_cell::GRUCell;
pub use lstm_cell::LSTMCell;

use crate::weights::WeightGroup;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// A recurrence over packed gate weights
pub trait RecurrentCell<B: Backend>: Sized {
    /// Per-step memory carried by the cell
    type Hidden;

    /// Build the cell from one weight group. Biases are ignored unless `has_biases`.
    fn from_group(group: &WeightGroup<B>, has_biases: bool) -> Self;

    fn hidden_size(&self) -> usize;

    /// `input @ W_ih^T + b_ih` for any number of rows
    fn project_input(&self, input: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Advance one step given the projected input of that step
    fn forward(&self, projected: Tensor<B, 2>, hidden: Self::Hidden) -> Self::Hidden;

    /// Output emitted for the step that produced `hidden`
    fn output(hidden: &Self::Hidden) -> Tensor<B, 2>;
}

/// `x @ w^T (+ b)`
pub(crate) fn linear<B: Backend>(
    x: Tensor<B, 2>,
    weight: &Tensor<B, 2>,
    bias: Option<&Tensor<B, 1>>,
) -> Tensor<B, 2> {
    let out = x.matmul(weight.clone().transpose());
    match bias {
        Some(b) => out + b.clone().unsqueeze::<2>(),
        None => out,
    }
}

/// Columns of gate `index` from a packed `[batch, gates * hidden_size]` tensor
pub(crate) fn gate<B: Backend>(packed: &Tensor<B, 2>, index: usize, hidden_size: usize) -> Tensor<B, 2> {
    packed.clone().narrow(1, index * hidden_size, hidden_size)
}
