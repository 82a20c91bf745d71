use super::{gate, linear, RecurrentCell};
use crate::weights::WeightGroup;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// LSTM cell over packed gate weights
///
/// Implements the standard LSTM equations:
/// - i = sigmoid(W_ii @ x + b_ii + W_hi @ h + b_hi)
/// - f = sigmoid(W_if @ x + b_if + W_hf @ h + b_hf)
/// - g = tanh(W_ig @ x + b_ig + W_hg @ h + b_hg)
/// - o = sigmoid(W_io @ x + b_io + W_ho @ h + b_ho)
/// - c' = f * c + i * g
/// - h' = o * tanh(c')
///
/// Weight rows are packed in gate order i, f, g, o.
#[derive(Debug, Clone)]
pub struct LSTMCell<B: Backend> {
    hidden_size: usize,
    w_ih: Tensor<B, 2>,
    w_hh: Tensor<B, 2>,
    b_ih: Option<Tensor<B, 1>>,
    b_hh: Option<Tensor<B, 1>>,
}

impl<B: Backend> RecurrentCell<B> for LSTMCell<B> {
    /// (hidden_state, cell_state)
    type Hidden = (Tensor<B, 2>, Tensor<B, 2>);

    fn from_group(group: &WeightGroup<B>, has_biases: bool) -> Self {
        let w_hh = group.w_hh.val();
        let (b_ih, b_hh) = if has_biases {
            (Some(group.b_ih.val()), Some(group.b_hh.val()))
        } else {
            (None, None)
        };

        Self {
            hidden_size: w_hh.dims()[1],
            w_ih: group.w_ih.val(),
            w_hh,
            b_ih,
            b_hh,
        }
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn project_input(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        linear(input, &self.w_ih, self.b_ih.as_ref())
    }

    fn forward(&self, projected: Tensor<B, 2>, hidden: Self::Hidden) -> Self::Hidden {
        let (hidden_state, cell_state) = hidden;

        let gates = projected + linear(hidden_state, &self.w_hh, self.b_hh.as_ref());

        let input_gate = activation::sigmoid(gate(&gates, 0, self.hidden_size));
        let forget_gate = activation::sigmoid(gate(&gates, 1, self.hidden_size));
        let cell_gate = gate(&gates, 2, self.hidden_size).tanh();
        let output_gate = activation::sigmoid(gate(&gates, 3, self.hidden_size));

        let new_cell = forget_gate * cell_state + input_gate * cell_gate;
        let new_hidden = output_gate * new_cell.clone().tanh();

        (new_hidden, new_cell)
    }

    fn output(hidden: &Self::Hidden) -> Tensor<B, 2> {
        hidden.0.clone()
    }
}
