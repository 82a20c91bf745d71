use super::{gate, linear, RecurrentCell};
use crate::weights::WeightGroup;
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// GRU cell over packed gate weights
///
/// - r = sigmoid(W_ir @ x + b_ir + W_hr @ h + b_hr)
/// - z = sigmoid(W_iz @ x + b_iz + W_hz @ h + b_hz)
/// - n = tanh(W_in @ x + b_in + r * (W_hn @ h + b_hn))
/// - h' = (1 - z) * n + z * h
///
/// Weight rows are packed in gate order r, z, n.
#[derive(Debug, Clone)]
pub struct GRUCell<B: Backend> {
    hidden_size: usize,
    w_ih: Tensor<B, 2>,
    w_hh: Tensor<B, 2>,
    b_ih: Option<Tensor<B, 1>>,
    b_hh: Option<Tensor<B, 1>>,
}

impl<B: Backend> RecurrentCell<B> for GRUCell<B> {
    type Hidden = Tensor<B, 2>;

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
        // The hidden projection stays separate: r only scales its n block
        let recurrent = linear(hidden.clone(), &self.w_hh, self.b_hh.as_ref());

        let reset_gate = activation::sigmoid(
            gate(&projected, 0, self.hidden_size) + gate(&recurrent, 0, self.hidden_size),
        );
        let update_gate = activation::sigmoid(
            gate(&projected, 1, self.hidden_size) + gate(&recurrent, 1, self.hidden_size),
        );
        let new_gate = (gate(&projected, 2, self.hidden_size)
            + reset_gate * gate(&recurrent, 2, self.hidden_size))
        .tanh();

        // (1 - z) * n + z * h == n + z * (h - n)
        new_gate.clone() + update_gate * (hidden - new_gate)
    }

    fn output(hidden: &Self::Hidden) -> Tensor<B, 2> {
        hidden.clone()
    }
}
