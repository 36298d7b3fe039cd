// External imports
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation, backend::Backend, Tensor};
use serde::{Deserialize, Serialize};

/// Feed-forward price predictor: N → 2N+1 → N → 1, sigmoid on every layer
#[derive(Module, Debug)]
pub struct StockMlp<B: Backend> {
    window_size: usize,
    input_layer: Linear<B>,
    hidden_layer: Linear<B>,
    output_layer: Linear<B>,
}

impl<B: Backend> StockMlp<B> {
    /// Create a new network
    ///
    /// # Arguments
    ///
    /// * `window_size` - Number of inputs
    /// * `first_hidden` - Width of the first hidden layer
    /// * `second_hidden` - Width of the second hidden layer
    /// * `device` - Device to place tensors on
    pub fn new(
        window_size: usize,
        first_hidden: usize,
        second_hidden: usize,
        device: &B::Device,
    ) -> Self {
        Self {
            window_size,
            input_layer: LinearConfig::new(window_size, first_hidden).init(device),
            hidden_layer: LinearConfig::new(first_hidden, second_hidden).init(device),
            output_layer: LinearConfig::new(second_hidden, 1).init(device),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Forward pass: `[batch, window_size]` → `[batch, 1]`, outputs in (0, 1)
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = activation::sigmoid(self.input_layer.forward(x));
        let x = activation::sigmoid(self.hidden_layer.forward(x));
        activation::sigmoid(self.output_layer.forward(x))
    }
}

/// Layer sizes of a `StockMlp`, stored with the saved model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMlpConfig {
    pub window_size: usize,
    pub first_hidden: usize,
    pub second_hidden: usize,
}

impl StockMlpConfig {
    /// Standard topology for a window: hidden layers of 2N+1 and N units
    pub fn for_window(window_size: usize) -> Self {
        Self {
            window_size,
            first_hidden: 2 * window_size + 1,
            second_hidden: window_size,
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> StockMlp<B> {
        StockMlp::new(
            self.window_size,
            self.first_hidden,
            self.second_hidden,
            device,
        )
    }
}
