use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig, Tanh};
use burn::prelude::*;
use ndarray::Array2;

use crate::data::util::{to_rows, to_tensor};
use crate::module::component::Actor;

#[derive(Config)]
pub struct MultiLayerPerceptronConfig {
    /// Input size, hidden sizes..., output size.
    sizes: Vec<usize>,
    /// Probability of zeroing an input of each linear layer while training.
    #[config(default = 0.0)]
    dropout: f64,
    #[config(default = "Initializer::Normal { mean: 0.0, std: 1.0 }")]
    initializer: Initializer,
}

/// Linear layers with tanh between them. Dropout acts on the input of every
/// layer, and only on autodiff backends.
#[derive(Module, Debug)]
pub struct MultiLayerPerceptron<B: Backend> {
    linear_layers: Vec<Linear<B>>,
    dropout: Dropout,
    activation: Tanh,
}

impl MultiLayerPerceptronConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> MultiLayerPerceptron<B> {
        assert!(
            self.sizes.len() >= 2,
            "Unable to construct MLP. Expected sizes (input size, hidden size, ..., output size), got {:?}",
            self.sizes
        );

        let linear_layers = self
            .sizes
            .windows(2)
            .map(|pair| {
                LinearConfig::new(pair[0], pair[1])
                    .with_initializer(self.initializer.clone())
                    .init(device)
            })
            .collect();

        MultiLayerPerceptron {
            linear_layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            activation: Tanh::new(),
        }
    }
}

impl<B: Backend> MultiLayerPerceptron<B> {
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let mut x = input;
        for (i, layer) in self.linear_layers.iter().enumerate() {
            if i > 0 {
                x = self.activation.forward(x);
            }
            x = layer.forward(self.dropout.forward(x));
        }
        x
    }

    pub fn input_size(&self) -> usize {
        self.linear_layers[0].weight.val().dims()[0]
    }

    pub fn output_size(&self) -> usize {
        self.linear_layers[self.linear_layers.len() - 1].weight.val().dims()[1]
    }
}

impl<B: Backend> Actor for MultiLayerPerceptron<B> {
    fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32> {
        let input = to_tensor::<B>(observations, &self.devices()[0]);
        to_rows(self.forward(input))
    }
}
