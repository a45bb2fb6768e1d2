pub mod multi_layer_perceptron;
