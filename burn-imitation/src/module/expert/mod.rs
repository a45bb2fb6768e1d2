//! Expert policies used to label observations.
//!
//! A serialized expert is a feed-forward network with observation
//! normalization, stored as named arrays:
//!
//! - `obsnorm/mean`, `obsnorm/meansq`: running moments of the observations;
//! - `hidden/{i}/W`, `hidden/{i}/b`: hidden layers, applied in order of `i`;
//! - `out/W`, `out/b`: the linear output layer;
//!
//! and a `nonlin_type` metadata entry (`tanh` or `lrelu`).

use std::path::Path;

use burn::prelude::*;
use burn::tensor::activation::{leaky_relu, tanh};
use ndarray::{Array1, Array2};
use thiserror::Error;
use tracing::debug;

use crate::data::array_file::{ArrayFile, ArrayFileError};
use crate::data::util::{to_rows, to_tensor};
use crate::module::component::Actor;

pub mod builtin;

pub use builtin::BuiltinExpert;

const NONLINEARITY_KEY: &str = "nonlin_type";
const OBSNORM_MEAN: &str = "obsnorm/mean";
const OBSNORM_MEANSQ: &str = "obsnorm/meansq";
const LEAKY_RELU_SLOPE: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ExpertError {
    #[error(transparent)]
    File(#[from] ArrayFileError),
    #[error("unknown nonlinearity `{0}`")]
    UnknownNonlinearity(String),
    #[error("inconsistent expert weights: {0}")]
    Shape(String),
    #[error("no built-in expert for `{0}`; pass an expert policy file")]
    NoBuiltin(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nonlinearity {
    Tanh,
    LeakyRelu,
}

impl Nonlinearity {
    fn parse(name: &str) -> Result<Self, ExpertError> {
        match name {
            "tanh" => Ok(Nonlinearity::Tanh),
            "lrelu" => Ok(Nonlinearity::LeakyRelu),
            other => Err(ExpertError::UnknownNonlinearity(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Nonlinearity::Tanh => "tanh",
            Nonlinearity::LeakyRelu => "lrelu",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerWeights {
    /// `[input, output]`
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

#[derive(Debug, Clone)]
pub struct ExpertWeights {
    pub obsnorm_mean: Array1<f32>,
    pub obsnorm_meansq: Array1<f32>,
    pub hidden: Vec<LayerWeights>,
    pub output: LayerWeights,
    pub nonlinearity: Nonlinearity,
}

impl ExpertWeights {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExpertError> {
        let file = ArrayFile::load(path)?;
        let nonlinearity = Nonlinearity::parse(file.metadata(NONLINEARITY_KEY).unwrap_or("tanh"))?;
        let layer = |prefix: &str| -> Result<LayerWeights, ExpertError> {
            Ok(LayerWeights {
                weight: file.matrix(&format!("{prefix}/W"))?,
                bias: file.vector(&format!("{prefix}/b"))?,
            })
        };

        let mut hidden = Vec::new();
        while file.contains(&format!("hidden/{}/W", hidden.len())) {
            hidden.push(layer(&format!("hidden/{}", hidden.len()))?);
        }

        let weights = ExpertWeights {
            obsnorm_mean: file.vector(OBSNORM_MEAN)?,
            obsnorm_meansq: file.vector(OBSNORM_MEANSQ)?,
            hidden,
            output: layer("out")?,
            nonlinearity,
        };
        weights.validate()?;
        debug!(
            hidden_layers = weights.hidden.len(),
            nonlinearity = weights.nonlinearity.name(),
            "loaded expert policy {} -> {}",
            weights.observation_size(),
            weights.action_size()
        );
        Ok(weights)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ExpertError> {
        let mut file = ArrayFile::new();
        file.set_metadata(NONLINEARITY_KEY, self.nonlinearity.name());
        file.insert_vector(OBSNORM_MEAN, &self.obsnorm_mean.to_vec());
        file.insert_vector(OBSNORM_MEANSQ, &self.obsnorm_meansq.to_vec());
        let layers = self
            .hidden
            .iter()
            .enumerate()
            .map(|(i, layer)| (format!("hidden/{i}"), layer))
            .chain([("out".to_string(), &self.output)]);
        for (prefix, layer) in layers {
            file.insert_matrix(&format!("{prefix}/W"), &layer.weight);
            file.insert_vector(&format!("{prefix}/b"), &layer.bias.to_vec());
        }
        file.save(path)?;
        Ok(())
    }

    pub fn observation_size(&self) -> usize {
        self.obsnorm_mean.len()
    }

    pub fn action_size(&self) -> usize {
        self.output.weight.ncols()
    }

    fn layers(&self) -> impl Iterator<Item = &LayerWeights> {
        self.hidden.iter().chain([&self.output])
    }

    fn validate(&self) -> Result<(), ExpertError> {
        if self.obsnorm_meansq.len() != self.obsnorm_mean.len() {
            return Err(ExpertError::Shape(format!(
                "{} observation means but {} mean squares",
                self.obsnorm_mean.len(),
                self.obsnorm_meansq.len()
            )));
        }
        let mut width = self.observation_size();
        for layer in self.layers() {
            let (rows, cols) = layer.weight.dim();
            if rows != width || layer.bias.len() != cols {
                return Err(ExpertError::Shape(format!(
                    "layer of shape {rows}x{cols} with {} biases follows width {width}",
                    layer.bias.len()
                )));
            }
            width = cols;
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ExpertPolicy<B> {
        let row = |values: Array1<f32>| to_tensor::<B>(&values.insert_axis(ndarray::Axis(0)), device);
        let stdev = (&self.obsnorm_meansq - &self.obsnorm_mean.mapv(|m| m * m))
            .mapv(|variance| variance.max(0.0).sqrt());
        ExpertPolicy {
            obsnorm_mean: row(self.obsnorm_mean.clone()),
            obsnorm_stdev: row(stdev),
            layers: self
                .layers()
                .map(|layer| (to_tensor(&layer.weight, device), row(layer.bias.clone())))
                .collect(),
            nonlinearity: self.nonlinearity,
            device: device.clone(),
        }
    }
}

/// A loaded expert network, ready for inference.
#[derive(Debug)]
pub struct ExpertPolicy<B: Backend> {
    obsnorm_mean: Tensor<B, 2>,
    obsnorm_stdev: Tensor<B, 2>,
    layers: Vec<(Tensor<B, 2>, Tensor<B, 2>)>,
    nonlinearity: Nonlinearity,
    device: B::Device,
}

impl<B: Backend> ExpertPolicy<B> {
    pub fn load<P: AsRef<Path>>(path: P, device: &B::Device) -> Result<Self, ExpertError> {
        Ok(ExpertWeights::load(path)?.init(device))
    }

    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = (observations - self.obsnorm_mean.clone())
            .div(self.obsnorm_stdev.clone().add_scalar(1e-6));
        let last = self.layers.len() - 1;
        for (i, (weight, bias)) in self.layers.iter().enumerate() {
            x = x.matmul(weight.clone()) + bias.clone();
            if i < last {
                x = match self.nonlinearity {
                    Nonlinearity::Tanh => tanh(x),
                    Nonlinearity::LeakyRelu => leaky_relu(x, LEAKY_RELU_SLOPE),
                };
            }
        }
        x
    }

    pub fn observation_size(&self) -> usize {
        self.obsnorm_mean.dims()[1]
    }

    pub fn action_size(&self) -> usize {
        self.layers[self.layers.len() - 1].0.dims()[1]
    }
}

impl<B: Backend> Actor for ExpertPolicy<B> {
    fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32> {
        to_rows(self.forward(to_tensor(observations, &self.device)))
    }
}

/// Either a serialized expert network or the built-in controller of an environment.
#[derive(Debug)]
pub enum Expert<B: Backend> {
    Network(ExpertPolicy<B>),
    Builtin(BuiltinExpert),
}

impl<B: Backend> Expert<B> {
    pub fn load(
        policy_file: Option<&Path>,
        env_name: &str,
        device: &B::Device,
    ) -> Result<Self, ExpertError> {
        match policy_file {
            Some(path) => Ok(Expert::Network(ExpertPolicy::load(path, device)?)),
            None => Ok(Expert::Builtin(BuiltinExpert::for_environment(env_name)?)),
        }
    }

    pub fn observation_size(&self) -> usize {
        match self {
            Expert::Network(policy) => policy.observation_size(),
            Expert::Builtin(expert) => expert.observation_size(),
        }
    }

    pub fn action_size(&self) -> usize {
        match self {
            Expert::Network(policy) => policy.action_size(),
            Expert::Builtin(_) => 1,
        }
    }
}

impl<B: Backend> Actor for Expert<B> {
    fn a_batch(&self, observations: &Array2<f32>) -> Array2<f32> {
        match self {
            Expert::Network(policy) => policy.a_batch(observations),
            Expert::Builtin(expert) => expert.a_batch(observations),
        }
    }
}
