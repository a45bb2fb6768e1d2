use burn::backend::wgpu::WgpuDevice;
use burn::backend::{Autodiff, NdArray, Wgpu};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{Device, Distribution, Tensor};
use burn_imitation::{
    module::nn::multi_layer_perceptron::{MultiLayerPerceptron, MultiLayerPerceptronConfig},
    objective::imitation::{ImitationLoss, ImitationLossConfig},
};
use criterion::{criterion_group, criterion_main, Criterion};

const OBSERVATION_SIZE: usize = 11;
const ACTION_SIZE: usize = 3;

fn prepare_batch<B: AutodiffBackend>(
    device: &Device<B>,
    batch_size: usize,
) -> (Tensor<B, 2>, Tensor<B, 2>) {
    let observations = Tensor::random(
        [batch_size, OBSERVATION_SIZE],
        Distribution::Default,
        device,
    );
    let actions = Tensor::random([batch_size, ACTION_SIZE], Distribution::Default, device);
    (observations, actions)
}

fn loss_and_gradients<B: AutodiffBackend>(
    loss: &ImitationLoss,
    model: &MultiLayerPerceptron<B>,
    observations: &Tensor<B, 2>,
    actions: &Tensor<B, 2>,
) {
    let loss = loss.forward(model.forward(observations.clone()), actions.clone());
    loss.backward();
}

pub fn imitation_benchmark(c: &mut Criterion) {
    let loss = ImitationLossConfig::new().init();
    let model_config = MultiLayerPerceptronConfig::new([OBSERVATION_SIZE, 100, ACTION_SIZE].to_vec())
        .with_dropout(0.2);

    // NdArray
    type B1 = Autodiff<NdArray>;
    let device: &Device<B1> = &Default::default();
    let model = model_config.init::<B1>(device);
    let (observations, actions) = prepare_batch(device, 1000);

    c.bench_function("imitation ndarray", |b| {
        b.iter(|| loss_and_gradients(&loss, &model, &observations, &actions))
    });

    // Wgpu
    type B2 = Autodiff<Wgpu>;
    let device: &Device<B2> = &WgpuDevice::BestAvailable;
    let model = model_config.init::<B2>(device);
    let (observations, actions) = prepare_batch(device, 1000);

    c.bench_function("imitation wgpu", |b| {
        b.iter(|| loss_and_gradients(&loss, &model, &observations, &actions))
    });
}

criterion_group!(benches, imitation_benchmark);
criterion_main!(benches);
