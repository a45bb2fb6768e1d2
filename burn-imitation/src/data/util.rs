use burn::prelude::*;
use burn::tensor::ElementConversion;
use ndarray::Array2;

pub fn to_tensor<B: Backend>(rows: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let shape = [rows.nrows(), rows.ncols()];
    let values: Vec<f32> = rows.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

pub fn to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Array2<f32> {
    let [n_rows, n_cols] = tensor.dims();
    let values: Vec<f32> = tensor.into_data().iter::<f32>().collect();
    Array2::from_shape_vec((n_rows, n_cols), values).expect("tensor data matches its shape")
}

pub fn to_scalar<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}
