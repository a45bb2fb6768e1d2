//! Files of named, shaped numeric arrays stored in the safetensors format.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use bytemuck::{cast_slice, pod_collect_to_vec};
use ndarray::{Array1, Array2};
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArrayFileError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("safetensors: {0}")]
    Safetensors(#[from] safetensors::SafeTensorError),
    #[error("missing array `{0}`")]
    Missing(String),
    #[error("array `{name}` has unsupported dtype {dtype:?}")]
    UnsupportedDtype { name: String, dtype: Dtype },
    #[error("array `{name}` has shape {shape:?}, expected {expected}")]
    UnexpectedShape {
        name: String,
        shape: Vec<usize>,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
struct StoredArray {
    dtype: Dtype,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl StoredArray {
    fn values_f64(&self, name: &str) -> Result<Vec<f64>, ArrayFileError> {
        match self.dtype {
            Dtype::F32 => Ok(pod_collect_to_vec::<u8, f32>(&self.bytes)
                .into_iter()
                .map(f64::from)
                .collect()),
            Dtype::F64 => Ok(pod_collect_to_vec::<u8, f64>(&self.bytes)),
            dtype => Err(ArrayFileError::UnsupportedDtype {
                name: name.to_string(),
                dtype,
            }),
        }
    }

    fn values_f32(&self, name: &str) -> Result<Vec<f32>, ArrayFileError> {
        match self.dtype {
            Dtype::F32 => Ok(pod_collect_to_vec::<u8, f32>(&self.bytes)),
            _ => Ok(self
                .values_f64(name)?
                .into_iter()
                .map(|x| x as f32)
                .collect()),
        }
    }
}

/// An in-memory set of named arrays plus optional string metadata.
#[derive(Debug, Clone, Default)]
pub struct ArrayFile {
    arrays: BTreeMap<String, StoredArray>,
    metadata: HashMap<String, String>,
}

impl ArrayFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArrayFileError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArrayFileError> {
        let (_, header) = SafeTensors::read_metadata(bytes)?;
        let metadata = header.metadata().clone().unwrap_or_default();
        let tensors = SafeTensors::deserialize(bytes)?;
        let arrays = tensors
            .tensors()
            .into_iter()
            .map(|(name, view)| {
                let stored = StoredArray {
                    dtype: view.dtype(),
                    shape: view.shape().to_vec(),
                    bytes: view.data().to_vec(),
                };
                (name, stored)
            })
            .collect();
        Ok(ArrayFile { arrays, metadata })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArrayFileError> {
        let mut views: BTreeMap<String, TensorView<'_>> = BTreeMap::new();
        for (name, stored) in &self.arrays {
            views.insert(
                name.clone(),
                TensorView::new(stored.dtype, stored.shape.clone(), &stored.bytes)?,
            );
        }
        let metadata = (!self.metadata.is_empty()).then(|| self.metadata.clone());
        Ok(safetensors::serialize(&views, &metadata)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArrayFileError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn shape(&self, name: &str) -> Result<&[usize], ArrayFileError> {
        Ok(&self.get(name)?.shape)
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn insert_matrix(&mut self, name: &str, values: &Array2<f32>) {
        let flat: Vec<f32> = values.iter().copied().collect();
        self.arrays.insert(
            name.to_string(),
            StoredArray {
                dtype: Dtype::F32,
                shape: vec![values.nrows(), values.ncols()],
                bytes: cast_slice(&flat).to_vec(),
            },
        );
    }

    pub fn insert_vector(&mut self, name: &str, values: &[f32]) {
        self.arrays.insert(
            name.to_string(),
            StoredArray {
                dtype: Dtype::F32,
                shape: vec![values.len()],
                bytes: cast_slice(values).to_vec(),
            },
        );
    }

    pub fn insert_vector_f64(&mut self, name: &str, values: &[f64]) {
        self.arrays.insert(
            name.to_string(),
            StoredArray {
                dtype: Dtype::F64,
                shape: vec![values.len()],
                bytes: cast_slice(values).to_vec(),
            },
        );
    }

    /// Reads an array as rows, flattening every axis after the first into columns.
    pub fn matrix(&self, name: &str) -> Result<Array2<f32>, ArrayFileError> {
        let stored = self.get(name)?;
        let Some((&rows, rest)) = stored.shape.split_first() else {
            return Err(ArrayFileError::UnexpectedShape {
                name: name.to_string(),
                shape: stored.shape.clone(),
                expected: "at least one axis",
            });
        };
        let cols = rest.iter().product::<usize>();
        let values = stored.values_f32(name)?;
        Array2::from_shape_vec((rows, cols), values).map_err(|_| ArrayFileError::UnexpectedShape {
            name: name.to_string(),
            shape: stored.shape.clone(),
            expected: "data matching its shape",
        })
    }

    /// Reads an array of any rank as a flat vector.
    pub fn vector(&self, name: &str) -> Result<Array1<f32>, ArrayFileError> {
        Ok(Array1::from_vec(self.get(name)?.values_f32(name)?))
    }

    pub fn vector_f64(&self, name: &str) -> Result<Array1<f64>, ArrayFileError> {
        Ok(Array1::from_vec(self.get(name)?.values_f64(name)?))
    }

    fn get(&self, name: &str) -> Result<&StoredArray, ArrayFileError> {
        self.arrays
            .get(name)
            .ok_or_else(|| ArrayFileError::Missing(name.to_string()))
    }
}
