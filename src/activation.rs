//! Parameter-free activation layers.
//!
//! [`ReLU`] caches a `{0, 1}` mask of the positive inputs during `forward`; `backward`
//! multiplies the upstream gradient by that mask.

use crate::layer::{Layer, Params};
use crate::tensor::Matrix;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ReLU {
    mask: Option<Matrix>,
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Params for ReLU {
    fn num_params(&self) -> usize {
        0
    }

    fn write_params(&self, _out: &mut Vec<f32>) {}

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        if !params.is_empty() {
            return Err(Error::Length {
                expected: 0,
                got: params.len(),
            });
        }
        Ok(())
    }
}

impl Layer for ReLU {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        self.mask = Some(input.map(|v| if v > 0.0 { 1.0 } else { 0.0 }));
        self.infer(input)
    }

    fn infer(&self, input: &Matrix) -> Result<Matrix> {
        Ok(input.map(|v| v.max(0.0)))
    }

    fn backward(&mut self, grad: &Matrix) -> Result<Matrix> {
        let mask = self
            .mask
            .as_ref()
            .ok_or_else(|| Error::logic("relu backward called before forward"))?;
        if grad.shape() != mask.shape() {
            return Err(Error::shape(format!(
                "gradient shape {:?} does not match cached mask {:?}",
                grad.shape(),
                mask.shape()
            )));
        }
        grad.mul(mask)
    }

    fn update(&mut self, _lr: f32) {}

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        "ReLU".to_owned()
    }
}
