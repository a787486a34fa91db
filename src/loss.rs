//! Mean squared error loss.
//!
//! Unlike layers, the loss consumes two tensors. `forward` caches the prediction and target;
//! `backward` returns `dL/d(pred)` for that cached pair:
//!
//! - `L = mean((pred - target)^2)` over all `batch * features` elements
//! - `dL/d(pred)[i, j] = 2 * (pred[i, j] - target[i, j]) / (batch * features)`

use crate::tensor::Matrix;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct MseLoss {
    cache: Option<(Matrix, Matrix)>,
}

impl MseLoss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, pred: &Matrix, target: &Matrix) -> Result<f32> {
        let loss = mse(pred, target)?;
        self.cache = Some((pred.clone(), target.clone()));
        Ok(loss)
    }

    pub fn backward(&self) -> Result<Matrix> {
        let (pred, target) = self
            .cache
            .as_ref()
            .ok_or_else(|| Error::logic("loss backward called before forward"))?;

        let n = pred.len();
        if n == 0 {
            return Ok(Matrix::zeros(*pred.shape()));
        }
        let scale = 2.0 / n as f32;
        Ok(pred.sub(target)?.scale(scale))
    }
}

/// Stateless MSE between two equally shaped matrices.
pub fn mse(pred: &Matrix, target: &Matrix) -> Result<f32> {
    if pred.shape() != target.shape() {
        return Err(Error::shape(format!(
            "prediction shape {:?} does not match target shape {:?}",
            pred.shape(),
            target.shape()
        )));
    }
    if pred.is_empty() {
        return Ok(0.0);
    }

    let mut sum_sq = 0.0_f32;
    for (p, t) in pred.iter().zip(target.iter()) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    Ok(sum_sq / pred.len() as f32)
}
