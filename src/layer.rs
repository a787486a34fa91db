//! The layer capability contract.
//!
//! Every unit of a network (affine, activation, or a composite of other layers) implements
//! [`Layer`]. Gradients are hand-derived per layer; there is no autodiff graph.
//!
//! Call protocol for one training step:
//!
//! 1. `forward(x)` caches whatever `backward` needs (last input, activation mask).
//! 2. `backward(d_out)` reads that cache, stores parameter gradients, and returns `d_in`.
//! 3. `update(lr)` applies `param -= lr * grad` in place.
//!
//! [`Layer::infer`] computes the same output as `forward` without touching the cache, so a
//! shared, immutable model can serve concurrent readers.

use crate::Result;
use crate::tensor::Matrix;

/// Flat, ordered access to the learnable scalars of a model.
///
/// Order is fixed: composite traversal in insertion order; within a layer, weights
/// (row-major) before biases. For every implementor:
///
/// - `params().len() == num_params()`
/// - `set_params(&params())` leaves the model unchanged
/// - `set_params` with a slice of any other length fails with `Error::Length`
pub trait Params {
    fn num_params(&self) -> usize;

    /// Append this model's parameters to `out`.
    fn write_params(&self, out: &mut Vec<f32>);

    fn set_params(&mut self, params: &[f32]) -> Result<()>;

    fn params(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.num_params());
        self.write_params(&mut out);
        out
    }
}

pub trait Layer: Params + Send + Sync {
    /// Forward pass for a `[batch, features]` input, caching state for `backward`.
    fn forward(&mut self, input: &Matrix) -> Result<Matrix>;

    /// Side-effect-free forward pass (no cache writes).
    fn infer(&self, input: &Matrix) -> Result<Matrix>;

    /// Backward pass: consumes `dL/d(output)` and returns `dL/d(input)`.
    ///
    /// Must follow a `forward` whose output had the same shape as `grad`.
    fn backward(&mut self, grad: &Matrix) -> Result<Matrix>;

    /// Gradient-descent step using the gradients stored by the last `backward`.
    fn update(&mut self, lr: f32);

    fn clone_box(&self) -> Box<dyn Layer>;

    /// Short human-readable description, e.g. `Dense(3 -> 64)`.
    fn describe(&self) -> String;
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Weight initialization scheme for dense layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Init {
    /// `U(-s, s)` with `s = sqrt(2 / fan_in)`.
    #[default]
    HeUniform,
    /// `N(0, s²)` with `s = sqrt(2 / fan_in)`.
    HeNormal,
}

impl Init {
    #[inline]
    pub(crate) fn scale(self, fan_in: usize) -> f32 {
        (2.0 / fan_in as f32).sqrt()
    }
}
