//! Ordered composite layer.
//!
//! A [`Sequential`] is itself a [`Layer`], so composites nest. Parameters are the
//! concatenation of each child's parameters in insertion order.

use crate::layer::{Layer, Params};
use crate::tensor::Matrix;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layers(layers: Vec<Box<dyn Layer>>) -> Self {
        Self { layers }
    }

    pub fn add_layer(&mut self, layer: impl Layer + 'static) {
        self.layers.push(Box::new(layer));
    }

    /// Builder-style [`Sequential::add_layer`].
    pub fn with(mut self, layer: impl Layer + 'static) -> Self {
        self.add_layer(layer);
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }
}

pub(crate) fn chain_forward(layers: &mut [Box<dyn Layer>], input: &Matrix) -> Result<Matrix> {
    let mut x = input.clone();
    for layer in layers.iter_mut() {
        x = layer.forward(&x)?;
    }
    Ok(x)
}

pub(crate) fn chain_infer(layers: &[Box<dyn Layer>], input: &Matrix) -> Result<Matrix> {
    let mut x = input.clone();
    for layer in layers {
        x = layer.infer(&x)?;
    }
    Ok(x)
}

pub(crate) fn chain_backward(layers: &mut [Box<dyn Layer>], grad: &Matrix) -> Result<Matrix> {
    let mut g = grad.clone();
    for layer in layers.iter_mut().rev() {
        g = layer.backward(&g)?;
    }
    Ok(g)
}

pub(crate) fn count_params(layers: &[Box<dyn Layer>]) -> usize {
    layers.iter().map(|l| l.num_params()).sum()
}

/// Hand each layer its slice of `params`, in insertion order.
///
/// Layers without parameters are skipped so slice boundaries line up with
/// [`Params::write_params`]. The total length is checked before any layer is touched.
pub(crate) fn scatter_params(layers: &mut [Box<dyn Layer>], params: &[f32]) -> Result<()> {
    let expected = count_params(layers);
    if params.len() != expected {
        return Err(Error::Length {
            expected,
            got: params.len(),
        });
    }

    let mut offset = 0;
    for layer in layers.iter_mut() {
        let n = layer.num_params();
        if n == 0 {
            continue;
        }
        layer.set_params(&params[offset..offset + n])?;
        offset += n;
    }
    Ok(())
}

impl Params for Sequential {
    fn num_params(&self) -> usize {
        count_params(&self.layers)
    }

    fn write_params(&self, out: &mut Vec<f32>) {
        for layer in &self.layers {
            layer.write_params(out);
        }
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        scatter_params(&mut self.layers, params)
    }
}

impl Layer for Sequential {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        chain_forward(&mut self.layers, input)
    }

    fn infer(&self, input: &Matrix) -> Result<Matrix> {
        chain_infer(&self.layers, input)
    }

    fn backward(&mut self, grad: &Matrix) -> Result<Matrix> {
        chain_backward(&mut self.layers, grad)
    }

    fn update(&mut self, lr: f32) {
        for layer in &mut self.layers {
            layer.update(lr);
        }
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        let inner: Vec<String> = self.layers.iter().map(|l| l.describe()).collect();
        format!("Sequential[{}]", inner.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ReLU;
    use crate::dense::Dense;
    use crate::loss::{MseLoss, mse};
    use crate::tensor::Vector;

    fn small_stack(seed: u64) -> Sequential {
        Sequential::new()
            .with(Dense::new_with_seed(2, 3, seed).unwrap())
            .with(ReLU::new())
            .with(Dense::new_with_seed(3, 2, seed + 1).unwrap())
    }

    fn assert_close(analytic: f32, numeric: f32, abs_tol: f32, rel_tol: f32) {
        let diff = (analytic - numeric).abs();
        let scale = analytic.abs().max(numeric.abs()).max(1.0);
        assert!(
            diff <= abs_tol || diff / scale <= rel_tol,
            "analytic={analytic} numeric={numeric} diff={diff}"
        );
    }

    #[test]
    fn params_concatenate_in_insertion_order() {
        let model = small_stack(0);
        assert_eq!(model.num_params(), (2 * 3 + 3) + (3 * 2 + 2));

        let mut expected = Vec::new();
        for layer in model.layers() {
            expected.extend(layer.params());
        }
        assert_eq!(model.params(), expected);
    }

    #[test]
    fn set_params_skips_parameter_free_layers() {
        let mut model = small_stack(0);
        let fresh: Vec<f32> = (0..model.num_params()).map(|i| i as f32).collect();
        model.set_params(&fresh).unwrap();
        assert_eq!(model.params(), fresh);

        // The second dense layer starts right after the first one's 9 values.
        assert_eq!(model.layers()[2].params()[0], 9.0);
    }

    #[test]
    fn set_params_rejects_wrong_length_without_partial_writes() {
        let mut model = small_stack(0);
        let before = model.params();
        let err = model.set_params(&before[1..]).unwrap_err();
        assert_eq!(
            err,
            Error::Length {
                expected: before.len(),
                got: before.len() - 1
            }
        );
        assert_eq!(model.params(), before);
    }

    #[test]
    fn nested_composites_flatten_identically() {
        let inner = small_stack(5);
        let flat_params = inner.params();
        let mut outer = Sequential::new().with(inner).with(ReLU::new());
        assert_eq!(outer.params(), flat_params);

        outer.set_params(&flat_params).unwrap();
        assert_eq!(outer.params(), flat_params);
        assert!(outer.describe().starts_with("Sequential[Sequential[Dense(2 -> 3)"));
    }

    #[test]
    fn forward_and_infer_agree() {
        let mut model = small_stack(7);
        let x = Matrix::from_vec([2, 2], vec![0.5, -0.2, 1.0, 0.3]).unwrap();
        let a = model.infer(&x).unwrap();
        let b = model.forward(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn backward_matches_numeric_gradients() {
        let dense = |in_f: usize, out_f: usize, w: &[f32], b: &[f32]| {
            Dense::from_parts(
                Matrix::from_vec([in_f, out_f], w.to_vec()).unwrap(),
                Vector::from_slice(b),
            )
            .unwrap()
        };
        let first = dense(2, 3, &[0.5, -0.3, 0.8, 0.2, 0.6, -0.4], &[0.1, 0.3, 0.05]);
        let inner = Sequential::new()
            .with(first.clone())
            .with(ReLU::new())
            .with(dense(3, 2, &[0.7, -0.5, -0.6, 0.9, 0.4, 0.3], &[0.1, -0.2]));
        let x = Matrix::from_vec([3, 2], vec![0.3, -0.7, 0.9, 0.1, -0.4, 0.6]).unwrap();
        let y = Matrix::from_vec([3, 1], vec![0.2, -0.1, 0.5]).unwrap();

        // Finite differences are only valid away from the ReLU kink.
        let eps = 1e-3_f32;
        for z in [first.infer(&x).unwrap(), inner.infer(&x).unwrap()] {
            assert!(z.as_slice().iter().all(|v| v.abs() > 1e-2), "{z:?}");
        }

        let mut model = Sequential::new()
            .with(inner)
            .with(ReLU::new())
            .with(dense(2, 1, &[0.8, -0.6], &[0.05]));

        let mut loss = MseLoss::new();
        let pred = model.forward(&x).unwrap();
        loss.forward(&pred, &y).unwrap();
        let d_input = model.backward(&loss.backward().unwrap()).unwrap();

        // Recover analytic parameter gradients via a unit-lr update.
        let before = model.params();
        let mut stepped = model.clone();
        stepped.update(1.0);
        let analytic: Vec<f32> = before
            .iter()
            .zip(stepped.params())
            .map(|(b, a)| b - a)
            .collect();

        let mut perturbed = model.clone();
        for p in 0..before.len() {
            let mut plus = before.clone();
            plus[p] += eps;
            perturbed.set_params(&plus).unwrap();
            let loss_plus = mse(&perturbed.infer(&x).unwrap(), &y).unwrap();

            let mut minus = before.clone();
            minus[p] -= eps;
            perturbed.set_params(&minus).unwrap();
            let loss_minus = mse(&perturbed.infer(&x).unwrap(), &y).unwrap();

            let numeric = (loss_plus - loss_minus) / (2.0 * eps);
            assert_close(analytic[p], numeric, 1e-3, 1e-2);
        }

        for i in 0..x.len() {
            let mut plus = x.clone();
            plus.as_mut_slice()[i] += eps;
            let mut minus = x.clone();
            minus.as_mut_slice()[i] -= eps;
            let numeric = (mse(&model.infer(&plus).unwrap(), &y).unwrap()
                - mse(&model.infer(&minus).unwrap(), &y).unwrap())
                / (2.0 * eps);
            assert_close(d_input.as_slice()[i], numeric, 1e-3, 1e-2);
        }
    }
}
