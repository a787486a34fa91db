//! Whole-model parameter transforms.
//!
//! Both transforms read the flattened parameter vector, modify it, and write it back, so
//! they work on any [`Params`] implementor without knowing its layer structure.

use crate::layer::Params;
use crate::{Error, Result};

/// Shrink every parameter toward zero: `p -= lambda * p`.
pub fn apply_l2_shrinkage<M: Params + ?Sized>(model: &mut M, lambda: f32) -> Result<()> {
    if !(lambda.is_finite() && (0.0..1.0).contains(&lambda)) {
        return Err(Error::InvalidConfig(format!(
            "l2 lambda must be finite and in [0, 1), got {lambda}"
        )));
    }
    if lambda == 0.0 {
        return Ok(());
    }

    let mut params = model.params();
    for p in &mut params {
        *p -= lambda * *p;
    }
    model.set_params(&params)
}

/// Magnitude pruning: zero every parameter whose magnitude is below the `ratio` percentile.
///
/// The threshold is the magnitude at index `floor(ratio * n)` of the ascending-sorted
/// magnitudes; parameters strictly below it are zeroed. Returns how many parameters were
/// set to zero by this call.
pub fn prune_by_magnitude<M: Params + ?Sized>(model: &mut M, ratio: f32) -> Result<usize> {
    if !(ratio.is_finite() && (0.0..1.0).contains(&ratio)) {
        return Err(Error::InvalidConfig(format!(
            "prune ratio must be finite and in [0, 1), got {ratio}"
        )));
    }

    let mut params = model.params();
    let Some(threshold) = magnitude_threshold(&params, ratio) else {
        return Ok(0);
    };

    let mut pruned = 0;
    for p in &mut params {
        if p.abs() < threshold && *p != 0.0 {
            *p = 0.0;
            pruned += 1;
        }
    }
    model.set_params(&params)?;
    Ok(pruned)
}

fn magnitude_threshold(params: &[f32], ratio: f32) -> Option<f32> {
    if params.is_empty() {
        return None;
    }
    let mut mags: Vec<f32> = params.iter().map(|p| p.abs()).collect();
    mags.sort_by(f32::total_cmp);
    let idx = ((ratio * mags.len() as f32) as usize).min(mags.len() - 1);
    Some(mags[idx])
}

/// Fraction of parameters that are exactly zero.
pub fn sparsity<M: Params + ?Sized>(model: &M) -> f32 {
    let params = model.params();
    if params.is_empty() {
        return 0.0;
    }
    params.iter().filter(|&&p| p == 0.0).count() as f32 / params.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::Dense;
    use crate::tensor::{Matrix, Vector};

    fn layer_with(params: &[f32]) -> Dense {
        // 2 x 2 weights + 2 biases
        let w = Matrix::from_vec([2, 2], params[..4].to_vec()).unwrap();
        let b = Vector::from_slice(&params[4..6]);
        Dense::from_parts(w, b).unwrap()
    }

    #[test]
    fn l2_shrinks_toward_zero() {
        let mut layer = layer_with(&[1.0, -2.0, 4.0, 0.0, 10.0, -10.0]);
        apply_l2_shrinkage(&mut layer, 0.5).unwrap();
        assert_eq!(layer.params(), vec![0.5, -1.0, 2.0, 0.0, 5.0, -5.0]);

        assert!(apply_l2_shrinkage(&mut layer, 1.0).is_err());
    }

    #[test]
    fn pruning_zeroes_smallest_magnitudes() {
        let mut layer = layer_with(&[0.1, -0.2, 0.3, -0.4, 0.5, -0.6]);
        // floor(0.5 * 6) = 3 → threshold |−0.4|; 0.1, 0.2, 0.3 go.
        let pruned = prune_by_magnitude(&mut layer, 0.5).unwrap();
        assert_eq!(pruned, 3);
        assert_eq!(layer.params(), vec![0.0, 0.0, 0.0, -0.4, 0.5, -0.6]);
        assert!((sparsity(&layer) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_ratio_prunes_nothing() {
        let mut layer = layer_with(&[0.1, -0.2, 0.3, -0.4, 0.5, -0.6]);
        let before = layer.params();
        assert_eq!(prune_by_magnitude(&mut layer, 0.0).unwrap(), 0);
        assert_eq!(layer.params(), before);
    }

    #[test]
    fn ratio_must_be_a_fraction() {
        let mut layer = layer_with(&[0.0; 6]);
        assert!(prune_by_magnitude(&mut layer, 1.0).is_err());
        assert!(prune_by_magnitude(&mut layer, f32::NAN).is_err());
    }
}
