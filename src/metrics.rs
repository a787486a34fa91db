//! Evaluation metrics.
//!
//! Metrics only read predictions; they never participate in backprop.

use crate::tensor::Matrix;
use crate::{Error, Result};

/// Index of the largest entry in `row`; ties go to the lowest index. `None` if `row` is empty.
#[inline]
pub fn argmax(row: &[f32]) -> Option<usize> {
    let first = row.first()?;
    let mut best = (0, *first);
    for (i, &v) in row.iter().enumerate().skip(1) {
        if v > best.1 {
            best = (i, v);
        }
    }
    Some(best.0)
}

/// Percentage of rows whose predicted arg-max matches the target's arg-max.
///
/// `target` is normally one-hot. Returns a value in `[0, 100]`.
pub fn accuracy(pred: &Matrix, target: &Matrix) -> Result<f32> {
    if pred.shape() != target.shape() {
        return Err(Error::Shape(format!(
            "accuracy: pred shape {:?} does not match target shape {:?}",
            pred.shape(),
            target.shape()
        )));
    }
    let (rows, cols) = (pred.rows(), pred.cols());
    if rows == 0 || cols == 0 {
        return Err(Error::shape("accuracy: empty prediction"));
    }

    let correct = pred
        .as_slice()
        .chunks_exact(cols)
        .zip(target.as_slice().chunks_exact(cols))
        .filter(|(p, t)| argmax(p) == argmax(t))
        .count();
    Ok(correct as f32 / rows as f32 * 100.0)
}
