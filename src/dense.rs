//! Affine layer: `y = x · W + b`.
//!
//! Shapes:
//! - weights `W`: `[in_features, out_features]`
//! - bias `b`: `[out_features]`
//! - input `x`: `[batch, in_features]`, output `[batch, out_features]`

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;

use crate::layer::{Init, Layer, Params};
use crate::tensor::{Matrix, Vector};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct Dense {
    in_features: usize,
    out_features: usize,
    weights: Matrix,
    bias: Vector,
    d_weights: Matrix,
    d_bias: Vector,
    last_input: Option<Matrix>,
}

impl Dense {
    /// Dense layer with He-uniform weights from a seeded RNG and zero bias.
    pub fn new_with_seed(in_features: usize, out_features: usize, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(in_features, out_features, Init::HeUniform, &mut rng)
    }

    pub fn new_with_rng<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        init: Init,
        rng: &mut R,
    ) -> Result<Self> {
        check_dims(in_features, out_features)?;

        let scale = init.scale(in_features);
        let n = in_features * out_features;
        let values: Vec<f32> = match init {
            Init::HeUniform => {
                let dist = Uniform::new_inclusive(-scale, scale);
                (0..n).map(|_| dist.sample(rng)).collect()
            }
            Init::HeNormal => {
                let dist = Normal::new(0.0, scale)
                    .map_err(|e| Error::InvalidConfig(format!("normal init: {e}")))?;
                (0..n).map(|_| dist.sample(rng)).collect()
            }
        };

        let weights = Matrix::from_vec([in_features, out_features], values)?;
        Self::from_parts(weights, Vector::zeros([out_features]))
    }

    /// Dense layer with explicit weights `[in, out]` and bias `[out]`.
    pub fn from_parts(weights: Matrix, bias: Vector) -> Result<Self> {
        let [in_features, out_features] = *weights.shape();
        check_dims(in_features, out_features)?;
        if bias.len() != out_features {
            return Err(Error::shape(format!(
                "bias has {} elements, expected {out_features}",
                bias.len()
            )));
        }

        Ok(Self {
            in_features,
            out_features,
            d_weights: Matrix::zeros([in_features, out_features]),
            d_bias: Vector::zeros([out_features]),
            weights,
            bias,
            last_input: None,
        })
    }

    #[inline]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    #[inline]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    #[inline]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> &Vector {
        &self.bias
    }

    /// Weight gradient from the most recent `backward`.
    #[inline]
    pub fn d_weights(&self) -> &Matrix {
        &self.d_weights
    }

    #[inline]
    pub fn d_bias(&self) -> &Vector {
        &self.d_bias
    }

    fn affine(&self, input: &Matrix) -> Result<Matrix> {
        if input.cols() != self.in_features {
            return Err(Error::shape(format!(
                "input has {} features, layer expects {}",
                input.cols(),
                self.in_features
            )));
        }

        let mut out = input.matmul(&self.weights)?;
        let b = self.bias.as_slice();
        for row in out.as_mut_slice().chunks_exact_mut(self.out_features) {
            for (v, bias) in row.iter_mut().zip(b) {
                *v += bias;
            }
        }
        Ok(out)
    }
}

fn check_dims(in_features: usize, out_features: usize) -> Result<()> {
    if in_features == 0 || out_features == 0 {
        return Err(Error::InvalidConfig(format!(
            "dense dims must be > 0, got in={in_features} out={out_features}"
        )));
    }
    Ok(())
}

impl Params for Dense {
    fn num_params(&self) -> usize {
        self.in_features * self.out_features + self.out_features
    }

    fn write_params(&self, out: &mut Vec<f32>) {
        out.extend_from_slice(self.weights.as_slice());
        out.extend_from_slice(self.bias.as_slice());
    }

    fn set_params(&mut self, params: &[f32]) -> Result<()> {
        let expected = self.num_params();
        if params.len() != expected {
            return Err(Error::Length {
                expected,
                got: params.len(),
            });
        }
        let (w, b) = params.split_at(self.weights.len());
        self.weights.as_mut_slice().copy_from_slice(w);
        self.bias.as_mut_slice().copy_from_slice(b);
        Ok(())
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let out = self.affine(input)?;
        self.last_input = Some(input.clone());
        Ok(out)
    }

    fn infer(&self, input: &Matrix) -> Result<Matrix> {
        self.affine(input)
    }

    fn backward(&mut self, grad: &Matrix) -> Result<Matrix> {
        let x = self
            .last_input
            .as_ref()
            .ok_or_else(|| Error::logic("dense backward called before forward"))?;
        if grad.shape() != &[x.rows(), self.out_features] {
            return Err(Error::shape(format!(
                "gradient shape {:?} does not match layer output [{}, {}]",
                grad.shape(),
                x.rows(),
                self.out_features
            )));
        }

        // dW = xᵀ · grad, db = Σ_batch grad, dx = grad · Wᵀ
        self.d_weights = x.transpose_matmul(grad)?;
        self.d_bias = grad.sum_rows();
        grad.matmul_transpose(&self.weights)
    }

    fn update(&mut self, lr: f32) {
        for (w, dw) in self
            .weights
            .as_mut_slice()
            .iter_mut()
            .zip(self.d_weights.as_slice())
        {
            *w -= lr * dw;
        }
        for (b, db) in self
            .bias
            .as_mut_slice()
            .iter_mut()
            .zip(self.d_bias.as_slice())
        {
            *b -= lr * db;
        }
    }

    fn clone_box(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn describe(&self) -> String {
        format!("Dense({} -> {})", self.in_features, self.out_features)
    }
}
