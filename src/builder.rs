//! Network builder.
//!
//! `NetworkBuilder` tracks the running feature width so each dense layer is sized from
//! the previous one, and draws every layer's initial weights from a single RNG:
//!
//! ```rust
//! use rust_policy_nn::NetworkBuilder;
//!
//! # fn main() -> rust_policy_nn::Result<()> {
//! let net = NetworkBuilder::new(2)?
//!     .dense(8)?
//!     .relu()
//!     .dense(1)?
//!     .build_with_seed(0)?;
//! assert_eq!(net.num_layers(), 3);
//! # Ok(())
//! # }
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::activation::ReLU;
use crate::agent::NUM_ACTIONS;
use crate::dense::Dense;
use crate::env::STATE_DIM;
use crate::layer::{Init, Layer};
use crate::network::NeuralNetwork;
use crate::sequential::Sequential;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
enum LayerSpec {
    Dense { out_features: usize },
    ReLU,
}

#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    input_dim: usize,
    output_dim: usize,
    init: Init,
    layers: Vec<LayerSpec>,
}

impl NetworkBuilder {
    /// Start building a network that accepts `input_dim` features.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            output_dim: input_dim,
            init: Init::default(),
            layers: Vec::new(),
        })
    }

    /// Weight initializer for every dense layer added to this builder.
    pub fn init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    pub fn dense(mut self, out_features: usize) -> Result<Self> {
        if out_features == 0 {
            return Err(Error::InvalidConfig(
                "dense out_features must be > 0".to_owned(),
            ));
        }
        self.layers.push(LayerSpec::Dense { out_features });
        self.output_dim = out_features;
        Ok(self)
    }

    pub fn relu(mut self) -> Self {
        self.layers.push(LayerSpec::ReLU);
        self
    }

    /// Width of the output of the layers added so far.
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    pub fn build_with_seed(self, seed: u64) -> Result<NeuralNetwork> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<NeuralNetwork> {
        Ok(NeuralNetwork::from_layers(self.build_layers(rng)?))
    }

    /// Build the layers wrapped in a single [`Sequential`].
    pub fn build_sequential_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Sequential> {
        Ok(Sequential::from_layers(self.build_layers(rng)?))
    }

    fn build_layers<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Vec<Box<dyn Layer>>> {
        if !self
            .layers
            .iter()
            .any(|l| matches!(l, LayerSpec::Dense { .. }))
        {
            return Err(Error::InvalidConfig(
                "network must have at least one dense layer".to_owned(),
            ));
        }

        let mut layers: Vec<Box<dyn Layer>> = Vec::with_capacity(self.layers.len());
        let mut in_features = self.input_dim;
        for spec in self.layers {
            match spec {
                LayerSpec::Dense { out_features } => {
                    layers.push(Box::new(Dense::new_with_rng(
                        in_features,
                        out_features,
                        self.init,
                        rng,
                    )?));
                    in_features = out_features;
                }
                LayerSpec::ReLU => layers.push(Box::new(ReLU::new())),
            }
        }
        Ok(layers)
    }
}

/// The policy architecture: `3 -> hidden[0] -> ReLU -> ... -> hidden[n-1] -> ReLU -> 3`,
/// wrapped in one [`Sequential`] inside a [`NeuralNetwork`].
pub fn policy_network(hidden: &[usize], init: Init, seed: u64) -> Result<NeuralNetwork> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = NetworkBuilder::new(STATE_DIM)?.init(init);
    for &width in hidden {
        builder = builder.dense(width)?.relu();
    }
    let body = builder.dense(NUM_ACTIONS)?.build_sequential_with_rng(&mut rng)?;

    let mut net = NeuralNetwork::new();
    net.add_layer(body);
    Ok(net)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Params;
    use crate::tensor::Matrix;

    #[test]
    fn layers_are_chained_by_width() {
        let b = NetworkBuilder::new(3).unwrap().dense(5).unwrap().relu();
        assert_eq!(b.output_dim(), 5);
        let net = b.dense(2).unwrap().build_with_seed(0).unwrap();

        let names: Vec<String> = net.layers().iter().map(|l| l.describe()).collect();
        assert_eq!(names, vec!["Dense(3 -> 5)", "ReLU", "Dense(5 -> 2)"]);
        assert_eq!(net.num_params(), (3 * 5 + 5) + (5 * 2 + 2));
    }

    #[test]
    fn invalid_configs_are_rejected() {
        assert!(NetworkBuilder::new(0).is_err());
        assert!(NetworkBuilder::new(2).unwrap().dense(0).is_err());
        assert!(NetworkBuilder::new(2).unwrap().relu().build_with_seed(0).is_err());
    }

    #[test]
    fn same_seed_same_weights() {
        let a = policy_network(&[8, 4], Init::HeUniform, 7).unwrap();
        let b = policy_network(&[8, 4], Init::HeUniform, 7).unwrap();
        let c = policy_network(&[8, 4], Init::HeUniform, 8).unwrap();
        assert_eq!(a.params(), b.params());
        assert_ne!(a.params(), c.params());
    }

    #[test]
    fn policy_network_shape() {
        let net = policy_network(&[64, 32], Init::HeUniform, 0).unwrap();
        assert_eq!(net.num_layers(), 1);
        assert_eq!(
            net.layers()[0].describe(),
            "Sequential[Dense(3 -> 64), ReLU, Dense(64 -> 32), ReLU, Dense(32 -> 3)]"
        );
        assert_eq!(net.num_params(), (3 * 64 + 64) + (64 * 32 + 32) + (32 * 3 + 3));

        let out = net.predict(&Matrix::full([5, 3], 0.5)).unwrap();
        assert_eq!(out.shape(), &[5, 3]);
    }
}
