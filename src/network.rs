use crate::layer::{Layer, Params};
use crate::loss::MseLoss;
use crate::sequential::{chain_backward, chain_forward, chain_infer, count_params, scatter_params};
use crate::tensor::Matrix;
use crate::{Error, Result};

/// Top-level model: an ordered layer list plus an MSE criterion.
///
/// Training is full-batch gradient descent: each epoch runs
/// forward → loss → loss gradient → backward → update, in that order.
#[derive(Debug, Clone, Default)]
pub struct NeuralNetwork {
    layers: Vec<Box<dyn Layer>>,
    criterion: MseLoss,
}

impl NeuralNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layers(layers: Vec<Box<dyn Layer>>) -> Self {
        Self {
            layers,
            criterion: MseLoss::new(),
        }
    }

    pub fn add_layer(&mut self, layer: impl Layer + 'static) {
        self.layers.push(Box::new(layer));
    }

    pub fn add_boxed(&mut self, layer: Box<dyn Layer>) {
        self.layers.push(layer);
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Consume the network, keeping only its layers.
    pub fn into_layers(self) -> Vec<Box<dyn Layer>> {
        self.layers
    }

    fn ensure_layers(&self) -> Result<()> {
        if self.layers.is_empty() {
            return Err(Error::logic("neural network has no layers"));
        }
        Ok(())
    }

    pub fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        self.ensure_layers()?;
        chain_forward(&mut self.layers, input)
    }

    /// Forward pass without cache writes.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        self.ensure_layers()?;
        chain_infer(&self.layers, input)
    }

    /// Backpropagate `grad` (w.r.t. the network output) through all layers.
    ///
    /// Returns the gradient w.r.t. the network input.
    pub fn backward(&mut self, grad: &Matrix) -> Result<Matrix> {
        self.ensure_layers()?;
        chain_backward(&mut self.layers, grad)
    }

    /// Apply one gradient-descent step to every layer.
    pub fn update(&mut self, lr: f32) {
        for layer in &mut self.layers {
            layer.update(lr);
        }
    }

    /// One full-batch training step. Returns the loss before the update.
    pub fn train_step(&mut self, x: &Matrix, y: &Matrix, lr: f32) -> Result<f32> {
        self.step_with_prediction(x, y, lr).map(|(loss, _)| loss)
    }

    /// [`NeuralNetwork::train_step`] that also hands back the pre-update prediction.
    pub(crate) fn step_with_prediction(
        &mut self,
        x: &Matrix,
        y: &Matrix,
        lr: f32,
    ) -> Result<(f32, Matrix)> {
        let pred = self.forward(x)?;
        let loss = self.criterion.forward(&pred, y)?;
        let grad = self.criterion.backward()?;
        self.backward(&grad)?;
        self.update(lr);
        Ok((loss, pred))
    }

    /// Train for `epochs` full-batch steps; returns the final epoch's loss.
    pub fn train(&mut self, x: &Matrix, y: &Matrix, epochs: usize, lr: f32) -> Result<f32> {
        self.ensure_layers()?;
        let mut loss = 0.0;
        for epoch in 0..epochs {
            loss = self.train_step(x, y, lr)?;
            log::trace!("epoch {epoch}: loss={loss:.6}");
        }
        Ok(loss)
    }
}

impl Params for NeuralNetwork {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ReLU;
    use crate::dense::Dense;
    use crate::sequential::Sequential;

    fn xor() -> (Matrix, Matrix) {
        let x = Matrix::from_vec([4, 2], vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]).unwrap();
        let y = Matrix::from_vec([4, 1], vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        (x, y)
    }

    #[test]
    fn empty_network_is_a_logic_error() {
        let (x, y) = xor();
        let mut net = NeuralNetwork::new();
        assert!(matches!(net.forward(&x), Err(Error::Logic(_))));
        assert!(matches!(net.predict(&x), Err(Error::Logic(_))));
        assert!(matches!(net.backward(&y), Err(Error::Logic(_))));
        assert!(matches!(net.train(&x, &y, 1, 0.1), Err(Error::Logic(_))));
    }

    #[test]
    fn feature_mismatch_surfaces_as_shape_error() {
        let mut net = NeuralNetwork::new();
        net.add_layer(Dense::new_with_seed(2, 4, 0).unwrap());
        net.add_layer(ReLU::new());
        net.add_layer(Dense::new_with_seed(4, 1, 1).unwrap());
        assert!(matches!(
            net.forward(&Matrix::zeros([3, 3])),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn training_reduces_loss() {
        let (x, y) = xor();
        let mut net = NeuralNetwork::new();
        net.add_layer(Dense::new_with_seed(2, 8, 1).unwrap());
        net.add_layer(ReLU::new());
        net.add_layer(Dense::new_with_seed(8, 1, 2).unwrap());

        let first = net.train(&x, &y, 1, 0.05).unwrap();
        let last = net.train(&x, &y, 500, 0.05).unwrap();
        assert!(last < first, "first={first} last={last}");
    }

    #[test]
    fn params_round_trip_through_nested_layers() {
        let mut net = NeuralNetwork::new();
        net.add_layer(
            Sequential::new()
                .with(Dense::new_with_seed(3, 4, 0).unwrap())
                .with(ReLU::new()),
        );
        net.add_layer(Dense::new_with_seed(4, 3, 1).unwrap());

        let p = net.params();
        assert_eq!(p.len(), net.num_params());
        assert_eq!(net.num_params(), (3 * 4 + 4) + (4 * 3 + 3));

        let x = Matrix::full([2, 3], 0.5);
        let before = net.predict(&x).unwrap();
        net.set_params(&p).unwrap();
        assert_eq!(net.params(), p);
        assert_eq!(net.predict(&x).unwrap(), before);

        assert!(matches!(net.set_params(&[]), Err(Error::Length { .. })));
    }

    #[test]
    fn clones_are_independent() {
        let mut a = NeuralNetwork::new();
        a.add_layer(Dense::new_with_seed(2, 2, 0).unwrap());
        let b = a.clone();

        let zeros = vec![0.0; a.num_params()];
        a.set_params(&zeros).unwrap();
        assert_ne!(b.params(), zeros);
    }
}
