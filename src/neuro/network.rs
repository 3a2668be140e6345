//! Fixed-topology feed-forward network.
//!
//! The network itself carries no weights: it describes the layer widths shared
//! by a whole population and evaluates any [`Individual`] whose matrices match
//! those widths.

use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use thiserror::Error;

use super::individual::Individual;

/// Invalid layer configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// The input layer has no neurons.
    #[error("input_size must be non-zero")]
    ZeroInput,
    /// A hidden layer has no neurons.
    #[error("hidden layer {index} has zero neurons")]
    ZeroHidden {
        /// Position of the offending layer in `hidden_sizes`.
        index: usize,
    },
    /// The output layer has no neurons.
    #[error("output_size must be non-zero")]
    ZeroOutput,
}

/// Rectified linear unit.
#[inline]
pub fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Layer widths of a feed-forward network plus the per-generation score history.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetwork {
    input_size: usize,
    hidden_sizes: Vec<usize>,
    output_size: usize,
    layer_sizes: Vec<usize>,
    /// Ticks survived per generation, the last entry is the running generation.
    score_history: Vec<u32>,
}

impl NeuralNetwork {
    /// Creates a network with the given layer widths.
    pub fn new(
        input_size: usize,
        hidden_sizes: Vec<usize>,
        output_size: usize,
    ) -> Result<Self, TopologyError> {
        if input_size == 0 {
            return Err(TopologyError::ZeroInput);
        }
        if let Some(index) = hidden_sizes.iter().position(|&size| size == 0) {
            return Err(TopologyError::ZeroHidden { index });
        }
        if output_size == 0 {
            return Err(TopologyError::ZeroOutput);
        }

        let mut layer_sizes = Vec::with_capacity(hidden_sizes.len() + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend_from_slice(&hidden_sizes);
        layer_sizes.push(output_size);

        Ok(Self {
            input_size,
            hidden_sizes,
            output_size,
            layer_sizes,
            score_history: vec![0],
        })
    }

    /// Number of inputs the network expects.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Widths of the hidden layers, in order.
    pub fn hidden_sizes(&self) -> &[usize] {
        &self.hidden_sizes
    }

    /// Number of outputs the network produces.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// `[input] + hidden + [output]`.
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Number of weight matrices (and bias vectors) an individual must carry.
    pub fn num_transitions(&self) -> usize {
        self.layer_sizes.len() - 1
    }

    /// Expected `(rows, cols)` of every weight matrix.
    pub fn weight_shapes(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.layer_sizes.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Runs a forward pass and returns every layer's activation.
    ///
    /// The first entry is the first hidden layer (or the output layer when
    /// there are no hidden layers); the last entry is always the output layer.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` or the individual's matrices do not match this
    /// topology. Use [`NeuralNetwork::accepts`] to check untrusted individuals.
    pub fn forward(&self, inputs: &Array1<f64>, individual: &Individual) -> Vec<Array1<f64>> {
        assert_eq!(inputs.len(), self.input_size, "input length mismatch");

        let mut outputs = Vec::with_capacity(self.num_transitions());
        let mut x = inputs.clone();

        for (weights, biases) in individual.weights.iter().zip(&individual.biases) {
            let mut y = x.dot(weights);
            y += biases;
            y.mapv_inplace(relu);
            outputs.push(y.clone());
            x = y;
        }

        outputs
    }

    /// Whether the individual's weights and biases fit this topology.
    pub fn accepts(&self, individual: &Individual) -> bool {
        individual.weights.len() == self.num_transitions()
            && individual.biases.len() == self.num_transitions()
            && self
                .weight_shapes()
                .zip(individual.weights.iter().zip(&individual.biases))
                .all(|((rows, cols), (w, b))| w.dim() == (rows, cols) && b.len() == cols)
    }

    /// Creates an individual with every weight and bias drawn from N(0, 1).
    pub fn random_individual(&self) -> Individual {
        let weights = self
            .weight_shapes()
            .map(|shape| Array2::random(shape, StandardNormal))
            .collect();
        let biases = self
            .weight_shapes()
            .map(|(_, cols)| Array1::random(cols, StandardNormal))
            .collect();

        Individual::new(weights, biases)
    }

    /// Same as [`NeuralNetwork::random_individual`] with a caller-supplied RNG.
    pub fn random_individual_using<R: Rng + ?Sized>(&self, rng: &mut R) -> Individual {
        let mut weights = Vec::with_capacity(self.num_transitions());
        let mut biases = Vec::with_capacity(self.num_transitions());

        for (rows, cols) in self.weight_shapes() {
            weights.push(Array2::random_using((rows, cols), StandardNormal, rng));
            biases.push(Array1::random_using(cols, StandardNormal, rng));
        }

        Individual::new(weights, biases)
    }

    /// Ticks survived per generation; never empty.
    pub fn score_history(&self) -> &[u32] {
        &self.score_history
    }

    /// Ticks survived so far by the running generation.
    pub fn current_score(&self) -> u32 {
        self.score_history.last().copied().unwrap_or(0)
    }

    /// Counts one more tick for the running generation.
    pub fn record_tick(&mut self) {
        if let Some(score) = self.score_history.last_mut() {
            *score += 1;
        }
    }

    /// Opens a fresh history entry for the next generation.
    pub fn start_generation(&mut self) {
        self.score_history.push(0);
    }
}
