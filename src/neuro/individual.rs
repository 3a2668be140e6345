//! Candidate solutions and the mutation operator.

use ndarray::{Array, Array1, Array2, Dimension};
use ndarray_rand::rand::{Rng, thread_rng};
use ndarray_rand::rand_distr::StandardNormal;

/// Default probability that a single weight or bias is perturbed.
pub const DEFAULT_MUTATION_RATE: f64 = 0.2;

/// Default standard deviation of a perturbation.
pub const DEFAULT_PERTURBATION_SCALE: f64 = 0.2;

/// One set of network parameters plus the fitness earned during its current life.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    /// One `(size_k, size_k+1)` matrix per layer transition.
    pub weights: Vec<Array2<f64>>,
    /// One vector per non-input layer.
    pub biases: Vec<Array1<f64>>,
    /// Obstacles passed during the current life.
    pub fitness: u32,
}

impl Individual {
    /// Creates an individual with zero fitness.
    pub fn new(weights: Vec<Array2<f64>>, biases: Vec<Array1<f64>>) -> Self {
        Self {
            weights,
            biases,
            fitness: 0,
        }
    }

    /// Credits one passed obstacle.
    pub fn record_fitness_event(&mut self) {
        self.fitness = self.fitness.saturating_add(1);
    }

    /// Clears the fitness counter at a generation boundary.
    pub fn reset_fitness(&mut self) {
        self.fitness = 0;
    }

    /// Total number of weights and biases.
    pub fn num_parameters(&self) -> usize {
        self.weights.iter().map(Array2::len).sum::<usize>()
            + self.biases.iter().map(Array1::len).sum::<usize>()
    }

    /// Returns a mutated copy using the thread-local RNG.
    ///
    /// Every scalar is independently perturbed with probability `rate` by
    /// `N(0, 1) * scale`. The parent is left untouched and the child starts with
    /// zero fitness.
    pub fn mutate(&self, rate: f64, scale: f64) -> Individual {
        self.mutate_using(rate, scale, &mut thread_rng())
    }

    /// Same as [`Individual::mutate`] with a caller-supplied RNG.
    pub fn mutate_using<R: Rng + ?Sized>(&self, rate: f64, scale: f64, rng: &mut R) -> Individual {
        debug_assert!((0.0..=1.0).contains(&rate), "mutation rate out of range");

        let mut child = Individual::new(self.weights.clone(), self.biases.clone());

        for (weights, biases) in child.weights.iter_mut().zip(child.biases.iter_mut()) {
            perturb(weights, rate, scale, rng);
            perturb(biases, rate, scale, rng);
        }

        child
    }
}

fn perturb<D: Dimension, R: Rng + ?Sized>(
    values: &mut Array<f64, D>,
    rate: f64,
    scale: f64,
    rng: &mut R,
) {
    for value in values.iter_mut() {
        if rng.gen_bool(rate) {
            *value += rng.sample::<f64, _>(StandardNormal) * scale;
        }
    }
}
