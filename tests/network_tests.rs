#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use approx::assert_abs_diff_eq;
use dino_evo::neuro::individual::Individual;
use dino_evo::neuro::network::{NeuralNetwork, TopologyError, relu};
use ndarray::{Array1, Array2, array};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;

fn assert_close(actual: &Array1<f64>, expected: &[f64]) {
    assert_eq!(actual.len(), expected.len());
    for (&a, &e) in actual.iter().zip(expected) {
        assert_abs_diff_eq!(a, e, epsilon = 1e-12);
    }
}

fn hand_built_individual() -> Individual {
    let hidden_weights = Array2::<f64>::eye(6);
    let hidden_biases = array![0.0, -1.0, 0.0, 0.0, 0.0, 0.0];

    let output_weights = array![
        [1.0, 1.0],
        [1.0, -1.0],
        [1.0, 1.0],
        [1.0, -1.0],
        [1.0, 1.0],
        [1.0, -1.0],
    ];
    let output_biases = array![0.5, -2.0];

    Individual::new(
        vec![hidden_weights, output_weights],
        vec![hidden_biases, output_biases],
    )
}

#[test]
fn test_layer_sizes() {
    let network = NeuralNetwork::new(6, vec![6, 4], 2).unwrap();

    assert_eq!(network.layer_sizes(), &[6, 6, 4, 2]);
    assert_eq!(network.num_transitions(), 3);
    assert_eq!(
        network.weight_shapes().collect::<Vec<_>>(),
        vec![(6, 6), (6, 4), (4, 2)]
    );
}

#[test]
fn test_zero_sized_layers_rejected() {
    assert_eq!(
        NeuralNetwork::new(0, vec![6], 2).unwrap_err(),
        TopologyError::ZeroInput
    );
    assert_eq!(
        NeuralNetwork::new(6, vec![3, 0], 2).unwrap_err(),
        TopologyError::ZeroHidden { index: 1 }
    );
    assert_eq!(
        NeuralNetwork::new(6, vec![6], 0).unwrap_err(),
        TopologyError::ZeroOutput
    );
}

#[test]
fn test_relu() {
    for x in [-1e9, -3.5, -f64::MIN_POSITIVE, 0.0, 1e-12, 2.25, 1e9] {
        let y = relu(x);
        assert!(y >= 0.0);
        if x >= 0.0 {
            assert_eq!(y, x);
        } else {
            assert_eq!(y, 0.0);
        }
    }
}

#[test]
fn test_forward_output_lengths() {
    let mut rng = StdRng::seed_from_u64(7);
    let topologies = [
        (6, vec![6], 2),
        (6, vec![], 2),
        (3, vec![8, 5, 4], 1),
        (1, vec![1], 1),
    ];

    for (input, hidden, output) in topologies {
        let network = NeuralNetwork::new(input, hidden.clone(), output).unwrap();
        let individual = network.random_individual_using(&mut rng);
        let inputs = Array1::from_elem(input, 0.5);

        let outputs = network.forward(&inputs, &individual);

        assert_eq!(outputs.len(), network.layer_sizes().len() - 1);
        assert_eq!(outputs.last().unwrap().len(), output);
        for (layer, &width) in outputs.iter().zip(&hidden) {
            assert_eq!(layer.len(), width);
        }
        assert!(outputs.iter().flatten().all(|&v| v >= 0.0));
    }
}

#[test]
fn test_forward_hand_computed() {
    let network = NeuralNetwork::new(6, vec![6], 2).unwrap();
    let individual = hand_built_individual();
    let inputs = array![1.0, 2.0, -3.0, 4.0, 0.5, 0.0];

    let outputs = network.forward(&inputs, &individual);

    assert_eq!(outputs.len(), 2);
    assert_close(&outputs[0], &[1.0, 1.0, 0.0, 4.0, 0.5, 0.0]);
    // 1 + 1 + 0 + 4 + 0.5 + 0 + 0.5 = 7, 1 - 1 + 0 - 4 + 0.5 - 0 - 2 = -5.5
    assert_close(&outputs[1], &[7.0, 0.0]);
}

#[test]
fn test_forward_without_hidden_layers() {
    let network = NeuralNetwork::new(2, vec![], 2).unwrap();
    let individual = Individual::new(
        vec![array![[1.0, -1.0], [2.0, 0.5]]],
        vec![array![0.0, 1.0]],
    );

    let outputs = network.forward(&array![1.0, 2.0], &individual);

    assert_eq!(outputs.len(), 1);
    assert_close(&outputs[0], &[5.0, 1.0]);
}

#[test]
fn test_forward_is_deterministic() {
    let network = NeuralNetwork::new(6, vec![6], 2).unwrap();
    let individual = network.random_individual();
    let inputs = array![120.0, 80.0, 43.0, 10.0, 5.0, 58.0];

    let first = network.forward(&inputs, &individual);
    let second = network.forward(&inputs, &individual);

    assert_eq!(first, second);
    assert_eq!(individual.fitness, 0);
}

#[test]
fn test_random_individual_matches_topology() {
    let network = NeuralNetwork::new(6, vec![6, 3], 2).unwrap();
    let individual = network.random_individual();

    assert!(network.accepts(&individual));
    assert_eq!(individual.weights.len(), 3);
    assert_eq!(individual.biases.len(), 3);
    assert_eq!(individual.fitness, 0);
    assert_eq!(individual.num_parameters(), 6 * 6 + 6 + 6 * 3 + 3 + 3 * 2 + 2);
}

#[test]
fn test_random_individual_is_standard_normal() {
    let network = NeuralNetwork::new(100, vec![100], 10).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let individual = network.random_individual_using(&mut rng);

    let values: Vec<f64> = individual.weights.iter().flatten().copied().collect();
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    assert!(mean.abs() < 0.05, "mean {mean}");
    assert!((variance - 1.0).abs() < 0.1, "variance {variance}");
}

#[test]
fn test_accepts_rejects_wrong_shapes() {
    let network = NeuralNetwork::new(6, vec![6], 2).unwrap();
    let other = NeuralNetwork::new(6, vec![5], 2).unwrap();

    assert!(network.accepts(&hand_built_individual()));
    assert!(!network.accepts(&other.random_individual()));

    let mut missing_bias = hand_built_individual();
    missing_bias.biases.pop();
    assert!(!network.accepts(&missing_bias));
}

#[test]
fn test_score_history() {
    let mut network = NeuralNetwork::new(6, vec![6], 2).unwrap();
    assert_eq!(network.score_history(), &[0]);

    network.record_tick();
    network.record_tick();
    network.start_generation();
    network.record_tick();

    assert_eq!(network.score_history(), &[2, 1]);
    assert_eq!(network.current_score(), 1);
}
