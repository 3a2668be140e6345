#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use dino_evo::neuro::controller::{
    ControllerError, EvolutionConfig, GenerationController, Phase, TickOutcome,
};
use dino_evo::neuro::individual::Individual;
use dino_evo::neuro::network::NeuralNetwork;
use dino_evo::neuro::population::Population;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;

fn create_test_network() -> NeuralNetwork {
    NeuralNetwork::new(6, vec![6], 2).unwrap()
}

fn population_with_fitness(network: &NeuralNetwork, fitness: &[u32]) -> Population {
    let individuals = fitness
        .iter()
        .map(|&f| {
            let mut individual = network.random_individual();
            individual.fitness = f;
            individual
        })
        .collect();
    Population::from_individuals(individuals)
}

fn same_shapes(a: &Individual, b: &Individual) -> bool {
    a.weights.len() == b.weights.len()
        && a.biases.len() == b.biases.len()
        && a.weights.iter().zip(&b.weights).all(|(x, y)| x.dim() == y.dim())
        && a.biases.iter().zip(&b.biases).all(|(x, y)| x.len() == y.len())
}

#[test]
fn test_mutation_preserves_shape() {
    let mut rng = StdRng::seed_from_u64(1);
    for (hidden, rate) in [(vec![6], 0.2), (vec![], 1.0), (vec![4, 3], 0.5), (vec![2], 0.0)] {
        let network = NeuralNetwork::new(6, hidden, 2).unwrap();
        let parent = network.random_individual_using(&mut rng);

        let child = parent.mutate_using(rate, 0.2, &mut rng);

        assert!(same_shapes(&parent, &child));
        assert!(network.accepts(&child));
    }
}

#[test]
fn test_mutation_rate_zero_is_identity() {
    let network = create_test_network();
    let mut parent = network.random_individual();
    parent.fitness = 9;

    let child = parent.mutate(0.0, 0.2);

    assert_eq!(child.weights, parent.weights);
    assert_eq!(child.biases, parent.biases);
    assert_eq!(child.fitness, 0);
}

#[test]
fn test_mutation_rate_one_changes_every_scalar() {
    let network = NeuralNetwork::new(6, vec![10, 10], 2).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let parent = network.random_individual_using(&mut rng);

    let child = parent.mutate_using(1.0, 0.2, &mut rng);

    for (p, c) in parent.weights.iter().zip(&child.weights) {
        assert!(p.iter().zip(c.iter()).all(|(a, b)| a != b));
    }
    for (p, c) in parent.biases.iter().zip(&child.biases) {
        assert!(p.iter().zip(c.iter()).all(|(a, b)| a != b));
    }
}

#[test]
fn test_mutation_perturbation_scale() {
    let network = NeuralNetwork::new(50, vec![50], 10).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let parent = network.random_individual_using(&mut rng);

    let child = parent.mutate_using(1.0, 0.2, &mut rng);

    let deltas: Vec<f64> = parent
        .weights
        .iter()
        .zip(&child.weights)
        .flat_map(|(p, c)| (c - p).iter().copied().collect::<Vec<_>>())
        .collect();
    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    let std = (deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();

    assert!(mean.abs() < 0.02, "mean {mean}");
    assert!((std - 0.2).abs() < 0.02, "std {std}");
}

#[test]
fn test_mutation_leaves_parent_untouched() {
    let network = create_test_network();
    let mut parent = network.random_individual();
    parent.fitness = 4;
    let snapshot = parent.clone();

    let mut child = parent.mutate(1.0, 0.2);
    child.weights[0][[0, 0]] = 1234.0;
    child.biases[0][0] = -1234.0;

    assert_eq!(parent, snapshot);
}

#[test]
fn test_fitness_events() {
    let network = create_test_network();
    let mut individual = network.random_individual();

    individual.record_fitness_event();
    individual.record_fitness_event();
    assert_eq!(individual.fitness, 2);

    individual.reset_fitness();
    assert_eq!(individual.fitness, 0);
}

#[test]
fn test_elite_tie_break_keeps_first() {
    let network = create_test_network();
    let population = population_with_fitness(&network, &[3, 5, 5, 1]);

    assert_eq!(population.elite_index(), Some(1));
}

#[test]
fn test_elite_includes_dead_members() {
    let network = create_test_network();
    let mut population = population_with_fitness(&network, &[1, 7, 2]);

    population.kill(1);

    assert_eq!(population.elite_index(), Some(1));
    assert_eq!(population.alive_count(), 2);
}

#[test]
fn test_elite_of_empty_population() {
    let population = Population::from_individuals(Vec::new());
    assert_eq!(population.elite_index(), None);
}

#[test]
fn test_liveness() {
    let network = create_test_network();
    let mut population = Population::new_random(&network, 4);

    assert_eq!(population.alive_count(), 4);
    assert!(population.kill(2));
    assert!(!population.kill(2));
    assert!(!population.kill(99));
    assert!(!population.is_alive(2));
    assert_eq!(population.alive_indices().collect::<Vec<_>>(), vec![0, 1, 3]);

    population.kill_all();
    assert_eq!(population.alive_count(), 0);
}

#[test]
fn test_dead_members_earn_no_fitness() {
    let network = create_test_network();
    let mut population = Population::new_random(&network, 2);

    population.record_fitness_event(0);
    population.kill(0);
    population.record_fitness_event(0);
    population.record_fitness_event(1);

    assert_eq!(population.individual(0).unwrap().fitness, 1);
    assert_eq!(population.individual(1).unwrap().fitness, 1);
}

#[test]
fn test_seeded_population() {
    let network = create_test_network();
    let mut seed = network.random_individual();
    seed.fitness = 12;

    let population = Population::seeded(&network, 5, Some(seed.clone()));

    assert_eq!(population.len(), 5);
    let first = population.individual(0).unwrap();
    assert_eq!(first.weights, seed.weights);
    assert_eq!(first.biases, seed.biases);
    assert_eq!(first.fitness, 0);
}

#[test]
fn test_controller_rejects_bad_populations() {
    let network = create_test_network();
    let empty = Population::from_individuals(Vec::new());
    assert_eq!(
        GenerationController::new(network.clone(), empty, EvolutionConfig::default())
            .unwrap_err(),
        ControllerError::EmptyPopulation
    );

    let other = NeuralNetwork::new(6, vec![3], 2).unwrap();
    let mismatched = Population::from_individuals(vec![
        network.random_individual(),
        other.random_individual(),
    ]);
    assert_eq!(
        GenerationController::new(network, mismatched, EvolutionConfig::default()).unwrap_err(),
        ControllerError::TopologyMismatch { index: 1 }
    );
}

#[test]
fn test_generation_boundary() {
    let network = create_test_network();
    let population = population_with_fitness(&network, &[0, 2, 4, 1, 3]);
    let elite_before = population.individual(2).unwrap().clone();

    let mut controller =
        GenerationController::new(network, population, EvolutionConfig::default()).unwrap();

    controller.population_mut().kill(0);
    controller.population_mut().kill(1);
    assert_eq!(controller.end_tick(), TickOutcome::Running { alive: 3 });

    controller.population_mut().kill_all();
    let summary = match controller.end_tick() {
        TickOutcome::GenerationAdvanced(summary) => summary,
        other => panic!("expected a new generation, got {other:?}"),
    };

    assert_eq!(summary.generation, 0);
    assert_eq!(summary.elite_index, 2);
    assert_eq!(summary.elite_fitness, 4);
    assert_eq!(summary.ticks, 2);
    assert!(!summary.persisted);

    assert_eq!(controller.generation(), 1);
    assert_eq!(controller.phase(), Phase::Running);

    let population = controller.population();
    assert_eq!(population.alive_count(), 5);
    assert!(population.members().iter().all(|m| m.individual.fitness == 0));

    let identical: Vec<usize> = population
        .members()
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            m.individual.weights == elite_before.weights
                && m.individual.biases == elite_before.biases
        })
        .map(|(i, _)| i)
        .collect();
    assert_eq!(identical, vec![2]);

    assert_eq!(controller.network().score_history(), &[2, 0]);
}

#[test]
fn test_clones_descend_from_elite() {
    let network = create_test_network();
    let population = population_with_fitness(&network, &[0, 6, 1]);
    let elite = population.individual(1).unwrap().clone();

    let config = EvolutionConfig {
        mutation_rate: 0.0,
        perturbation_scale: 0.2,
    };
    let mut controller = GenerationController::new(network, population, config).unwrap();
    controller.advance_generation();

    for member in controller.population().members() {
        assert_eq!(member.individual.weights, elite.weights);
        assert_eq!(member.individual.biases, elite.biases);
    }
}

#[test]
fn test_best_current() {
    let network = create_test_network();
    let population = population_with_fitness(&network, &[2, 0, 8]);
    let controller =
        GenerationController::new(network, population, EvolutionConfig::default()).unwrap();

    assert_eq!(controller.best_current().unwrap().fitness, 8);
    assert!(!controller.persist_best());
}

#[test]
fn test_seeded_reseeding_is_reproducible() {
    let network = create_test_network();
    let population = population_with_fitness(&network, &[1, 3, 2, 0]);

    let run = |seed: u64| {
        let mut controller = GenerationController::new(
            network.clone(),
            population.clone(),
            EvolutionConfig::default(),
        )
        .unwrap()
        .with_rng(StdRng::seed_from_u64(seed));
        controller.advance_generation();
        controller.advance_generation();
        controller.population().members().to_vec()
    };

    assert_eq!(run(5), run(5));
    assert_ne!(run(5), run(6));
}

#[test]
fn test_seeded_population_using_rng() {
    let network = create_test_network();

    let a = Population::seeded_using(&network, 3, None, &mut StdRng::seed_from_u64(8));
    let b = Population::seeded_using(&network, 3, None, &mut StdRng::seed_from_u64(8));

    assert_eq!(a.members(), b.members());
}
