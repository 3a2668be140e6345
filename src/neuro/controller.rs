//! Generation lifecycle: evaluate, select the elite, persist it, reseed.

use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::individual::{DEFAULT_MUTATION_RATE, DEFAULT_PERTURBATION_SCALE, Individual};
use super::network::NeuralNetwork;
use super::population::Population;
use super::store::BestStore;

/// Tunables of the reseeding step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionConfig {
    /// Probability that each scalar of a clone is perturbed.
    pub mutation_rate: f64,
    /// Standard deviation of a perturbation.
    pub perturbation_scale: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: DEFAULT_MUTATION_RATE,
            perturbation_scale: DEFAULT_PERTURBATION_SCALE,
        }
    }
}

/// Invalid controller setup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// A generation needs at least one member to select from.
    #[error("population is empty")]
    EmptyPopulation,
    /// A member's parameters do not fit the network.
    #[error("member {index} does not match the network topology")]
    TopologyMismatch {
        /// Offending member.
        index: usize,
    },
}

/// Where the controller is in the generation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// At least one agent is alive.
    Running,
    /// Every agent is dead; the generation is being scored.
    Evaluating,
    /// The elite is being cloned into the next generation.
    Reseeding,
}

/// What happened at the end of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Generation that just ended.
    pub generation: u32,
    /// Index of the member kept unmutated.
    pub elite_index: usize,
    /// Fitness the elite earned before its reset.
    pub elite_fitness: u32,
    /// Ticks the generation lasted.
    pub ticks: u32,
    /// Whether the elite replaced the stored best.
    pub persisted: bool,
}

/// Result of [`GenerationController::end_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The generation goes on with this many agents alive.
    Running {
        /// Agents still alive.
        alive: usize,
    },
    /// The population died out and a new generation was seeded.
    GenerationAdvanced(GenerationSummary),
}

/// Drives a population through successive generations.
#[derive(Debug)]
pub struct GenerationController {
    network: NeuralNetwork,
    population: Population,
    config: EvolutionConfig,
    store: Option<BestStore>,
    generation: u32,
    phase: Phase,
    rng: StdRng,
}

impl GenerationController {
    /// Creates a controller for generation 0.
    pub fn new(
        network: NeuralNetwork,
        population: Population,
        config: EvolutionConfig,
    ) -> Result<Self, ControllerError> {
        if population.is_empty() {
            return Err(ControllerError::EmptyPopulation);
        }
        if let Some(index) = population
            .members()
            .iter()
            .position(|m| !network.accepts(&m.individual))
        {
            return Err(ControllerError::TopologyMismatch { index });
        }

        Ok(Self {
            network,
            population,
            config,
            store: None,
            generation: 0,
            phase: Phase::Running,
            rng: StdRng::from_entropy(),
        })
    }

    /// Persists every elite to `store`.
    pub fn with_store(mut self, store: BestStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Draws every mutation from `rng`.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Network shared by every member.
    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }

    /// Current population.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Current population, for the driver to report deaths and passes.
    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// Network and population borrowed together.
    pub fn split_mut(&mut self) -> (&NeuralNetwork, &mut Population) {
        (&self.network, &mut self.population)
    }

    /// Generation currently running.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reseeding tunables.
    pub fn config(&self) -> EvolutionConfig {
        self.config
    }

    /// Closes a tick; reseeds when no agent is left alive.
    pub fn end_tick(&mut self) -> TickOutcome {
        self.network.record_tick();

        let alive = self.population.alive_count();
        if alive > 0 {
            self.phase = Phase::Running;
            return TickOutcome::Running { alive };
        }

        self.phase = Phase::Evaluating;
        TickOutcome::GenerationAdvanced(self.advance_generation())
    }

    /// Selects the elite, persists it, and replaces everyone else with mutated clones.
    pub fn advance_generation(&mut self) -> GenerationSummary {
        self.phase = Phase::Reseeding;

        // `new` rejects empty populations and nothing removes members afterwards.
        let elite_index = self.population.elite_index().unwrap_or(0);
        let elite_fitness = self
            .population
            .individual(elite_index)
            .map_or(0, |i| i.fitness);

        let persisted = match self.population.individual(elite_index) {
            Some(elite) => self.persist(elite),
            None => false,
        };

        self.population.reseed_from(
            elite_index,
            self.config.mutation_rate,
            self.config.perturbation_scale,
            &mut self.rng,
        );

        let summary = GenerationSummary {
            generation: self.generation,
            elite_index,
            elite_fitness,
            ticks: self.network.current_score(),
            persisted,
        };
        info!(
            generation = summary.generation,
            elite = summary.elite_index,
            fitness = summary.elite_fitness,
            ticks = summary.ticks,
            persisted = summary.persisted,
            "generation finished"
        );

        self.generation += 1;
        self.network.start_generation();
        self.phase = Phase::Running;
        summary
    }

    /// The fittest member of the running generation, dead or alive.
    pub fn best_current(&self) -> Option<&Individual> {
        self.population.fittest()
    }

    /// Saves the fittest current member before shutdown. Returns whether it was written.
    pub fn persist_best(&self) -> bool {
        match self.best_current() {
            Some(best) => self.persist(best),
            None => false,
        }
    }

    fn persist(&self, individual: &Individual) -> bool {
        let Some(store) = &self.store else {
            return false;
        };

        match store.save_best(individual, self.generation) {
            Ok(written) => written,
            Err(e) => {
                warn!(path = %store.path().display(), error = %e, "could not persist individual");
                false
            }
        }
    }
}

/// Builds generation 0, seeding member 0 from `store` when it holds a compatible individual.
pub fn initial_population<R: Rng + ?Sized>(
    network: &NeuralNetwork,
    size: usize,
    store: &BestStore,
    rng: &mut R,
) -> Population {
    let seed = store.load_best(network);
    if seed.is_some() {
        debug!(path = %store.path().display(), "seeding population from stored individual");
    }
    Population::seeded_using(network, size, seed, rng)
}
