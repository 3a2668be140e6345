//! Population of individuals sharing one topology.

use ndarray_rand::rand::{Rng, thread_rng};

use super::individual::Individual;
use super::network::NeuralNetwork;

/// An individual together with its liveness in the running generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Network parameters and fitness.
    pub individual: Individual,
    alive: bool,
}

impl Member {
    fn new(individual: Individual) -> Self {
        Self {
            individual,
            alive: true,
        }
    }

    /// Whether the member is still playing in this generation.
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// Ordered collection of members evaluated in lockstep.
#[derive(Debug, Clone)]
pub struct Population {
    members: Vec<Member>,
}

impl Population {
    /// Creates `size` random members.
    pub fn new_random(network: &NeuralNetwork, size: usize) -> Self {
        Self::seeded(network, size, None)
    }

    /// Creates `size` members; the first one is `seed` when given, the rest are random.
    pub fn seeded(network: &NeuralNetwork, size: usize, seed: Option<Individual>) -> Self {
        Self::seeded_using(network, size, seed, &mut thread_rng())
    }

    /// Same as [`Population::seeded`] with a caller-supplied RNG.
    pub fn seeded_using<R: Rng + ?Sized>(
        network: &NeuralNetwork,
        size: usize,
        seed: Option<Individual>,
        rng: &mut R,
    ) -> Self {
        let mut members = Vec::with_capacity(size);

        if let Some(mut seed) = seed.filter(|_| size > 0) {
            seed.reset_fitness();
            members.push(Member::new(seed));
        }
        while members.len() < size {
            members.push(Member::new(network.random_individual_using(rng)));
        }

        Self { members }
    }

    /// Wraps already-built individuals, all alive.
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self {
            members: individuals.into_iter().map(Member::new).collect(),
        }
    }

    /// Number of members, alive or not.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the population has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members in order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Member at `index`.
    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    /// Individual at `index`.
    pub fn individual(&self, index: usize) -> Option<&Individual> {
        self.members.get(index).map(|m| &m.individual)
    }

    /// Number of members still alive.
    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| m.alive).count()
    }

    /// Indices of the members still alive, in order.
    pub fn alive_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.alive)
            .map(|(i, _)| i)
    }

    /// Whether the member at `index` is alive. Out of range counts as dead.
    pub fn is_alive(&self, index: usize) -> bool {
        self.members.get(index).is_some_and(Member::is_alive)
    }

    /// Marks a member dead. Returns `true` if it was alive.
    pub fn kill(&mut self, index: usize) -> bool {
        match self.members.get_mut(index) {
            Some(member) if member.alive => {
                member.alive = false;
                true
            }
            _ => false,
        }
    }

    /// Ends the generation for every member at once.
    pub fn kill_all(&mut self) {
        for member in &mut self.members {
            member.alive = false;
        }
    }

    /// Credits one passed obstacle to a live member.
    pub fn record_fitness_event(&mut self, index: usize) {
        if let Some(member) = self.members.get_mut(index) {
            if member.alive {
                member.individual.record_fitness_event();
            }
        }
    }

    /// Index of the member with the strictly greatest fitness, first one on ties.
    ///
    /// Dead members are included.
    pub fn elite_index(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (index, member) in self.members.iter().enumerate() {
            let fitness = member.individual.fitness;
            match best {
                Some((_, best_fitness)) if fitness <= best_fitness => {}
                _ => best = Some((index, fitness)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// The member [`Population::elite_index`] points at.
    pub fn fittest(&self) -> Option<&Individual> {
        self.elite_index().and_then(|i| self.individual(i))
    }

    /// Replaces every member except `elite` with a mutated clone of it.
    ///
    /// The elite keeps its parameters, its fitness is reset, and every member
    /// is revived.
    pub fn reseed_from<R: Rng + ?Sized>(
        &mut self,
        elite: usize,
        rate: f64,
        scale: f64,
        rng: &mut R,
    ) {
        let Some(parent) = self.individual(elite).cloned() else {
            return;
        };

        for (index, member) in self.members.iter_mut().enumerate() {
            if index == elite {
                member.individual.reset_fitness();
            } else {
                member.individual = parent.mutate_using(rate, scale, rng);
            }
            member.alive = true;
        }
    }
}
