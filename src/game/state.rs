//! Headless world stepped once per frame.
//!
//! [`SimulationState`] owns everything that is game rather than evolution:
//! scenario speed, obstacles and agent bodies. Each tick it asks the
//! controller's network for every live agent's action, reports passes and
//! collisions back to the population, then closes the tick on the controller.

use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::entity::{Agent, CACTUS_SIZES, Obstacle, ObstacleKind, PTERODACTYL_BOTTOMS, SCREEN_WIDTH};
use super::sensors::{Action, Features};
use crate::neuro::controller::{GenerationController, TickOutcome};
use crate::params::Params;

const ON_SCREEN_OBSTACLES: usize = 4;
const FIRST_CACTUS_VARIANT: usize = CACTUS_SIZES.len() - 1;

/// Game tunables taken from [`Params`].
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Scenario speed at the start of a generation.
    pub initial_speed: f64,
    /// Scenario speed cap.
    pub max_speed: f64,
    /// Ticks between speed increases.
    pub speed_up_interval: u32,
    /// Horizontal gap between consecutive obstacles.
    pub obstacle_gap: RangeInclusive<i32>,
    /// Chance that a recycled obstacle becomes a pterodactyl.
    pub pterodactyl_chance: f64,
    /// Ticks after which a generation is ended by force. `0` disables the cap.
    pub max_ticks_per_generation: u32,
}

impl From<&Params> for GameConfig {
    fn from(params: &Params) -> Self {
        Self {
            initial_speed: params.initial_speed,
            max_speed: params.max_speed,
            speed_up_interval: params.speed_up_interval,
            obstacle_gap: params.obstacle_gap.clone(),
            pterodactyl_chance: params.pterodactyl_chance,
            max_ticks_per_generation: params.max_ticks_per_generation,
        }
    }
}

/// World state for one generation.
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Pixels obstacles move per tick.
    pub speed: f64,
    /// Ticks elapsed in the current generation.
    pub ticks: u32,
    /// Obstacles ordered left to right.
    pub obstacles: Vec<Obstacle>,
    /// One agent per population member, same order.
    pub agents: Vec<Agent>,
    config: GameConfig,
    next_obstacle_id: u64,
    rng: StdRng,
}

impl SimulationState {
    /// Lays out a fresh world for `num_agents` agents.
    pub fn new(config: GameConfig, num_agents: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut state = Self {
            speed: config.initial_speed,
            ticks: 0,
            obstacles: Vec::with_capacity(ON_SCREEN_OBSTACLES),
            agents: vec![Agent::new(); num_agents],
            config,
            next_obstacle_id: 0,
            rng,
        };
        state.reset();
        state
    }

    /// Restores the start-of-generation layout: every agent on the ground,
    /// the widest cactus at the right edge, and cacti after it.
    pub fn reset(&mut self) {
        self.speed = self.config.initial_speed;
        self.ticks = 0;
        self.next_obstacle_id = 0;

        for agent in &mut self.agents {
            *agent = Agent::new();
        }

        self.obstacles.clear();
        let first = self.next_id();
        self.obstacles.push(Obstacle::new(
            first,
            ObstacleKind::Cactus {
                variant: FIRST_CACTUS_VARIANT,
            },
            SCREEN_WIDTH,
        ));
        while self.obstacles.len() < ON_SCREEN_OBSTACLES {
            let variant = self.rng.random_range(0..CACTUS_SIZES.len());
            self.push_obstacle(ObstacleKind::Cactus { variant });
        }
    }

    /// Game tunables.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// First obstacle whose right edge is still ahead of the agent's left edge.
    pub fn front_obstacle(&self, agent: &Agent) -> Option<&Obstacle> {
        front_of(&self.obstacles, agent)
    }

    /// Advances the world by one frame and closes the tick on `controller`.
    ///
    /// Resets the world when the controller starts a new generation.
    pub fn tick(&mut self, controller: &mut GenerationController) -> TickOutcome {
        let (network, population) = controller.split_mut();
        let alive: Vec<usize> = population.alive_indices().collect();

        for index in alive {
            let Some(agent) = self.agents.get_mut(index) else {
                continue;
            };
            let Some(front) = front_of(&self.obstacles, agent) else {
                continue;
            };

            let passed = agent.front_obstacle.is_some_and(|id| id != front.id);
            agent.front_obstacle = Some(front.id);

            let features = Features::observe(agent, front, self.speed);
            let Some(individual) = population.individual(index) else {
                continue;
            };
            let outputs = network.forward(&features.to_array(), individual);

            if passed {
                population.record_fitness_event(index);
            }

            agent.apply(outputs.last().map_or(Action::Run, Action::decide));

            if self.obstacles.iter().any(|o| agent.body.collides(&o.body)) {
                population.kill(index);
            }
        }

        for index in population.alive_indices() {
            if let Some(agent) = self.agents.get_mut(index) {
                agent.update();
            }
        }
        for obstacle in &mut self.obstacles {
            obstacle.update(self.speed);
        }

        self.ticks += 1;
        let interval = self.config.speed_up_interval;
        if interval > 0 && self.ticks % interval == 0 && self.speed < self.config.max_speed {
            self.speed = (self.speed + 1.0).min(self.config.max_speed);
        }

        if self.obstacles.first().is_some_and(Obstacle::is_offscreen) {
            self.recycle_obstacle();
        }

        let cap = self.config.max_ticks_per_generation;
        if cap > 0 && self.ticks >= cap && population.alive_count() > 0 {
            debug!(ticks = self.ticks, "tick cap reached, ending generation");
            population.kill_all();
        }

        let outcome = controller.end_tick();
        if matches!(outcome, TickOutcome::GenerationAdvanced(_)) {
            self.reset();
        }
        outcome
    }

    fn recycle_obstacle(&mut self) {
        if !self.obstacles.is_empty() {
            self.obstacles.remove(0);
        }

        let kind = if self.rng.random_bool(self.config.pterodactyl_chance) {
            ObstacleKind::Pterodactyl {
                lane: self.rng.random_range(0..PTERODACTYL_BOTTOMS.len()),
            }
        } else {
            ObstacleKind::Cactus {
                variant: self.rng.random_range(0..CACTUS_SIZES.len()),
            }
        };
        self.push_obstacle(kind);
    }

    fn push_obstacle(&mut self, kind: ObstacleKind) {
        let gap = f64::from(self.rng.random_range(self.config.obstacle_gap.clone()));
        let x = self
            .obstacles
            .last()
            .map_or(SCREEN_WIDTH, |last| last.body.x + gap);
        let id = self.next_id();
        self.obstacles.push(Obstacle::new(id, kind, x));
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_obstacle_id;
        self.next_obstacle_id += 1;
        id
    }
}

fn front_of<'a>(obstacles: &'a [Obstacle], agent: &Agent) -> Option<&'a Obstacle> {
    obstacles.iter().find(|o| o.body.right() > agent.body.x)
}
