use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::sensors::{ACTION_OUTPUTS, FEATURE_COUNT};
use crate::neuro::controller::EvolutionConfig;
use crate::neuro::individual::{DEFAULT_MUTATION_RATE, DEFAULT_PERTURBATION_SCALE};
use crate::neuro::network::{NeuralNetwork, TopologyError};

/// Invalid or unreadable parameters.
#[derive(Debug, Error)]
pub enum ParamsError {
    /// The parameter file could not be read.
    #[error("reading params: {0}")]
    Io(#[from] io::Error),
    /// The parameter file is not valid JSON for [`Params`].
    #[error("parsing params: {0}")]
    Json(#[from] serde_json::Error),
    /// The layer configuration is unusable.
    #[error(transparent)]
    Topology(#[from] TopologyError),
    /// A value is outside its allowed range.
    #[error("{field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

/// Run parameters for evolution and the headless game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Network input width. The game produces 6 features.
    pub input_size: usize,
    /// Hidden layer widths.
    pub hidden_sizes: Vec<usize>,
    /// Network output width. The game reads 2 outputs.
    pub output_size: usize,
    /// Agents per generation.
    pub population_size: usize,
    /// Probability that each scalar of a clone is perturbed.
    pub mutation_rate: f64,
    /// Standard deviation of a perturbation.
    pub perturbation_scale: f64,
    /// File holding the best individual across runs.
    pub save_path: PathBuf,
    /// Generations to run before exiting. `0` runs forever.
    pub max_generations: u32,
    /// Ticks after which a generation is ended by force. `0` disables the cap.
    pub max_ticks_per_generation: u32,
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
    /// Seed for the game RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            input_size: 6,
            hidden_sizes: vec![6],
            output_size: 2,
            population_size: 500,
            mutation_rate: DEFAULT_MUTATION_RATE,
            perturbation_scale: DEFAULT_PERTURBATION_SCALE,
            save_path: PathBuf::from("save.json"),
            max_generations: 100,
            max_ticks_per_generation: 20_000,
            initial_speed: 5.0,
            max_speed: 15.0,
            speed_up_interval: 250,
            obstacle_gap: 400..=600,
            pterodactyl_chance: 0.2,
            seed: None,
        }
    }
}

impl Params {
    /// Reads parameters from a JSON file; missing fields keep their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let json = fs::read_to_string(path)?;
        let params: Params = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    /// Saves parameters as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ParamsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Checks every value is usable.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.network()?;

        if self.input_size != FEATURE_COUNT {
            return Err(ParamsError::Invalid {
                field: "input_size",
                reason: "the game produces exactly 6 features",
            });
        }
        if self.output_size < ACTION_OUTPUTS {
            return Err(ParamsError::Invalid {
                field: "output_size",
                reason: "the game reads at least 2 outputs",
            });
        }

        if self.population_size == 0 {
            return Err(ParamsError::Invalid {
                field: "population_size",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ParamsError::Invalid {
                field: "mutation_rate",
                reason: "must be within [0, 1]",
            });
        }
        if !self.perturbation_scale.is_finite() || self.perturbation_scale < 0.0 {
            return Err(ParamsError::Invalid {
                field: "perturbation_scale",
                reason: "must be finite and non-negative",
            });
        }
        if !(0.0..=1.0).contains(&self.pterodactyl_chance) {
            return Err(ParamsError::Invalid {
                field: "pterodactyl_chance",
                reason: "must be within [0, 1]",
            });
        }
        if self.obstacle_gap.is_empty() || *self.obstacle_gap.start() <= 0 {
            return Err(ParamsError::Invalid {
                field: "obstacle_gap",
                reason: "must be a non-empty range of positive gaps",
            });
        }
        if self.initial_speed <= 0.0 || self.max_speed < self.initial_speed {
            return Err(ParamsError::Invalid {
                field: "initial_speed",
                reason: "must be positive and not above max_speed",
            });
        }
        if self.speed_up_interval == 0 {
            return Err(ParamsError::Invalid {
                field: "speed_up_interval",
                reason: "must be at least 1",
            });
        }

        Ok(())
    }

    /// Builds the network described by the topology fields.
    pub fn network(&self) -> Result<NeuralNetwork, TopologyError> {
        NeuralNetwork::new(self.input_size, self.hidden_sizes.clone(), self.output_size)
    }

    /// Reseeding tunables.
    pub fn evolution(&self) -> EvolutionConfig {
        EvolutionConfig {
            mutation_rate: self.mutation_rate,
            perturbation_scale: self.perturbation_scale,
        }
    }
}
