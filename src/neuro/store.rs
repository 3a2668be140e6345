//! JSON store for the best individual seen across runs.
//!
//! The canonical file is flat:
//!
//! ```json
//! {"geracao": 12, "pesos": [[[...]]], "bias": [[...]], "fitness": 31}
//! ```
//!
//! Older saves nest the individual under `"individuo"`; those are still read
//! but never written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::individual::Individual;
use super::network::NeuralNetwork;

/// Failures reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read or written.
    #[error("store i/o: {0}")]
    Io(#[from] io::Error),
    /// The file is not a valid record.
    #[error("store json: {0}")]
    Json(#[from] serde_json::Error),
    /// Weight rows have different lengths.
    #[error("layer {layer} weight matrix is ragged")]
    RaggedMatrix {
        /// Offending layer transition.
        layer: usize,
    },
    /// Weights and biases disagree on the layer structure.
    #[error("layer {layer}: {reason}")]
    InconsistentLayer {
        /// Offending layer transition.
        layer: usize,
        /// What did not line up.
        reason: &'static str,
    },
    /// The record does not fit the running network.
    #[error("stored individual does not match the network topology")]
    TopologyMismatch,
}

/// Plain nested-array form of an individual, as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawIndividual {
    #[serde(rename = "pesos")]
    weights: Vec<Vec<Vec<f64>>>,
    #[serde(rename = "bias")]
    biases: Vec<Vec<f64>>,
    #[serde(default, deserialize_with = "fitness_from_number")]
    fitness: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct FlatRecord {
    #[serde(rename = "geracao")]
    generation: u32,
    #[serde(flatten)]
    individual: RawIndividual,
}

#[derive(Debug, Deserialize)]
struct NestedRecord {
    #[serde(rename = "individuo")]
    individual: RawIndividual,
    #[serde(rename = "geracao", default)]
    generation: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Flat(FlatRecord),
    Nested(NestedRecord),
}

/// The best individual on disk and the generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredBest {
    /// Generation counter at save time.
    pub generation: u32,
    /// The stored individual, fitness included.
    pub individual: Individual,
}

impl RawIndividual {
    fn from_individual(individual: &Individual) -> Self {
        Self {
            weights: individual
                .weights
                .iter()
                .map(|w| w.outer_iter().map(|row| row.to_vec()).collect())
                .collect(),
            biases: individual.biases.iter().map(|b| b.to_vec()).collect(),
            fitness: individual.fitness,
        }
    }

    fn into_individual(self) -> Result<Individual, StoreError> {
        if self.weights.len() != self.biases.len() {
            return Err(StoreError::InconsistentLayer {
                layer: self.weights.len().min(self.biases.len()),
                reason: "weight and bias layer counts differ",
            });
        }

        let mut weights = Vec::with_capacity(self.weights.len());
        let mut biases = Vec::with_capacity(self.biases.len());
        let mut previous_cols: Option<usize> = None;

        for (layer, (rows, bias)) in self.weights.into_iter().zip(self.biases).enumerate() {
            let matrix = to_matrix(rows, layer)?;
            if matrix.ncols() != bias.len() {
                return Err(StoreError::InconsistentLayer {
                    layer,
                    reason: "bias length differs from matrix columns",
                });
            }
            if previous_cols.is_some_and(|cols| cols != matrix.nrows()) {
                return Err(StoreError::InconsistentLayer {
                    layer,
                    reason: "matrix rows differ from previous layer width",
                });
            }
            previous_cols = Some(matrix.ncols());
            weights.push(matrix);
            biases.push(Array1::from_vec(bias));
        }

        let mut individual = Individual::new(weights, biases);
        individual.fitness = self.fitness;
        Ok(individual)
    }
}

fn to_matrix(rows: Vec<Vec<f64>>, layer: usize) -> Result<Array2<f64>, StoreError> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if nrows == 0 || ncols == 0 {
        return Err(StoreError::InconsistentLayer {
            layer,
            reason: "empty weight matrix",
        });
    }
    if rows.iter().any(|row| row.len() != ncols) {
        return Err(StoreError::RaggedMatrix { layer });
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((nrows, ncols), flat).map_err(|_| StoreError::RaggedMatrix { layer })
}

/// Older saves store fitness as a float; it is clamped into `u32`.
fn fitness_from_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    f64::deserialize(deserializer).map(fitness_from_f64)
}

fn fitness_from_f64(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Best-ever individual persisted to a single JSON file.
#[derive(Debug, Clone)]
pub struct BestStore {
    path: PathBuf,
}

impl BestStore {
    /// Creates a store backed by `path`. Nothing is read until [`BestStore::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored record, reporting why it could not be used.
    pub fn try_load(&self) -> Result<StoredBest, StoreError> {
        let json = fs::read_to_string(&self.path)?;
        let (raw, generation) = match serde_json::from_str::<RecordFile>(&json)? {
            RecordFile::Flat(record) => (record.individual, record.generation),
            RecordFile::Nested(record) => (record.individual, record.generation),
        };

        Ok(StoredBest {
            generation,
            individual: raw.into_individual()?,
        })
    }

    /// Reads the stored record. Missing or malformed files yield `None`.
    pub fn load(&self) -> Option<StoredBest> {
        match self.try_load() {
            Ok(best) => Some(best),
            Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored individual");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring stored individual");
                None
            }
        }
    }

    /// Loads the stored individual if it fits `network`.
    pub fn load_best(&self, network: &NeuralNetwork) -> Option<Individual> {
        let best = self.load()?;
        if network.accepts(&best.individual) {
            Some(best.individual)
        } else {
            warn!(
                path = %self.path.display(),
                error = %StoreError::TopologyMismatch,
                "ignoring stored individual"
            );
            None
        }
    }

    /// Writes `individual` if nothing is stored yet or it is strictly fitter.
    ///
    /// Returns whether the file was written.
    pub fn save_best(&self, individual: &Individual, generation: u32) -> Result<bool, StoreError> {
        if let Some(existing) = self.load() {
            if individual.fitness <= existing.individual.fitness {
                debug!(
                    fitness = individual.fitness,
                    stored = existing.individual.fitness,
                    "stored individual is at least as fit, keeping it"
                );
                return Ok(false);
            }
        }

        let record = FlatRecord {
            generation,
            individual: RawIndividual::from_individual(individual),
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&self.path, json)?;
        debug!(
            path = %self.path.display(),
            generation,
            fitness = individual.fitness,
            "saved best individual"
        );
        Ok(true)
    }
}
