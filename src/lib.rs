//! # Dino Evo - Neuroevolution for an Endless Runner
//!
//! Evolves feed-forward networks that play a dinosaur endless runner. A whole
//! population plays the same course in lockstep; when the last agent crashes,
//! the fittest network is kept unmutated and every other slot is refilled with
//! a mutated clone of it.
//!
//! ## Features
//!
//! - Fixed-topology MLP with ReLU activation
//! - Elitist generational genetic algorithm (mutation only)
//! - Best-ever individual persisted to JSON across runs
//! - Headless game driver with cacti, pterodactyls and rising speed
//!
//! ## Core Modules
//!
//! - [`neuro::network`] - Topology and forward pass
//! - [`neuro::individual`] - Weights, biases, fitness and mutation
//! - [`neuro::population`] - Members and liveness
//! - [`neuro::controller`] - Generation lifecycle
//! - [`neuro::store`] - Best-individual persistence
//! - [`game::state`] - Headless world driving the controller

/// Neuroevolution engine.
pub mod neuro {
    /// Generation lifecycle and elite selection.
    pub mod controller;
    /// Candidate solutions and the mutation operator.
    pub mod individual;
    /// Fixed-topology feed-forward network.
    pub mod network;
    /// Population of individuals with liveness.
    pub mod population;
    /// JSON store for the best individual.
    pub mod store;
}

/// Headless endless-runner driving the engine.
pub mod game {
    /// Agents, obstacles and collision boxes.
    pub mod entity;
    /// Feature vector and action decision.
    pub mod sensors;
    /// World state stepped once per frame.
    pub mod state;
}

/// Run parameters.
pub mod params;
