//! Observation and decision contract between the game and the network.

use ndarray::Array1;

use super::entity::{Agent, Obstacle, SCREEN_HEIGHT};

/// Length of the feature vector fed to the network.
pub const FEATURE_COUNT: usize = 6;

/// Number of network outputs read by [`Action::decide`].
pub const ACTION_OUTPUTS: usize = 2;

/// What an agent sees of the obstacle in front of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Gap between the agent's right edge and the obstacle's left edge.
    pub distance: f64,
    /// Obstacle right edge measured from the agent's right edge.
    pub width: f64,
    /// Obstacle top edge measured from the bottom of the screen.
    pub height_from_top: f64,
    /// Obstacle bottom edge measured from the bottom of the screen.
    pub vertical_extent: f64,
    /// Scenario speed.
    pub speed: f64,
    /// Agent top edge measured from the bottom of the screen.
    pub agent_height: f64,
}

impl Features {
    /// Measures `obstacle` from `agent`'s point of view.
    pub fn observe(agent: &Agent, obstacle: &Obstacle, speed: f64) -> Self {
        Self {
            distance: obstacle.body.x - agent.body.right(),
            width: obstacle.body.right() - agent.body.right(),
            height_from_top: SCREEN_HEIGHT - obstacle.body.y,
            vertical_extent: SCREEN_HEIGHT - obstacle.body.bottom(),
            speed,
            agent_height: SCREEN_HEIGHT - agent.body.y,
        }
    }

    /// Network input in fixed order.
    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(vec![
            self.distance,
            self.width,
            self.height_from_top,
            self.vertical_extent,
            self.speed,
            self.agent_height,
        ])
    }
}

/// Movement chosen for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Duck under flying obstacles.
    Crouch,
    /// Leave the ground, or stay up longer when airborne.
    Jump,
    /// Keep running.
    Run,
}

impl Action {
    /// `a < b` crouches, `a > b` jumps, anything else runs.
    pub fn from_outputs(a: f64, b: f64) -> Self {
        if a < b {
            Action::Crouch
        } else if a > b {
            Action::Jump
        } else {
            Action::Run
        }
    }

    /// Reads the first two entries of the output layer.
    pub fn decide(outputs: &Array1<f64>) -> Self {
        match (outputs.get(0), outputs.get(1)) {
            (Some(&a), Some(&b)) => Action::from_outputs(a, b),
            _ => Action::Run,
        }
    }
}
