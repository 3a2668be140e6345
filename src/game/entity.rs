//! Agents and obstacles of the endless runner.
//!
//! Every entity is an axis-aligned box in screen coordinates (y grows
//! downwards). Per-kind behavior is chosen with a `match` on the kind.

use geo::{Rect, coord};

use super::sensors::Action;

/// Screen width in pixels.
pub const SCREEN_WIDTH: f64 = 1000.0;
/// Screen height in pixels.
pub const SCREEN_HEIGHT: f64 = 600.0;
/// Bottom edge of a standing agent.
pub const AGENT_GROUND: f64 = SCREEN_HEIGHT - 15.0;
/// Bottom edge of a cactus.
pub const CACTUS_GROUND: f64 = SCREEN_HEIGHT - 10.0;
/// Left edge of every agent.
pub const AGENT_X: f64 = 50.0;
/// Agent width.
pub const AGENT_WIDTH: f64 = 35.0;
/// Agent height while running or jumping.
pub const AGENT_HEIGHT: f64 = 43.0;
/// Agent height while crouching.
pub const AGENT_CROUCH_HEIGHT: f64 = 26.0;

const GRAVITY: f64 = 1.0;
const JUMP_IMPULSE: f64 = 10.0;
const AIR_LIFT: f64 = 0.5;

/// Cactus footprints, one per sprite variant.
pub const CACTUS_SIZES: [(f64, f64); 5] = [
    (15.0, 33.0),
    (32.0, 33.0),
    (49.0, 33.0),
    (22.0, 47.0),
    (73.0, 47.0),
];

/// Pterodactyl footprint.
pub const PTERODACTYL_SIZE: (f64, f64) = (42.0, 36.0);

/// Bottom edges a pterodactyl can fly at.
pub const PTERODACTYL_BOTTOMS: [f64; 3] = [AGENT_GROUND - 60.0, AGENT_GROUND - 30.0, AGENT_GROUND];

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Body {
    /// Box with the given bottom-left corner.
    pub fn on_ground(x: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y: bottom - height,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Moves the box so its bottom edge sits at `bottom`.
    pub fn set_bottom(&mut self, bottom: f64) {
        self.y = bottom - self.height;
    }

    /// Changes the height keeping the bottom edge in place.
    pub fn set_height(&mut self, height: f64) {
        let bottom = self.bottom();
        self.height = height;
        self.set_bottom(bottom);
    }

    /// Geometry used for collision tests.
    pub fn rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.x, y: self.y },
            coord! { x: self.right(), y: self.bottom() },
        )
    }

    /// Whether two boxes overlap with positive area. Touching edges do not count.
    pub fn collides(&self, other: &Body) -> bool {
        let (a, b) = (self.rect(), other.rect());
        a.min().x < b.max().x && b.min().x < a.max().x && a.min().y < b.max().y && b.min().y < a.max().y
    }
}

/// What an obstacle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObstacleKind {
    /// Ground obstacle; `variant` indexes [`CACTUS_SIZES`].
    Cactus {
        /// Sprite variant.
        variant: usize,
    },
    /// Flying obstacle; `lane` indexes [`PTERODACTYL_BOTTOMS`].
    Pterodactyl {
        /// Flight height.
        lane: usize,
    },
}

/// An obstacle scrolling towards the agents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Unique within a generation, increasing from left to right.
    pub id: u64,
    /// Cactus or pterodactyl.
    pub kind: ObstacleKind,
    /// Collision box.
    pub body: Body,
}

impl Obstacle {
    /// Places an obstacle with its left edge at `x`.
    pub fn new(id: u64, kind: ObstacleKind, x: f64) -> Self {
        let body = match kind {
            ObstacleKind::Cactus { variant } => {
                let (width, height) = CACTUS_SIZES[variant.min(CACTUS_SIZES.len() - 1)];
                Body::on_ground(x, CACTUS_GROUND, width, height)
            }
            ObstacleKind::Pterodactyl { lane } => {
                let (width, height) = PTERODACTYL_SIZE;
                let bottom = PTERODACTYL_BOTTOMS[lane.min(PTERODACTYL_BOTTOMS.len() - 1)];
                Body::on_ground(x, bottom, width, height)
            }
        };

        Self { id, kind, body }
    }

    /// Scrolls left until the obstacle leaves the screen.
    pub fn update(&mut self, speed: f64) {
        if self.body.right() > 0.0 {
            self.body.x -= speed;
        }
    }

    /// Whether the obstacle is fully off the left edge.
    pub fn is_offscreen(&self) -> bool {
        self.body.right() <= 0.0
    }
}

/// How an agent is currently moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    /// On the ground, full height.
    Running,
    /// On the ground, reduced height.
    Crouching,
    /// In the air.
    Airborne,
}

/// One player in the world, controlled by the individual at the same index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    /// Collision box.
    pub body: Body,
    /// Vertical speed, negative upwards.
    pub velocity_y: f64,
    /// Current pose.
    pub pose: Pose,
    /// Obstacle the agent was facing on its previous tick.
    pub front_obstacle: Option<u64>,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent {
    /// A running agent standing on the ground.
    pub fn new() -> Self {
        Self {
            body: Body::on_ground(AGENT_X, AGENT_GROUND, AGENT_WIDTH, AGENT_HEIGHT),
            velocity_y: 0.0,
            pose: Pose::Running,
            front_obstacle: None,
        }
    }

    /// Whether the agent's feet touch the ground.
    pub fn is_grounded(&self) -> bool {
        self.body.bottom() >= AGENT_GROUND
    }

    /// Carries out the network's decision.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Crouch => {
                if self.is_grounded() {
                    self.body.set_height(AGENT_CROUCH_HEIGHT);
                    self.body.set_bottom(AGENT_GROUND);
                    self.pose = Pose::Crouching;
                } else {
                    self.velocity_y += GRAVITY;
                }
            }
            Action::Jump => {
                self.body.set_height(AGENT_HEIGHT);
                if self.is_grounded() {
                    self.velocity_y = -JUMP_IMPULSE;
                    self.body.y -= JUMP_IMPULSE;
                    self.pose = Pose::Airborne;
                } else {
                    self.velocity_y -= AIR_LIFT;
                }
            }
            Action::Run => {
                if self.is_grounded() {
                    self.body.set_height(AGENT_HEIGHT);
                    self.body.set_bottom(AGENT_GROUND);
                    self.pose = Pose::Running;
                }
            }
        }
    }

    /// Applies gravity for one tick.
    pub fn update(&mut self) {
        if self.is_grounded() {
            self.velocity_y = 0.0;
            return;
        }

        self.velocity_y += GRAVITY;
        if self.body.bottom() + self.velocity_y > AGENT_GROUND {
            self.body.set_bottom(AGENT_GROUND);
            self.pose = Pose::Running;
        } else {
            self.body.y += self.velocity_y;
        }
    }
}
