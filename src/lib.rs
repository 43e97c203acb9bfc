//! Scroll Strike - side-scrolling action game simulation
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (physics, AI, weapons, collisions, game state)
//! - `config`: Level descriptors and weighted spawn tables
//! - `settings`: Presentation-facing tunables (particle caps, trails, shake)
//!
//! Rendering, audio and input wiring live outside this crate. A host calls
//! [`sim::tick`] once per animation frame and reads the resulting state.

pub mod config;
pub mod settings;
pub mod sim;

pub use config::{LevelCatalog, LevelDescriptor};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Viewport dimensions (pixels)
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;
    /// Top of the floor; entities stand with their bottom edge here
    pub const GROUND_Y: f32 = 500.0;

    /// Downward acceleration per frame
    pub const GRAVITY: f32 = 0.8;
    /// Initial vertical velocity of a jump (negative is up)
    pub const JUMP_VELOCITY: f32 = -15.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 30.0;
    pub const PLAYER_HEIGHT: f32 = 50.0;
    pub const PLAYER_SPEED: f32 = 5.0;
    pub const PLAYER_MAX_HEALTH: f32 = 100.0;
    pub const PLAYER_SPAWN_X: f32 = 100.0;
    /// Frames of invulnerability after (re)spawning
    pub const SPAWN_IMMUNITY_FRAMES: u32 = 120;
    /// Frames of invulnerability after taking a hit
    pub const HIT_IMMUNITY_FRAMES: u32 = 30;

    /// Bullet hitbox
    pub const BULLET_SIZE: f32 = 6.0;
    /// Bullets are culled once this far outside the viewport
    pub const BULLET_CULL_MARGIN: f32 = 100.0;
    pub const ENEMY_BULLET_SPEED: f32 = 8.0;

    /// Special abilities
    pub const DASH_COOLDOWN_MS: f64 = 3000.0;
    pub const DASH_DISTANCE: f32 = 200.0;
    pub const DASH_DAMAGE: f32 = 50.0;
    pub const DASH_VERTICAL_TOLERANCE: f32 = 60.0;
    pub const MULTI_SHOT_COOLDOWN_MS: f64 = 5000.0;
    pub const MULTI_SHOT_COUNT: usize = 5;
    pub const MULTI_SHOT_SPREAD: f32 = 0.5;
    pub const MULTI_SHOT_DAMAGE_MULT: f32 = 1.5;
    pub const RAGE_COOLDOWN_MS: f64 = 15000.0;
    pub const RAGE_DURATION_MS: f64 = 5000.0;
    pub const RAGE_DAMAGE_MULT: f32 = 2.0;

    /// Scoring
    pub const COMBO_WINDOW_MS: f64 = 3000.0;
    pub const MAX_COMBO_MULTIPLIER: u32 = 3;
    pub const OBJECTIVE_BONUS: u64 = 500;

    /// Enemy hit flash duration (frames)
    pub const HIT_FLASH_FRAMES: u32 = 6;

    /// Camera follow smoothing (fraction of the gap closed per frame)
    pub const CAMERA_LERP: f32 = 0.1;
    /// Geometric shake decay per frame
    pub const SHAKE_DECAY: f32 = 0.9;
    pub const SHAKE_CUTOFF: f32 = 0.1;
    pub const MAX_SHAKE: f32 = 30.0;

    /// Enemies further than this outside the viewport skip AI
    pub const AI_ACTIVE_MARGIN: f32 = 400.0;

    /// Distance from the level end at which the boss wakes up
    pub const BOSS_TRIGGER_DISTANCE: f32 = 800.0;
    /// Player must reach this close to the end to finish a non-boss level
    pub const LEVEL_END_ZONE: f32 = 100.0;
}

/// Clamp `value` into `[min, max]`. Collapses to `min` if the range is inverted.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max.max(min))
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Straight-line angle (radians) from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
