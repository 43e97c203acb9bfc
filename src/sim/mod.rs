//! Frame-driven simulation module
//!
//! All gameplay logic lives here. The host feeds one [`TickInput`] and a
//! timestamp per animation frame:
//! - Velocities are per frame, cooldowns compare millisecond timestamps
//! - Seeded RNG only, so a seed plus an input script replays exactly
//! - No rendering, audio or platform dependencies

pub mod actions;
pub mod ai;
pub mod collision;
pub mod factory;
pub mod particles;
pub mod physics;
pub mod state;
pub mod tick;
pub mod weapons;

pub use ai::AiState;
pub use collision::{Rect, collides};
pub use state::{
    Bullet, Camera, Enemy, EnemyKind, EnemyType, Facing, GamePhase, GameState, Level, Objective,
    ObjectiveKind, Obstacle, ObstacleKind, Particle, ParticleKind, Player, Powerup, PowerupKind,
    SimEvent,
};
pub use tick::{TickInput, advance_level, restart, start_level, tick};
pub use weapons::{WeaponCatalog, WeaponKind, WeaponStats};
