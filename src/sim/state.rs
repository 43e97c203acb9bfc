//! Game state and core simulation types
//!
//! Everything the step function mutates lives in [`GameState`]. Entities are
//! plain records owned by exactly one collection and hold no references back
//! into the state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::AiState;
use super::collision::Rect;
use super::weapons::{WeaponCatalog, WeaponKind};
use crate::config::{LevelCatalog, LevelDescriptor};
use crate::consts::*;
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Step execution frozen; resumes from the exact prior state
    Paused,
    /// Level finished, waiting for the host to advance
    LevelComplete,
    /// Player health reached zero
    GameOver,
    /// Final level finished
    Victory,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GamePhase::LevelComplete | GamePhase::GameOver | GamePhase::Victory
        )
    }
}

/// Horizontal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Base firing angle (radians)
    pub fn angle(self) -> f32 {
        match self {
            Facing::Left => std::f32::consts::PI,
            Facing::Right => 0.0,
        }
    }

    pub fn from_dx(dx: f32, current: Facing) -> Facing {
        if dx > 0.0 {
            Facing::Right
        } else if dx < 0.0 {
            Facing::Left
        } else {
            current
        }
    }
}

/// The player character
#[derive(Debug, Clone)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub vy: f32,
    pub health: f32,
    pub max_health: f32,
    pub weapon: WeaponKind,
    pub ammo: u32,
    pub on_ground: bool,
    pub facing: Facing,
    /// Frames remaining during which the player cannot be hurt
    pub immunity_frames: u32,
    pub last_shot_ms: f64,
    pub last_dash_ms: f64,
    pub last_multi_shot_ms: f64,
    pub last_rage_ms: f64,
    /// Bullets fired before this timestamp deal bonus damage
    pub rage_until_ms: f64,
}

impl Player {
    pub fn new(weapons: &WeaponCatalog) -> Self {
        Self {
            pos: Vec2::new(PLAYER_SPAWN_X, GROUND_Y - PLAYER_HEIGHT),
            vy: 0.0,
            health: PLAYER_MAX_HEALTH,
            max_health: PLAYER_MAX_HEALTH,
            weapon: WeaponKind::Pistol,
            ammo: weapons.get(WeaponKind::Pistol).ammo,
            on_ground: true,
            facing: Facing::Right,
            immunity_frames: SPAWN_IMMUNITY_FRAMES,
            last_shot_ms: f64::NEG_INFINITY,
            last_dash_ms: f64::NEG_INFINITY,
            last_multi_shot_ms: f64::NEG_INFINITY,
            last_rage_ms: f64::NEG_INFINITY,
            rage_until_ms: f64::NEG_INFINITY,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    pub fn is_raging(&self, now_ms: f64) -> bool {
        now_ms < self.rage_until_ms
    }

    pub fn is_immune(&self) -> bool {
        self.immunity_frames > 0
    }

    /// Apply damage, clamping health at zero
    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health);
    }
}

/// Enemy archetype, used by spawn tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyType {
    Guard,
    Dog,
    Boss,
}

/// Static per-archetype tuning
#[derive(Debug, Clone, Copy)]
pub struct EnemyProfile {
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub detection_range: f32,
    pub attack_range: f32,
    pub contact_damage: f32,
    /// Shot (or lunge) cooldown in ms
    pub attack_cooldown_ms: f64,
    pub bullet_damage: f32,
    pub score: u64,
    pub drop_chance: f64,
    pub can_retreat: bool,
}

impl EnemyType {
    pub fn profile(self) -> EnemyProfile {
        match self {
            EnemyType::Guard => EnemyProfile {
                width: 30.0,
                height: 50.0,
                health: 30.0,
                patrol_speed: 1.0,
                chase_speed: 2.0,
                detection_range: 400.0,
                attack_range: 300.0,
                contact_damage: 10.0,
                attack_cooldown_ms: 1000.0,
                bullet_damage: 10.0,
                score: 100,
                drop_chance: 0.25,
                can_retreat: true,
            },
            EnemyType::Dog => EnemyProfile {
                width: 40.0,
                height: 25.0,
                health: 20.0,
                patrol_speed: 1.5,
                chase_speed: 4.0,
                detection_range: 350.0,
                attack_range: 60.0,
                contact_damage: 15.0,
                attack_cooldown_ms: 1200.0,
                bullet_damage: 0.0,
                score: 75,
                drop_chance: 0.2,
                can_retreat: true,
            },
            EnemyType::Boss => EnemyProfile {
                width: 80.0,
                height: 100.0,
                health: 1500.0,
                patrol_speed: 0.8,
                chase_speed: 1.5,
                detection_range: 700.0,
                attack_range: 500.0,
                contact_damage: 25.0,
                attack_cooldown_ms: 700.0,
                bullet_damage: 15.0,
                score: 1000,
                drop_chance: 1.0,
                can_retreat: false,
            },
        }
    }
}

/// Subtype-specific enemy data
#[derive(Debug, Clone, PartialEq)]
pub enum EnemyKind {
    Guard {
        /// x position of assigned cover, if any obstacle was close enough
        cover_x: Option<f32>,
    },
    Dog {
        /// Lunge in progress until this timestamp
        lunge_until_ms: f64,
    },
    Boss {
        name: String,
        /// Set once health falls below half
        enraged: bool,
    },
}

impl EnemyKind {
    pub fn enemy_type(&self) -> EnemyType {
        match self {
            EnemyKind::Guard { .. } => EnemyType::Guard,
            EnemyKind::Dog { .. } => EnemyType::Dog,
            EnemyKind::Boss { .. } => EnemyType::Boss,
        }
    }
}

/// A hostile entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub vy: f32,
    pub health: f32,
    pub max_health: f32,
    pub kind: EnemyKind,
    pub ai: AiState,
    /// 0-100, rises while the player is within detection range
    pub alert: f32,
    pub last_attack_ms: f64,
    pub patrol_anchor: f32,
    pub patrol_dir: f32,
    pub facing: Facing,
    pub on_ground: bool,
    /// Frames of white flash after taking damage
    pub hit_flash: u32,
}

impl Enemy {
    /// Spawn an enemy standing on the ground at `x`
    pub fn new(id: u32, kind: EnemyKind, x: f32) -> Self {
        let profile = kind.enemy_type().profile();
        Self {
            id,
            pos: Vec2::new(x, GROUND_Y - profile.height),
            vy: 0.0,
            health: profile.health,
            max_health: profile.health,
            kind,
            ai: AiState::Patrol,
            alert: 0.0,
            last_attack_ms: f64::NEG_INFINITY,
            patrol_anchor: x,
            patrol_dir: -1.0,
            facing: Facing::Left,
            on_ground: true,
            hit_flash: 0,
        }
    }

    pub fn enemy_type(&self) -> EnemyType {
        self.kind.enemy_type()
    }

    pub fn profile(&self) -> EnemyProfile {
        self.enemy_type().profile()
    }

    pub fn rect(&self) -> Rect {
        let p = self.profile();
        Rect::new(self.pos.x, self.pos.y, p.width, p.height)
    }

    pub fn center(&self) -> Vec2 {
        self.rect().center()
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    pub fn cover_x(&self) -> Option<f32> {
        match self.kind {
            EnemyKind::Guard { cover_x } => cover_x,
            _ => None,
        }
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.kind, EnemyKind::Boss { .. })
    }
}

/// A projectile, fired by either side
#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Recent positions (newest first) for rendering
    pub trail: Vec<Vec2>,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            pos,
            vel,
            damage,
            trail: Vec::new(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, Vec2::splat(BULLET_SIZE))
    }

    /// Push current position onto the trail, keeping at most `max_len` points
    pub fn record_trail(&mut self, max_len: usize) {
        if max_len == 0 {
            self.trail.clear();
            return;
        }
        self.trail.insert(0, self.pos);
        self.trail.truncate(max_len);
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Wall,
    Fence,
    Crate,
    Platform,
    Ground,
}

impl ObstacleKind {
    /// Platforms are one-way: bullets and jumping players pass through
    pub fn stops_bullets(self) -> bool {
        self != ObstacleKind::Platform
    }

    /// Good spot for a guard to hide behind
    pub fn provides_cover(self) -> bool {
        matches!(self, ObstacleKind::Wall | ObstacleKind::Crate)
    }
}

/// Level geometry
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u32,
    pub rect: Rect,
    pub kind: ObstacleKind,
    /// Destructible obstacles only
    pub health: Option<f32>,
}

/// Powerup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Health,
    Ammo,
    Weapon(WeaponKind),
}

pub const POWERUP_SIZE: f32 = 24.0;
/// Health restored by a health pickup
pub const POWERUP_HEAL: f32 = 30.0;

/// A collectible
#[derive(Debug, Clone)]
pub struct Powerup {
    pub id: u32,
    pub pos: Vec2,
    pub kind: PowerupKind,
}

impl Powerup {
    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, Vec2::splat(POWERUP_SIZE))
    }
}

/// Particle flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Explosion,
    Spark,
    Smoke,
    Blood,
}

/// A cosmetic particle (never affects gameplay)
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Frames remaining
    pub life: f32,
    pub max_life: f32,
    /// 0xRRGGBB
    pub color: u32,
    pub size: f32,
    pub kind: ParticleKind,
}

/// Active level metadata
#[derive(Debug, Clone)]
pub struct Level {
    pub index: usize,
    pub name: String,
    pub theme: String,
    pub length: f32,
    pub boss: Option<String>,
    pub boss_spawned: bool,
    pub boss_defeated: bool,
}

impl Level {
    pub fn from_descriptor(index: usize, desc: &LevelDescriptor) -> Self {
        Self {
            index,
            name: desc.name.clone(),
            theme: desc.theme.clone(),
            length: desc.length,
            boss: desc.boss.clone(),
            boss_spawned: false,
            boss_defeated: false,
        }
    }

    /// Largest valid camera offset
    pub fn max_camera_x(&self) -> f32 {
        (self.length - VIEWPORT_WIDTH).max(0.0)
    }
}

/// Camera state
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera {
    pub x: f32,
    /// Shake magnitude in pixels, decays geometrically
    pub shake: f32,
}

/// Objective kinds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Kill a number of enemies this level
    Eliminate { target: u32 },
    /// Pick up a number of powerups this level
    Collect { target: u32 },
    /// Reach a world x position
    Reach { x: f32 },
    /// Kill the level boss
    DefeatBoss,
}

/// A live objective
#[derive(Debug, Clone)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
    pub current: u32,
    pub completed: bool,
}

impl Objective {
    pub fn target(&self) -> u32 {
        match self.kind {
            ObjectiveKind::Eliminate { target } | ObjectiveKind::Collect { target } => target,
            ObjectiveKind::Reach { .. } | ObjectiveKind::DefeatBoss => 1,
        }
    }

    /// Record progress. Returns true only on the step that completes it.
    /// Progress never decreases and completion never reverts.
    pub fn record(&mut self, progress: u32) -> bool {
        if self.completed {
            return false;
        }
        self.current = self.current.max(progress.min(self.target()));
        if self.current >= self.target() {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Things that happened during a step, for the audio/render adapter
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Shot { weapon: WeaponKind, pellets: usize },
    EnemyShot { enemy_id: u32 },
    EnemyHit { enemy_id: u32 },
    EnemyKilled { enemy_id: u32, kind: EnemyType, points: u64 },
    PlayerHit { damage: f32 },
    PowerupCollected { kind: PowerupKind },
    ObstacleDestroyed { obstacle_id: u32 },
    Jump,
    Dash { hits: usize },
    MultiShot,
    RageStarted,
    WeaponSwitched { weapon: WeaponKind },
    BossSpawned { name: String },
    ObjectiveCompleted { id: String },
    LevelComplete { index: usize },
    GameOver,
    Victory,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub settings: Settings,
    pub levels: LevelCatalog,
    pub weapons: WeaponCatalog,
    pub rng: Pcg32,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub obstacles: Vec<Obstacle>,
    pub powerups: Vec<Powerup>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub level: Level,
    pub camera: Camera,
    pub objectives: Vec<Objective>,
    pub score: u64,
    /// Kills chained within the combo window
    pub combo: u32,
    pub last_kill_ms: Option<f64>,
    /// Kills this level
    pub kills: u32,
    /// Powerups picked up this level
    pub pickups_collected: u32,
    pub phase: GamePhase,
    /// Steps simulated since the last level entry
    pub frame: u64,
    /// Events emitted by the most recent step
    pub events: Vec<SimEvent>,
    next_id: u32,
}

impl GameState {
    /// New game on the built-in levels and weapons
    pub fn new(seed: u64) -> Self {
        Self::with_config(
            seed,
            Settings::default(),
            LevelCatalog::default(),
            WeaponCatalog::default(),
        )
    }

    /// New game on a level catalog. Panics if the catalog fails validation.
    pub fn with_config(
        seed: u64,
        settings: Settings,
        levels: LevelCatalog,
        weapons: WeaponCatalog,
    ) -> Self {
        if let Err(err) = levels.validate() {
            panic!("invalid level catalog: {err:#}");
        }
        let level = Level::from_descriptor(0, &levels.levels[0]);
        let player = Player::new(&weapons);
        let mut state = Self {
            settings,
            levels,
            weapons,
            rng: Pcg32::seed_from_u64(seed),
            player,
            enemies: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            obstacles: Vec::new(),
            powerups: Vec::new(),
            particles: Vec::new(),
            level,
            camera: Camera::default(),
            objectives: Vec::new(),
            score: 0,
            combo: 0,
            last_kill_ms: None,
            kills: 0,
            pickups_collected: 0,
            phase: GamePhase::Playing,
            frame: 0,
            events: Vec::new(),
            next_id: 1,
        };
        super::tick::start_level(&mut state, 0);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Mutable access to the ID counter for bulk generation
    pub(crate) fn id_counter(&mut self) -> &mut u32 {
        &mut self.next_id
    }

    /// Descriptor for the active level
    pub fn descriptor(&self) -> &LevelDescriptor {
        &self.levels.levels[self.level.index]
    }

    /// Add a shake pulse (no-op when shake is disabled)
    pub fn add_shake(&mut self, amount: f32) {
        if self.settings.effective_screen_shake() {
            self.camera.shake = (self.camera.shake + amount).min(MAX_SHAKE);
        }
    }

    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn is_last_level(&self) -> bool {
        self.levels.is_last(self.level.index)
    }
}
