//! Procedural level population
//!
//! Each generator walks the level from a start offset in jittered steps and,
//! at every candidate slot, rolls against the level's density to decide
//! whether to place something there. Subtypes come from the level's
//! weighted tables.

use glam::Vec2;
use rand::Rng;

use super::collision::Rect;
use super::state::{
    Enemy, EnemyKind, EnemyType, Obstacle, ObstacleKind, POWERUP_SIZE, Powerup, PowerupKind,
};
use crate::config::{LevelDescriptor, WeightedEntry};
use crate::consts::{GROUND_Y, VIEWPORT_HEIGHT};

pub const OBSTACLE_START_X: f32 = 300.0;
pub const OBSTACLE_BASE_STEP: f32 = 150.0;
pub const OBSTACLE_JITTER: f32 = 150.0;

/// No enemy spawns before this x (player spawn safe zone)
pub const SAFE_ZONE_END: f32 = 600.0;
pub const ENEMY_BASE_STEP: f32 = 200.0;
pub const ENEMY_JITTER: f32 = 200.0;

pub const POWERUP_START_X: f32 = 500.0;
pub const POWERUP_BASE_STEP: f32 = 400.0;
pub const POWERUP_JITTER: f32 = 300.0;

pub const CRATE_HEALTH: f32 = 60.0;
/// Guards look for cover within this horizontal distance
pub const COVER_SEARCH_RADIUS: f32 = 300.0;
/// Boss spawns this far from the level end
pub const BOSS_SPAWN_OFFSET: f32 = 300.0;

/// Cumulative-weight sampling: draw `r` in `[0, total)` and subtract each
/// weight until the remainder drops to zero or below.
pub fn weighted_pick<T: Copy, R: Rng>(table: &[WeightedEntry<T>], rng: &mut R) -> Option<T> {
    let total: f32 = table.iter().map(|e| e.weight).sum();
    if table.is_empty() || total <= 0.0 {
        return None;
    }
    let mut remainder = rng.random_range(0.0..total);
    for entry in table {
        remainder -= entry.weight;
        if remainder <= 0.0 {
            return Some(entry.item);
        }
    }
    // Float rounding can leave a sliver past the last entry
    table.last().map(|e| e.item)
}

/// Candidate x positions from `start` up to `end` in jittered steps
fn slots<R: Rng>(rng: &mut R, start: f32, end: f32, base: f32, jitter: f32) -> Vec<f32> {
    let mut xs = Vec::new();
    let mut x = start;
    while x < end {
        xs.push(x);
        x += base + rng.random_range(0.0..jitter);
    }
    xs
}

fn next_id(counter: &mut u32) -> u32 {
    let id = *counter;
    *counter += 1;
    id
}

fn obstacle_rect<R: Rng>(kind: ObstacleKind, x: f32, rng: &mut R) -> Rect {
    match kind {
        ObstacleKind::Wall => Rect::new(x, GROUND_Y - 120.0, 30.0, 120.0),
        ObstacleKind::Fence => Rect::new(x, GROUND_Y - 40.0, 80.0, 40.0),
        ObstacleKind::Crate => Rect::new(x, GROUND_Y - 50.0, 50.0, 50.0),
        ObstacleKind::Platform => {
            let lift = 110.0 + rng.random_range(0.0..60.0);
            Rect::new(x, GROUND_Y - lift, 120.0, 15.0)
        }
        ObstacleKind::Ground => Rect::new(x, GROUND_Y, 200.0, VIEWPORT_HEIGHT - GROUND_Y),
    }
}

/// Level geometry: one ground strip plus scattered obstacles
pub fn generate_obstacles<R: Rng>(
    desc: &LevelDescriptor,
    rng: &mut R,
    ids: &mut u32,
) -> Vec<Obstacle> {
    let mut obstacles = vec![Obstacle {
        id: next_id(ids),
        rect: Rect::new(0.0, GROUND_Y, desc.length, VIEWPORT_HEIGHT - GROUND_Y),
        kind: ObstacleKind::Ground,
        health: None,
    }];

    for x in slots(rng, OBSTACLE_START_X, desc.length, OBSTACLE_BASE_STEP, OBSTACLE_JITTER) {
        if !rng.random_bool(desc.obstacle_density as f64) {
            continue;
        }
        let Some(kind) = weighted_pick(&desc.obstacle_weights, rng) else {
            continue;
        };
        let rect = obstacle_rect(kind, x, rng);
        if rect.right() > desc.length {
            continue;
        }
        let health = (kind == ObstacleKind::Crate).then_some(CRATE_HEALTH);
        obstacles.push(Obstacle {
            id: next_id(ids),
            rect,
            kind,
            health,
        });
    }
    obstacles
}

/// Regular enemies, never inside the spawn safe zone
pub fn generate_enemies<R: Rng>(desc: &LevelDescriptor, rng: &mut R, ids: &mut u32) -> Vec<Enemy> {
    let mut enemies = Vec::new();
    for x in slots(rng, SAFE_ZONE_END, desc.length, ENEMY_BASE_STEP, ENEMY_JITTER) {
        if !rng.random_bool(desc.enemy_density as f64) {
            continue;
        }
        let Some(enemy_type) = weighted_pick(&desc.enemy_weights, rng) else {
            continue;
        };
        let kind = match enemy_type {
            EnemyType::Guard => EnemyKind::Guard { cover_x: None },
            EnemyType::Dog => EnemyKind::Dog { lunge_until_ms: 0.0 },
            // Bosses are scripted, never rolled
            EnemyType::Boss => continue,
        };
        if x + enemy_type.profile().width > desc.length {
            continue;
        }
        let mut enemy = Enemy::new(next_id(ids), kind, x);
        if rng.random_bool(0.5) {
            enemy.patrol_dir = 1.0;
        }
        enemies.push(enemy);
    }
    enemies
}

/// Floating pickups
pub fn generate_powerups<R: Rng>(
    desc: &LevelDescriptor,
    rng: &mut R,
    ids: &mut u32,
) -> Vec<Powerup> {
    let mut powerups = Vec::new();
    for x in slots(rng, POWERUP_START_X, desc.length, POWERUP_BASE_STEP, POWERUP_JITTER) {
        if !rng.random_bool(desc.powerup_density as f64) {
            continue;
        }
        let Some(kind) = weighted_pick(&desc.powerup_weights, rng) else {
            continue;
        };
        if x + POWERUP_SIZE > desc.length {
            continue;
        }
        let hover = 30.0 + rng.random_range(0.0..20.0);
        powerups.push(Powerup {
            id: next_id(ids),
            pos: Vec2::new(x, GROUND_Y - POWERUP_SIZE - hover),
            kind,
        });
    }
    powerups
}

/// Point each guard at the nearest wall or crate, hiding on its far side
pub fn assign_cover(enemies: &mut [Enemy], obstacles: &[Obstacle]) {
    for enemy in enemies.iter_mut() {
        let cx = enemy.center().x;
        let EnemyKind::Guard { cover_x } = &mut enemy.kind else {
            continue;
        };
        *cover_x = obstacles
            .iter()
            .filter(|o| o.kind.provides_cover())
            .map(|o| (o, (o.rect.center().x - cx).abs()))
            .filter(|(_, d)| *d <= COVER_SEARCH_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o.rect.right() + 2.0);
    }
}

/// The level boss, placed near the end of the level
pub fn spawn_boss(name: &str, level_length: f32, id: u32) -> Enemy {
    let kind = EnemyKind::Boss {
        name: name.to_string(),
        enraged: false,
    };
    let width = EnemyType::Boss.profile().width;
    let x = (level_length - BOSS_SPAWN_OFFSET).min(level_length - width).max(0.0);
    Enemy::new(id, kind, x)
}

/// Roll for a drop from a killed enemy
pub fn roll_drop<R: Rng>(
    table: &[WeightedEntry<PowerupKind>],
    chance: f64,
    rng: &mut R,
) -> Option<PowerupKind> {
    if rng.random_bool(chance.clamp(0.0, 1.0)) {
        weighted_pick(table, rng)
    } else {
        None
    }
}
