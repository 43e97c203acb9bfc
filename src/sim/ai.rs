//! Enemy behaviour
//!
//! Each enemy runs a small finite-state machine. Transitions are a pure
//! function of the enemy's state at the start of the step plus a handful of
//! measured inputs; movement and firing are applied afterwards using the
//! new state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{Bullet, Enemy, EnemyKind, Facing};
use super::weapons::spread_angles;
use crate::consts::{BULLET_SIZE, ENEMY_BULLET_SPEED};
use crate::{angle_to, clamp, distance};

/// Alert gained per step while the player is within detection range
pub const ALERT_GAIN: f32 = 4.0;
/// Alert lost per step otherwise
pub const ALERT_DECAY: f32 = 1.0;
pub const MAX_ALERT: f32 = 100.0;
/// Alert level above which a patrolling enemy gives chase
pub const ALERT_CHASE_THRESHOLD: f32 = 50.0;
/// Chase is abandoned beyond this multiple of detection range
pub const LOSE_TRACK_FACTOR: f32 = 1.5;
/// Health fraction below which enemies seek cover or retreat
pub const LOW_HEALTH_RATIO: f32 = 0.3;
/// Distance walked from the anchor before turning around
pub const PATROL_RANGE: f32 = 100.0;
/// Close enough to cover to stop moving
pub const COVER_TOLERANCE: f32 = 5.0;
/// Dog lunge duration and speed multiplier
pub const LUNGE_DURATION_MS: f64 = 400.0;
pub const LUNGE_SPEED_MULT: f32 = 2.0;
/// Boss volley shape
pub const BOSS_VOLLEY: usize = 3;
pub const BOSS_ENRAGED_VOLLEY: usize = 5;
pub const BOSS_VOLLEY_SPREAD: f32 = 0.3;
pub const BOSS_ENRAGED_COOLDOWN_MULT: f64 = 0.6;

/// AI states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Patrol,
    Chase,
    Attack,
    Cover,
    Retreat,
}

/// Everything a transition is allowed to look at
#[derive(Debug, Clone, Copy)]
pub struct AiInputs {
    pub distance: f32,
    pub alert: f32,
    pub health_ratio: f32,
    pub has_cover: bool,
    pub detection_range: f32,
    pub attack_range: f32,
    pub can_retreat: bool,
}

/// Transition table
pub fn next_state(current: AiState, i: &AiInputs) -> AiState {
    let wounded = i.health_ratio < LOW_HEALTH_RATIO;
    match current {
        AiState::Patrol => {
            if i.alert > ALERT_CHASE_THRESHOLD {
                AiState::Chase
            } else {
                AiState::Patrol
            }
        }
        AiState::Chase | AiState::Attack if wounded && i.has_cover => AiState::Cover,
        AiState::Chase | AiState::Attack if wounded && i.can_retreat => AiState::Retreat,
        AiState::Chase => {
            if i.distance < i.attack_range {
                AiState::Attack
            } else if i.distance > i.detection_range * LOSE_TRACK_FACTOR {
                AiState::Patrol
            } else {
                AiState::Chase
            }
        }
        AiState::Attack => {
            if i.distance > i.attack_range {
                AiState::Chase
            } else {
                AiState::Attack
            }
        }
        AiState::Cover => {
            if i.distance > i.detection_range * LOSE_TRACK_FACTOR {
                AiState::Patrol
            } else {
                AiState::Cover
            }
        }
        AiState::Retreat => {
            if i.distance > i.detection_range {
                AiState::Patrol
            } else {
                AiState::Retreat
            }
        }
    }
}

/// Raise alert while the player is in range, decay otherwise
pub fn update_alert(alert: f32, distance: f32, detection_range: f32) -> f32 {
    let next = if distance < detection_range {
        alert + ALERT_GAIN
    } else {
        alert - ALERT_DECAY
    };
    clamp(next, 0.0, MAX_ALERT)
}

/// World facts an enemy reacts to
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub player_center: Vec2,
    pub now_ms: f64,
    pub level_length: f32,
}

/// Update alert, enrage and the FSM state without moving or firing.
/// Returns the distance to the player.
pub fn update_awareness(enemy: &mut Enemy, ctx: &AiContext) -> f32 {
    let profile = enemy.profile();
    let dist = distance(enemy.center(), ctx.player_center);

    enemy.alert = update_alert(enemy.alert, dist, profile.detection_range);

    if let EnemyKind::Boss { enraged, .. } = &mut enemy.kind {
        if !*enraged && enemy.health < enemy.max_health * 0.5 {
            *enraged = true;
            log::debug!("Boss {} enraged", enemy.id);
        }
    }

    let inputs = AiInputs {
        distance: dist,
        alert: enemy.alert,
        health_ratio: enemy.health_ratio(),
        has_cover: enemy.cover_x().is_some(),
        detection_range: profile.detection_range,
        attack_range: profile.attack_range,
        can_retreat: profile.can_retreat,
    };
    let previous = enemy.ai;
    let next = next_state(previous, &inputs);
    if next != previous {
        log::trace!("Enemy {} {:?} -> {:?}", enemy.id, previous, next);
        if next == AiState::Patrol {
            // Lost track of the player: calm down and patrol from here
            enemy.alert = 0.0;
            enemy.patrol_anchor = enemy.pos.x;
        }
    }
    enemy.ai = next;
    dist
}

/// Run one AI step for `enemy`. Returns any bullets it fired.
pub fn update_enemy(enemy: &mut Enemy, ctx: &AiContext) -> Vec<Bullet> {
    let dist = update_awareness(enemy, ctx);
    let next = enemy.ai;
    let profile = enemy.profile();
    let center = enemy.center();

    let toward_player = (ctx.player_center.x - center.x).signum();
    let mut fired = Vec::new();
    let dx = match next {
        AiState::Patrol => {
            if (enemy.pos.x - enemy.patrol_anchor).abs() >= PATROL_RANGE {
                // Turn back toward the anchor
                enemy.patrol_dir = (enemy.patrol_anchor - enemy.pos.x).signum();
            }
            enemy.patrol_dir * profile.patrol_speed
        }
        AiState::Chase => toward_player * profile.chase_speed,
        AiState::Attack => {
            enemy.facing = Facing::from_dx(toward_player, enemy.facing);
            attack(enemy, ctx, &mut fired)
        }
        AiState::Cover => match enemy.cover_x() {
            Some(cover_x) if (cover_x - enemy.pos.x).abs() > COVER_TOLERANCE => {
                let step = (cover_x - enemy.pos.x).signum() * profile.chase_speed;
                // Do not overshoot the cover spot
                if step.abs() > (cover_x - enemy.pos.x).abs() {
                    cover_x - enemy.pos.x
                } else {
                    step
                }
            }
            _ => {
                // In cover: fire from behind it when the player is in range
                if dist < profile.attack_range {
                    enemy.facing = Facing::from_dx(toward_player, enemy.facing);
                    attack(enemy, ctx, &mut fired);
                }
                0.0
            }
        },
        AiState::Retreat => -toward_player * profile.chase_speed,
    };

    if dx != 0.0 {
        enemy.facing = Facing::from_dx(dx, enemy.facing);
    }
    let max_x = (ctx.level_length - profile.width).max(0.0);
    enemy.pos.x = clamp(enemy.pos.x + dx, 0.0, max_x);

    fired
}

/// Attack behaviour per kind. Returns horizontal movement for this step.
fn attack(enemy: &mut Enemy, ctx: &AiContext, fired: &mut Vec<Bullet>) -> f32 {
    let profile = enemy.profile();
    let center = enemy.center();
    let aim = angle_to(center, ctx.player_center);
    let toward_player = (ctx.player_center.x - center.x).signum();

    match &mut enemy.kind {
        EnemyKind::Dog { lunge_until_ms } => {
            if ctx.now_ms - enemy.last_attack_ms >= profile.attack_cooldown_ms {
                enemy.last_attack_ms = ctx.now_ms;
                *lunge_until_ms = ctx.now_ms + LUNGE_DURATION_MS;
            }
            if ctx.now_ms < *lunge_until_ms {
                toward_player * profile.chase_speed * LUNGE_SPEED_MULT
            } else {
                0.0
            }
        }
        EnemyKind::Guard { .. } => {
            if ctx.now_ms - enemy.last_attack_ms >= profile.attack_cooldown_ms {
                enemy.last_attack_ms = ctx.now_ms;
                fired.push(enemy_bullet(center, aim, profile.bullet_damage));
            }
            0.0
        }
        EnemyKind::Boss { enraged, .. } => {
            let (volley, cooldown) = if *enraged {
                (
                    BOSS_ENRAGED_VOLLEY,
                    profile.attack_cooldown_ms * BOSS_ENRAGED_COOLDOWN_MULT,
                )
            } else {
                (BOSS_VOLLEY, profile.attack_cooldown_ms)
            };
            if ctx.now_ms - enemy.last_attack_ms >= cooldown {
                enemy.last_attack_ms = ctx.now_ms;
                for offset in spread_angles(volley, BOSS_VOLLEY_SPREAD) {
                    fired.push(enemy_bullet(center, aim + offset, profile.bullet_damage));
                }
            }
            0.0
        }
    }
}

fn enemy_bullet(origin: Vec2, angle: f32, damage: f32) -> Bullet {
    let pos = origin - Vec2::splat(BULLET_SIZE / 2.0);
    Bullet::new(pos, Vec2::from_angle(angle) * ENEMY_BULLET_SPEED, damage)
}
