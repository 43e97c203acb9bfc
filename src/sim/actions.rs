//! Player actions: movement abilities, shooting and weapon handling
//!
//! Every cooldown is a `last_*_ms` timestamp on the player, compared against
//! the step's timestamp. None of the special abilities consume ammo.

use glam::Vec2;

use super::collision::between;
use super::particles::spawn_burst;
use super::state::{Bullet, Facing, GameState, ParticleKind, Player, SimEvent};
use super::weapons::{can_fire, spread_angles};
use crate::clamp;
use crate::consts::*;

/// Jump if standing on something. Returns true if the jump happened.
pub fn jump(state: &mut GameState) -> bool {
    let player = &mut state.player;
    if !player.on_ground {
        return false;
    }
    player.vy = JUMP_VELOCITY;
    player.on_ground = false;
    state.emit(SimEvent::Jump);
    true
}

/// Muzzle position for the player's current facing
fn muzzle(player: &Player) -> Vec2 {
    let x = match player.facing {
        Facing::Right => player.pos.x + PLAYER_WIDTH,
        Facing::Left => player.pos.x - BULLET_SIZE,
    };
    Vec2::new(x, player.pos.y + PLAYER_HEIGHT * 0.4)
}

/// Bullets fanned around the facing direction
fn fan(player: &Player, offsets: &[f32], speed: f32, damage: f32) -> Vec<Bullet> {
    let origin = muzzle(player);
    let base = player.facing.angle();
    offsets
        .iter()
        .map(|off| Bullet::new(origin, Vec2::from_angle(base + off) * speed, damage))
        .collect()
}

fn rage_multiplier(player: &Player, now_ms: f64) -> f32 {
    if player.is_raging(now_ms) {
        RAGE_DAMAGE_MULT
    } else {
        1.0
    }
}

/// Fire the current weapon. Returns the number of bullets spawned (0 if
/// out of ammo or still cooling down).
pub fn shoot(state: &mut GameState, now_ms: f64) -> usize {
    let stats = *state.weapons.get(state.player.weapon);
    let player = &mut state.player;
    if player.ammo == 0 || !can_fire(&stats, player.last_shot_ms, now_ms) {
        return 0;
    }
    player.ammo -= 1;
    player.last_shot_ms = now_ms;

    let damage = stats.damage * rage_multiplier(player, now_ms);
    let offsets = spread_angles(stats.bullet_count, stats.spread);
    let bullets = fan(player, &offsets, stats.bullet_speed, damage);
    let pellets = bullets.len();
    let weapon = player.weapon;
    state.bullets.extend(bullets);
    state.emit(SimEvent::Shot { weapon, pellets });
    pellets
}

/// Cycle to the next (or previous) weapon, refilling its ammo
pub fn switch_weapon(state: &mut GameState, forward: bool) {
    let player = &mut state.player;
    player.weapon = if forward {
        player.weapon.next()
    } else {
        player.weapon.prev()
    };
    player.ammo = state.weapons.get(player.weapon).ammo;
    let weapon = player.weapon;
    log::debug!("Switched to {weapon:?}");
    state.emit(SimEvent::WeaponSwitched { weapon });
}

/// Dash forward, damaging every enemy passed through.
/// Returns false while on cooldown.
pub fn dash_attack(state: &mut GameState, now_ms: f64) -> bool {
    if now_ms - state.player.last_dash_ms < DASH_COOLDOWN_MS {
        return false;
    }
    state.player.last_dash_ms = now_ms;

    let old_center = state.player.center();
    let max_x = (state.level.length - PLAYER_WIDTH).max(0.0);
    let new_x = clamp(
        state.player.pos.x + state.player.facing.sign() * DASH_DISTANCE,
        0.0,
        max_x,
    );
    state.player.pos.x = new_x;
    let new_center = state.player.center();

    let mut hit_positions = Vec::new();
    for enemy in state.enemies.iter_mut() {
        let c = enemy.center();
        if between(c.x, old_center.x, new_center.x)
            && (c.y - old_center.y).abs() <= DASH_VERTICAL_TOLERANCE
        {
            enemy.health -= DASH_DAMAGE;
            enemy.hit_flash = HIT_FLASH_FRAMES;
            hit_positions.push((enemy.id, c));
        }
    }

    let cap = state.settings.max_particles();
    for &(enemy_id, pos) in &hit_positions {
        spawn_burst(&mut state.particles, &mut state.rng, pos, ParticleKind::Blood, 10, cap);
        state.emit(SimEvent::EnemyHit { enemy_id });
    }
    state.add_shake(8.0);
    log::debug!("Dash hit {} enemies", hit_positions.len());
    state.emit(SimEvent::Dash {
        hits: hit_positions.len(),
    });
    true
}

/// Fire a fixed fan of bonus-damage bullets, ignoring ammo and fire rate.
/// Returns false while on cooldown.
pub fn multi_shot(state: &mut GameState, now_ms: f64) -> bool {
    if now_ms - state.player.last_multi_shot_ms < MULTI_SHOT_COOLDOWN_MS {
        return false;
    }
    state.player.last_multi_shot_ms = now_ms;

    let stats = *state.weapons.get(state.player.weapon);
    let damage =
        stats.damage * MULTI_SHOT_DAMAGE_MULT * rage_multiplier(&state.player, now_ms);
    let offsets = spread_angles(MULTI_SHOT_COUNT, MULTI_SHOT_SPREAD);
    let bullets = fan(&state.player, &offsets, stats.bullet_speed, damage);
    state.bullets.extend(bullets);
    state.emit(SimEvent::MultiShot);
    true
}

/// Start the timed damage buff. Returns false while on cooldown.
pub fn activate_rage(state: &mut GameState, now_ms: f64) -> bool {
    let player = &mut state.player;
    if now_ms - player.last_rage_ms < RAGE_COOLDOWN_MS {
        return false;
    }
    player.last_rage_ms = now_ms;
    player.rage_until_ms = now_ms + RAGE_DURATION_MS;
    log::debug!("Rage active until {}", player.rage_until_ms);
    state.emit(SimEvent::RageStarted);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Enemy, EnemyKind};
    use crate::sim::weapons::WeaponKind;

    fn bare_state() -> GameState {
        let mut state = GameState::new(42);
        state.enemies.clear();
        state.powerups.clear();
        state.bullets.clear();
        state
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut state = bare_state();
        assert!(jump(&mut state));
        assert_eq!(state.player.vy, JUMP_VELOCITY);
        assert!(!state.player.on_ground);
        // No double jump
        assert!(!jump(&mut state));
        assert_eq!(state.player.vy, JUMP_VELOCITY);
    }

    #[test]
    fn test_fire_rate_gates_second_shot() {
        let mut state = bare_state();
        let rate = state.weapons.pistol.fire_rate_ms;
        assert_eq!(shoot(&mut state, 1000.0), 1);
        assert_eq!(shoot(&mut state, 1000.0 + rate - 1.0), 0);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.player.ammo, 59);
        assert_eq!(shoot(&mut state, 1000.0 + rate), 1);
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn test_no_ammo_no_bullets() {
        let mut state = bare_state();
        state.player.ammo = 0;
        assert_eq!(shoot(&mut state, 5000.0), 0);
        assert!(state.bullets.is_empty());
        assert_eq!(state.player.ammo, 0);
    }

    #[test]
    fn test_shotgun_fan() {
        let mut state = bare_state();
        state.player.weapon = WeaponKind::Shotgun;
        state.player.ammo = 24;
        assert_eq!(shoot(&mut state, 0.0), 7);
        assert_eq!(state.player.ammo, 23);

        let angles: Vec<f32> = state.bullets.iter().map(|b| b.vel.y.atan2(b.vel.x)).collect();
        let step = 0.25 / 6.0;
        for (i, angle) in angles.iter().enumerate() {
            let expected = -0.125 + step * i as f32;
            assert!((angle - expected).abs() < 1e-5, "pellet {i}: {angle} vs {expected}");
        }
        for b in &state.bullets {
            assert!((b.vel.length() - 12.0).abs() < 1e-4);
            assert!(b.vel.x > 0.0);
        }
    }

    #[test]
    fn test_shooting_left_mirrors() {
        let mut state = bare_state();
        state.player.facing = Facing::Left;
        shoot(&mut state, 0.0);
        let bullet = &state.bullets[0];
        assert!(bullet.vel.x < 0.0);
        assert!(bullet.vel.y.abs() < 1e-4);
        assert!(bullet.pos.x < state.player.pos.x);
    }

    #[test]
    fn test_switch_weapon_cycles_and_refills() {
        let mut state = bare_state();
        state.player.ammo = 3;
        switch_weapon(&mut state, true);
        assert_eq!(state.player.weapon, WeaponKind::Rifle);
        assert_eq!(state.player.ammo, 150);
        switch_weapon(&mut state, false);
        switch_weapon(&mut state, false);
        assert_eq!(state.player.weapon, WeaponKind::Sniper);
        assert_eq!(state.player.ammo, 12);
    }

    #[test]
    fn test_dash_damages_enemies_in_path() {
        let mut state = bare_state();
        state.player.pos.x = 400.0;
        state.enemies.push(Enemy::new(100, EnemyKind::Guard { cover_x: None }, 500.0));
        state.enemies.push(Enemy::new(101, EnemyKind::Guard { cover_x: None }, 800.0));
        let mut airborne = Enemy::new(102, EnemyKind::Dog { lunge_until_ms: 0.0 }, 520.0);
        airborne.pos.y -= 200.0;
        state.enemies.push(airborne);
        state.camera.shake = 0.0;

        assert!(dash_attack(&mut state, 10_000.0));
        assert_eq!(state.player.pos.x, 600.0);
        assert_eq!(state.enemies[0].health, 30.0 - DASH_DAMAGE);
        assert_eq!(state.enemies[1].health, 30.0);
        assert_eq!(state.enemies[2].health, 20.0);
        assert!(state.camera.shake > 0.0);
        assert!(!state.particles.is_empty());
        // Cooldown
        assert!(!dash_attack(&mut state, 10_000.0 + DASH_COOLDOWN_MS - 1.0));
        assert_eq!(state.player.pos.x, 600.0);
    }

    #[test]
    fn test_dash_clamped_to_level() {
        let mut state = bare_state();
        state.player.facing = Facing::Left;
        state.player.pos.x = 50.0;
        assert!(dash_attack(&mut state, 0.0));
        assert_eq!(state.player.pos.x, 0.0);
    }

    #[test]
    fn test_multi_shot_ignores_ammo() {
        let mut state = bare_state();
        state.player.ammo = 0;
        assert!(multi_shot(&mut state, 0.0));
        assert_eq!(state.bullets.len(), MULTI_SHOT_COUNT);
        assert_eq!(state.player.ammo, 0);
        let expected = 40.0 * MULTI_SHOT_DAMAGE_MULT;
        assert!(state.bullets.iter().all(|b| (b.damage - expected).abs() < 1e-4));
        // Symmetric fan: middle bullet flies straight
        assert!(state.bullets[MULTI_SHOT_COUNT / 2].vel.y.abs() < 1e-4);
        assert!(!multi_shot(&mut state, 100.0));
    }

    #[test]
    fn test_rage_doubles_damage_for_a_window() {
        let mut state = bare_state();
        assert!(activate_rage(&mut state, 1000.0));
        shoot(&mut state, 1000.0);
        assert_eq!(state.bullets[0].damage, 80.0);
        shoot(&mut state, 1000.0 + RAGE_DURATION_MS);
        assert_eq!(state.bullets[1].damage, 40.0);
        assert!(!activate_rage(&mut state, 2000.0));
        assert_eq!(state.player.ammo, 58);
    }
}
