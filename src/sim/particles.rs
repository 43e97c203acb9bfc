//! Cosmetic particle bursts

use glam::Vec2;
use rand::Rng;

use super::state::{Particle, ParticleKind};

/// Per-kind motion and look
struct ParticleStyle {
    speed: (f32, f32),
    life: (f32, f32),
    size: (f32, f32),
    color: u32,
    /// Added to vy each frame (negative rises)
    gravity: f32,
    /// Velocity multiplier each frame
    drag: f32,
    /// Size multiplier each frame
    growth: f32,
}

fn style(kind: ParticleKind) -> ParticleStyle {
    match kind {
        ParticleKind::Explosion => ParticleStyle {
            speed: (2.0, 8.0),
            life: (20.0, 40.0),
            size: (4.0, 10.0),
            color: 0xFFAA33,
            gravity: 0.0,
            drag: 0.92,
            growth: 0.97,
        },
        ParticleKind::Spark => ParticleStyle {
            speed: (3.0, 9.0),
            life: (10.0, 20.0),
            size: (1.0, 3.0),
            color: 0xFFFF88,
            gravity: 0.2,
            drag: 0.95,
            growth: 1.0,
        },
        ParticleKind::Smoke => ParticleStyle {
            speed: (0.5, 2.0),
            life: (40.0, 70.0),
            size: (6.0, 12.0),
            color: 0x777777,
            gravity: -0.05,
            drag: 0.98,
            growth: 1.01,
        },
        ParticleKind::Blood => ParticleStyle {
            speed: (1.0, 5.0),
            life: (25.0, 45.0),
            size: (2.0, 4.0),
            color: 0xAA0000,
            gravity: 0.4,
            drag: 0.99,
            growth: 1.0,
        },
    }
}

/// Spawn `count` particles of `kind` radiating from `pos`.
///
/// The oldest particles are dropped so the collection never exceeds `cap`.
pub fn spawn_burst<R: Rng>(
    particles: &mut Vec<Particle>,
    rng: &mut R,
    pos: Vec2,
    kind: ParticleKind,
    count: usize,
    cap: usize,
) {
    if cap == 0 || count == 0 {
        return;
    }
    let s = style(kind);
    for _ in 0..count.min(cap) {
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        let speed = rng.random_range(s.speed.0..s.speed.1);
        let life = rng.random_range(s.life.0..s.life.1);
        particles.push(Particle {
            pos,
            vel: Vec2::from_angle(angle) * speed,
            life,
            max_life: life,
            color: s.color,
            size: rng.random_range(s.size.0..s.size.1),
            kind,
        });
    }
    if particles.len() > cap {
        let excess = particles.len() - cap;
        particles.drain(..excess);
    }
}

/// Advance every particle one frame and drop the expired ones
pub fn update_particles(particles: &mut Vec<Particle>) {
    for p in particles.iter_mut() {
        let s = style(p.kind);
        p.pos += p.vel;
        p.vel.y += s.gravity;
        p.vel *= s.drag;
        p.size *= s.growth;
        p.life -= 1.0;
    }
    particles.retain(|p| p.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_burst_respects_cap() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut particles = Vec::new();
        spawn_burst(&mut particles, &mut rng, Vec2::ZERO, ParticleKind::Blood, 30, 50);
        assert_eq!(particles.len(), 30);
        spawn_burst(&mut particles, &mut rng, Vec2::ONE, ParticleKind::Spark, 30, 50);
        assert_eq!(particles.len(), 50);
        // Oldest (blood) were evicted first
        assert_eq!(particles.last().unwrap().kind, ParticleKind::Spark);
        assert_eq!(particles[0].kind, ParticleKind::Blood);
    }

    #[test]
    fn test_zero_cap_spawns_nothing() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut particles = Vec::new();
        spawn_burst(&mut particles, &mut rng, Vec2::ZERO, ParticleKind::Smoke, 10, 0);
        assert!(particles.is_empty());
    }

    #[test]
    fn test_particles_expire() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut particles = Vec::new();
        spawn_burst(&mut particles, &mut rng, Vec2::ZERO, ParticleKind::Explosion, 20, 100);
        for _ in 0..40 {
            update_particles(&mut particles);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_blood_falls_smoke_rises() {
        let mut blood = vec![Particle {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 10.0,
            max_life: 10.0,
            color: 0,
            size: 1.0,
            kind: ParticleKind::Blood,
        }];
        let mut smoke = blood.clone();
        smoke[0].kind = ParticleKind::Smoke;
        for _ in 0..5 {
            update_particles(&mut blood);
            update_particles(&mut smoke);
        }
        assert!(blood[0].pos.y > 0.0);
        assert!(smoke[0].pos.y < 0.0);
        assert_eq!(blood[0].life, 5.0);
    }
}
