//! Weapon catalog
//!
//! Stats are plain data. The catalog has one field per weapon so a config
//! missing a weapon fails to parse instead of surfacing mid-game.

use serde::{Deserialize, Serialize};

/// Weapons in switch order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Pistol,
    Rifle,
    Shotgun,
    Sniper,
}

impl WeaponKind {
    /// Fixed cycling order for weapon switching
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Pistol,
        WeaponKind::Rifle,
        WeaponKind::Shotgun,
        WeaponKind::Sniper,
    ];

    fn index(self) -> usize {
        match self {
            WeaponKind::Pistol => 0,
            WeaponKind::Rifle => 1,
            WeaponKind::Shotgun => 2,
            WeaponKind::Sniper => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Per-weapon stats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: f32,
    /// Minimum interval between shots (ms)
    pub fire_rate_ms: f64,
    /// Ammo on pickup/switch
    pub ammo: u32,
    /// Total angular spread (radians) across all pellets
    pub spread: f32,
    /// Pixels per frame
    pub bullet_speed: f32,
    /// Pellets per shot
    pub bullet_count: usize,
}

/// The full weapon table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponCatalog {
    pub pistol: WeaponStats,
    pub rifle: WeaponStats,
    pub shotgun: WeaponStats,
    pub sniper: WeaponStats,
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        Self {
            pistol: WeaponStats {
                damage: 40.0,
                fire_rate_ms: 300.0,
                ammo: 60,
                spread: 0.0,
                bullet_speed: 15.0,
                bullet_count: 1,
            },
            rifle: WeaponStats {
                damage: 30.0,
                fire_rate_ms: 120.0,
                ammo: 150,
                spread: 0.05,
                bullet_speed: 20.0,
                bullet_count: 1,
            },
            shotgun: WeaponStats {
                damage: 25.0,
                fire_rate_ms: 800.0,
                ammo: 24,
                spread: 0.25,
                bullet_speed: 12.0,
                bullet_count: 7,
            },
            sniper: WeaponStats {
                damage: 120.0,
                fire_rate_ms: 1200.0,
                ammo: 12,
                spread: 0.0,
                bullet_speed: 30.0,
                bullet_count: 1,
            },
        }
    }
}

impl WeaponCatalog {
    pub fn get(&self, kind: WeaponKind) -> &WeaponStats {
        match kind {
            WeaponKind::Pistol => &self.pistol,
            WeaponKind::Rifle => &self.rifle,
            WeaponKind::Shotgun => &self.shotgun,
            WeaponKind::Sniper => &self.sniper,
        }
    }

    /// Parse a catalog from JSON
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        use anyhow::{Context, ensure};

        let catalog: WeaponCatalog =
            serde_json::from_str(json).context("failed to parse weapon catalog JSON")?;
        for kind in WeaponKind::ALL {
            let stats = catalog.get(kind);
            ensure!(stats.bullet_count > 0, "{kind:?} fires zero pellets");
            ensure!(stats.bullet_speed > 0.0, "{kind:?} has non-positive bullet speed");
            ensure!(stats.fire_rate_ms >= 0.0, "{kind:?} has negative fire rate");
        }
        Ok(catalog)
    }
}

/// Fire-rate gate
#[inline]
pub fn can_fire(stats: &WeaponStats, last_shot_ms: f64, now_ms: f64) -> bool {
    now_ms - last_shot_ms >= stats.fire_rate_ms
}

/// Angular offsets for `count` pellets spread evenly across `spread`,
/// symmetric about zero.
pub fn spread_angles(count: usize, spread: f32) -> Vec<f32> {
    if count <= 1 {
        return vec![0.0; count];
    }
    let step = spread / (count - 1) as f32;
    (0..count).map(|i| -spread / 2.0 + step * i as f32).collect()
}
