//! Level descriptors
//!
//! Levels are data: a length, spawn densities, weighted type tables and an
//! objective list. The built-in catalog covers the three shipped levels;
//! hosts can load their own from JSON. A catalog is validated once at load
//! time so the simulation step never sees a malformed level.

use anyhow::{Context, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::consts::VIEWPORT_WIDTH;
use crate::sim::state::{EnemyType, ObjectiveKind, ObstacleKind, PowerupKind};
use crate::sim::weapons::WeaponKind;

/// One entry of a weighted spawn table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<T> {
    pub item: T,
    pub weight: f32,
}

impl<T> WeightedEntry<T> {
    pub const fn new(item: T, weight: f32) -> Self {
        Self { item, weight }
    }
}

/// Objective template, instantiated fresh on every level entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
}

/// Static description of a level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    /// Theme tag for the renderer (palette, backdrop)
    pub theme: String,
    /// World length in pixels
    pub length: f32,
    /// Spawn probabilities per candidate slot (0-1)
    pub enemy_density: f32,
    pub obstacle_density: f32,
    pub powerup_density: f32,
    pub enemy_weights: Vec<WeightedEntry<EnemyType>>,
    pub obstacle_weights: Vec<WeightedEntry<ObstacleKind>>,
    pub powerup_weights: Vec<WeightedEntry<PowerupKind>>,
    #[serde(default)]
    pub objectives: Vec<ObjectiveSpec>,
    /// Boss identifier; a level with a boss completes when it dies
    #[serde(default)]
    pub boss: Option<String>,
}

impl LevelDescriptor {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.length > VIEWPORT_WIDTH * 2.0,
            "level '{}' is too short ({} px)",
            self.name,
            self.length
        );
        for (label, density) in [
            ("enemy", self.enemy_density),
            ("obstacle", self.obstacle_density),
            ("powerup", self.powerup_density),
        ] {
            ensure!(
                (0.0..=1.0).contains(&density),
                "level '{}': {label} density {density} outside [0, 1]",
                self.name
            );
        }
        check_weights(&self.name, "enemy", &self.enemy_weights)?;
        check_weights(&self.name, "obstacle", &self.obstacle_weights)?;
        check_weights(&self.name, "powerup", &self.powerup_weights)?;
        if self.enemy_weights.iter().any(|e| e.item == EnemyType::Boss) {
            bail!("level '{}': bosses cannot come from the enemy table", self.name);
        }
        for objective in &self.objectives {
            match objective.kind {
                ObjectiveKind::Reach { x } => ensure!(
                    x <= self.length,
                    "level '{}': objective '{}' lies past the level end",
                    self.name,
                    objective.id
                ),
                ObjectiveKind::DefeatBoss => ensure!(
                    self.boss.is_some(),
                    "level '{}': objective '{}' needs a boss",
                    self.name,
                    objective.id
                ),
                _ => {}
            }
        }
        Ok(())
    }
}

fn check_weights<T>(level: &str, label: &str, table: &[WeightedEntry<T>]) -> anyhow::Result<()> {
    ensure!(!table.is_empty(), "level '{level}': empty {label} table");
    ensure!(
        table.iter().all(|e| e.weight > 0.0 && e.weight.is_finite()),
        "level '{level}': {label} weights must be positive"
    );
    Ok(())
}

/// Ordered list of levels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub levels: Vec<LevelDescriptor>,
}

impl LevelCatalog {
    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let catalog: LevelCatalog =
            serde_json::from_str(json).context("failed to parse level catalog JSON")?;
        if let Err(err) = catalog.validate() {
            log::warn!("Rejected level catalog: {err:#}");
            return Err(err);
        }
        log::info!("Loaded {} levels", catalog.levels.len());
        Ok(catalog)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.levels.is_empty(), "level catalog is empty");
        for level in &self.levels {
            level.validate()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelDescriptor> {
        self.levels.get(index)
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 >= self.levels.len()
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        use EnemyType::{Dog, Guard};
        use ObstacleKind::{Crate, Fence, Platform, Wall};

        let objective = |id: &str, description: &str, kind| ObjectiveSpec {
            id: id.to_string(),
            description: description.to_string(),
            kind,
        };

        Self {
            levels: vec![
                LevelDescriptor {
                    name: "Outskirts".to_string(),
                    theme: "suburbs".to_string(),
                    length: 4000.0,
                    enemy_density: 0.5,
                    obstacle_density: 0.45,
                    powerup_density: 0.35,
                    enemy_weights: vec![WeightedEntry::new(Guard, 80.0), WeightedEntry::new(Dog, 20.0)],
                    obstacle_weights: vec![
                        WeightedEntry::new(Crate, 40.0),
                        WeightedEntry::new(Fence, 25.0),
                        WeightedEntry::new(Wall, 15.0),
                        WeightedEntry::new(Platform, 20.0),
                    ],
                    powerup_weights: vec![
                        WeightedEntry::new(PowerupKind::Health, 40.0),
                        WeightedEntry::new(PowerupKind::Ammo, 40.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Rifle), 15.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Shotgun), 5.0),
                    ],
                    objectives: vec![
                        objective("clear_patrol", "Eliminate 5 hostiles", ObjectiveKind::Eliminate { target: 5 }),
                        objective("reach_checkpoint", "Reach the checkpoint", ObjectiveKind::Reach { x: 3800.0 }),
                    ],
                    boss: None,
                },
                LevelDescriptor {
                    name: "Industrial Zone".to_string(),
                    theme: "factory".to_string(),
                    length: 5000.0,
                    enemy_density: 0.6,
                    obstacle_density: 0.55,
                    powerup_density: 0.3,
                    enemy_weights: vec![WeightedEntry::new(Guard, 60.0), WeightedEntry::new(Dog, 40.0)],
                    obstacle_weights: vec![
                        WeightedEntry::new(Crate, 35.0),
                        WeightedEntry::new(Fence, 15.0),
                        WeightedEntry::new(Wall, 25.0),
                        WeightedEntry::new(Platform, 25.0),
                    ],
                    powerup_weights: vec![
                        WeightedEntry::new(PowerupKind::Health, 35.0),
                        WeightedEntry::new(PowerupKind::Ammo, 35.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Shotgun), 20.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Sniper), 10.0),
                    ],
                    objectives: vec![
                        objective("sweep_factory", "Eliminate 10 hostiles", ObjectiveKind::Eliminate { target: 10 }),
                        objective("scavenge", "Collect 3 supplies", ObjectiveKind::Collect { target: 3 }),
                    ],
                    boss: None,
                },
                LevelDescriptor {
                    name: "Fortress".to_string(),
                    theme: "fortress".to_string(),
                    length: 6000.0,
                    enemy_density: 0.7,
                    obstacle_density: 0.6,
                    powerup_density: 0.35,
                    enemy_weights: vec![WeightedEntry::new(Guard, 70.0), WeightedEntry::new(Dog, 30.0)],
                    obstacle_weights: vec![
                        WeightedEntry::new(Crate, 30.0),
                        WeightedEntry::new(Fence, 10.0),
                        WeightedEntry::new(Wall, 35.0),
                        WeightedEntry::new(Platform, 25.0),
                    ],
                    powerup_weights: vec![
                        WeightedEntry::new(PowerupKind::Health, 45.0),
                        WeightedEntry::new(PowerupKind::Ammo, 30.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Rifle), 10.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Shotgun), 10.0),
                        WeightedEntry::new(PowerupKind::Weapon(WeaponKind::Sniper), 5.0),
                    ],
                    objectives: vec![
                        objective("break_garrison", "Eliminate 12 hostiles", ObjectiveKind::Eliminate { target: 12 }),
                        objective("topple_warlord", "Defeat the Warlord", ObjectiveKind::DefeatBoss),
                    ],
                    boss: Some("Warlord".to_string()),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = LevelCatalog::default();
        assert_eq!(catalog.len(), 3);
        catalog.validate().unwrap();
        assert!(catalog.is_last(2));
        assert!(!catalog.is_last(1));
        assert!(catalog.levels.last().unwrap().boss.is_some());
    }

    #[test]
    fn test_json_roundtrip_of_default() {
        let json = serde_json::to_string(&LevelCatalog::default()).unwrap();
        let parsed = LevelCatalog::from_json(&json).unwrap();
        assert_eq!(parsed.levels[1].name, "Industrial Zone");
        assert_eq!(
            parsed.levels[0].powerup_weights[2].item,
            PowerupKind::Weapon(WeaponKind::Rifle)
        );
    }

    #[test]
    fn test_rejects_bad_density() {
        let mut catalog = LevelCatalog::default();
        catalog.levels[0].enemy_density = 1.5;
        let json = serde_json::to_string(&catalog).unwrap();
        let err = LevelCatalog::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("density"));
    }

    #[test]
    fn test_rejects_empty_table() {
        let mut catalog = LevelCatalog::default();
        catalog.levels[1].obstacle_weights.clear();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_rejects_boss_objective_without_boss() {
        let mut catalog = LevelCatalog::default();
        catalog.levels[0].objectives.push(ObjectiveSpec {
            id: "ghost".to_string(),
            description: "Defeat nobody".to_string(),
            kind: ObjectiveKind::DefeatBoss,
        });
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(LevelCatalog::from_json(r#"{ "levels": [] }"#).is_err());
    }
}
