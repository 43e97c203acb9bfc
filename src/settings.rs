//! Presentation-facing settings
//!
//! These knobs never change gameplay outcomes, only how much cosmetic state
//! the simulation keeps around (particles, trails) and whether it produces
//! screen shake for the renderer.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 150,
            QualityPreset::Medium => 500,
            QualityPreset::High => 1500,
        }
    }

    /// Bullet trail length (points kept per bullet)
    pub fn trail_length(&self) -> usize {
        match self {
            QualityPreset::Low => 2,
            QualityPreset::Medium => 5,
            QualityPreset::High => 8,
        }
    }
}

/// Simulation-side settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Quality preset
    pub quality: QualityPreset,
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,
    /// Bullet trails
    pub trails: bool,
    /// Particle effects (blood, sparks, smoke, explosions)
    pub particles: bool,
    /// Reduced motion (suppresses shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            screen_shake: true,
            trails: true,
            particles: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Parse settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let settings: Settings =
            serde_json::from_str(json).context("failed to parse settings JSON")?;
        log::info!("Loaded settings (quality: {})", settings.quality.as_str());
        Ok(settings)
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective trail length
    pub fn trail_length(&self) -> usize {
        if !self.trails {
            0
        } else {
            self.quality.trail_length()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
    }

    #[test]
    fn test_particles_off_caps_to_zero() {
        let mut settings = Settings::from_preset(QualityPreset::High);
        assert_eq!(settings.max_particles(), 1500);
        settings.particles = false;
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_from_json_partial() {
        let settings = Settings::from_json(r#"{ "quality": "Low", "trails": false }"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::Low);
        assert_eq!(settings.trail_length(), 0);
        assert!(settings.particles);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Settings::from_json("{ quality: ").is_err());
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }
}
