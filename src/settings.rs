//! Simulation settings
//!
//! Arena geometry, integration tuning and broad-phase choice. Loaded from
//! JSON by the host application; defaults reproduce the stock arena.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{SimError, SimResult};
use crate::sim::DetectorKind;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run seed for the AI random stream
    pub seed: u64,

    // === Arena ===
    /// Arena width (x grows east)
    pub arena_width: f32,
    /// Arena height (y grows south)
    pub arena_height: f32,
    /// Inset of the playable boundary used by wall checks
    pub wall_margin: f32,

    // === Integration ===
    /// Velocity magnitude below which bodies snap to rest
    pub velocity_epsilon: f32,
    /// Largest elapsed time accepted by a single tick (ms); longer frames are clamped
    pub max_tick_ms: f32,

    // === Collision ===
    /// Broad-phase strategy
    pub detector: DetectorKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            wall_margin: WALL_MARGIN,

            velocity_epsilon: VELOCITY_EPSILON,
            max_tick_ms: 100.0,

            detector: DetectorKind::SweepAndPrune,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document (missing fields take defaults)
    pub fn from_json(json: &str) -> SimResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject geometry that would leave no playable area
    pub fn validate(&self) -> SimResult<()> {
        if !(self.wall_margin >= 0.0) {
            return Err(SimError::config(format!(
                "wall margin must be non-negative, got {}",
                self.wall_margin
            )));
        }
        if !(self.arena_width > 2.0 * self.wall_margin)
            || !(self.arena_height > 2.0 * self.wall_margin)
        {
            return Err(SimError::config(format!(
                "arena {}x{} has no room inside a {} wall margin",
                self.arena_width, self.arena_height, self.wall_margin
            )));
        }
        if !(self.velocity_epsilon >= 0.0) {
            return Err(SimError::config("velocity epsilon must be non-negative"));
        }
        if !(self.max_tick_ms > 0.0) {
            return Err(SimError::config("max tick length must be positive"));
        }
        Ok(())
    }
}
