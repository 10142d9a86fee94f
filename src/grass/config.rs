//! Grass simulation configuration.
//!
//! These are the tunable constants of the kernel. They are fixed for the
//! duration of a dispatch and can be loaded from / saved to JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};

/// Number of blades processed in lockstep per batch.
pub const WORKGROUP_SIZE: usize = 32;

/// Simulation and culling settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    /// Environmental gravity magnitude (m/s^2).
    pub gravity: f32,
    /// Gravity direction, normalized on use.
    pub gravity_direction: [f32; 3],
    /// Wind acceleration scale.
    pub wind_magnitude: f32,
    /// Spatial/temporal frequency of the wind field.
    pub wind_frequency: f32,
    /// Visibility test settings.
    pub cull: CullConfig,
    /// Blades per lockstep batch.
    pub workgroup_size: usize,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            gravity_direction: [0.0, -1.0, 0.0],
            wind_magnitude: 4.0,
            wind_frequency: 0.5,
            cull: CullConfig::default(),
            workgroup_size: WORKGROUP_SIZE,
        }
    }
}

impl GrassConfig {
    /// Gravity direction as a unit vector, or zero if degenerate.
    pub fn gravity_dir(&self) -> Vec3 {
        Vec3::from_array(self.gravity_direction).normalize_or_zero()
    }

    /// Check every field for values the kernel cannot work with.
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("gravity", self.gravity),
            ("wind_magnitude", self.wind_magnitude),
            ("wind_frequency", self.wind_frequency),
            ("gravity_direction.x", self.gravity_direction[0]),
            ("gravity_direction.y", self.gravity_direction[1]),
            ("gravity_direction.z", self.gravity_direction[2]),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(Error::Config(format!("{name} must be finite, got {value}")));
            }
        }
        if self.workgroup_size == 0 {
            return Err(Error::Config("workgroup_size must be at least 1".into()));
        }
        self.cull.validate()
    }

    /// Load a config from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Visibility test toggles and thresholds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullConfig {
    /// Enable the edge-on orientation test.
    pub orientation: bool,
    /// Enable the clip-space frustum test.
    pub frustum: bool,
    /// Enable the distance-band test.
    pub distance: bool,
    /// Cosine cutoff for the orientation test.
    pub orientation_threshold: f32,
    /// Clip-space slack added to `w` in the frustum test.
    pub frustum_tolerance: f32,
    /// Ground-plane distance beyond which every blade is culled.
    pub max_distance: f32,
    /// Number of distance bands blades are bucketed into.
    pub distance_levels: u32,
}

impl Default for CullConfig {
    fn default() -> Self {
        Self {
            orientation: true,
            frustum: true,
            distance: true,
            orientation_threshold: 0.1,
            frustum_tolerance: 1.0,
            max_distance: 50.0,
            distance_levels: 10,
        }
    }
}

impl CullConfig {
    /// All tests disabled: every blade is visible.
    pub fn disabled() -> Self {
        Self {
            orientation: false,
            frustum: false,
            distance: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.orientation_threshold) {
            return Err(Error::Config(format!(
                "orientation_threshold must be in [0, 1], got {}",
                self.orientation_threshold
            )));
        }
        if !self.frustum_tolerance.is_finite() || self.frustum_tolerance < 0.0 {
            return Err(Error::Config(format!(
                "frustum_tolerance must be finite and non-negative, got {}",
                self.frustum_tolerance
            )));
        }
        if !self.max_distance.is_finite() || self.max_distance <= 0.0 {
            return Err(Error::Config(format!(
                "max_distance must be finite and positive, got {}",
                self.max_distance
            )));
        }
        if self.distance_levels == 0 {
            return Err(Error::Config("distance_levels must be at least 1".into()));
        }
        Ok(())
    }
}
