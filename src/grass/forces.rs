//! Per-blade force integration.
//!
//! Sums environmental gravity, blade-front gravity, Hooke's-law recovery and
//! a directional wind force, then advances the tip by `force * dt`. The root,
//! up vector and packed scalars are never touched.

use crate::core::time::SimTime;
use crate::core::types::Vec3;
use crate::grass::blade::Blade;
use crate::grass::config::GrassConfig;

/// Share of environmental gravity pulling along the blade's front.
const FRONT_GRAVITY_SCALE: f32 = 0.25;

/// Environmental gravity, `normalize(direction) * magnitude`.
pub fn environmental_gravity(config: &GrassConfig) -> Vec3 {
    config.gravity_dir() * config.gravity
}

/// Gravity component leaning the blade along its own facing plane.
pub fn front_gravity(blade: &Blade, gravity: Vec3) -> Vec3 {
    blade.front() * (FRONT_GRAVITY_SCALE * gravity.length())
}

/// Hooke's-law force pulling the tip back to its rest position.
pub fn recovery(blade: &Blade) -> Vec3 {
    (blade.rest_tip() - blade.v2()) * blade.stiffness()
}

/// Wind field sampled at the blade root.
///
/// Each blade gets its phase from its planar position only.
pub fn wind_field(root: Vec3, total_time: f32, config: &GrassConfig) -> Vec3 {
    let freq = config.wind_frequency;
    Vec3::new(
        (freq * root.x * total_time).sin(),
        0.0,
        (freq * root.z * total_time).cos(),
    ) * config.wind_magnitude
}

/// Wind force after directional and height alignment.
///
/// Zero when the wind vector, the blade direction, or the height is
/// degenerate.
pub fn wind_force(blade: &Blade, wind: Vec3) -> Vec3 {
    let height = blade.height();
    if height <= 0.0 {
        return Vec3::ZERO;
    }
    let lean = blade.v2() - blade.v0();
    let (Some(wind_dir), Some(lean_dir)) = (wind.try_normalize(), lean.try_normalize()) else {
        return Vec3::ZERO;
    };
    let directional = 1.0 - wind_dir.dot(lean_dir).abs();
    let height_ratio = lean.dot(blade.up()) / height;
    wind * (directional * height_ratio)
}

/// Net force acting on the tip this tick.
pub fn net_force(blade: &Blade, time: SimTime, config: &GrassConfig) -> Vec3 {
    let gravity = environmental_gravity(config);
    let wind = wind_field(blade.v0(), time.total, config);
    gravity + front_gravity(blade, gravity) + recovery(blade) + wind_force(blade, wind)
}

/// Advance the tip by one time step. Only `v2` changes here.
pub fn integrate(blade: &mut Blade, time: SimTime, config: &GrassConfig) {
    let displacement = net_force(blade, time, config) * time.delta;
    if !displacement.is_finite() {
        return;
    }
    blade.set_v2(blade.v2() + displacement);
}
