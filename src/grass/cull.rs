//! Visibility classification for simulated blades.
//!
//! Three independent predicates, each toggled by [`CullConfig`]:
//!
//! - **distance**: id-bucketed banding that thins blades as their
//!   ground-plane distance to the camera approaches `max_distance`
//! - **orientation**: rejects blades seen too edge-on
//! - **frustum**: rejects blades whose root, tip and curve midpoint all lie
//!   outside the tolerance-expanded clip volume
//!
//! [`classify`] evaluates them in that order (cheapest first) and stops at
//! the first failure. The order only affects which test a rejection is
//! attributed to, never the verdict.

use crate::core::camera::CameraMatrices;
use crate::core::types::{Mat4, Vec3};
use crate::grass::blade::Blade;
use crate::grass::config::CullConfig;

/// Which test rejected a blade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CullReason {
    Distance,
    Orientation,
    Frustum,
}

/// Outcome of classifying one blade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Visible,
    Culled(CullReason),
}

impl Verdict {
    pub fn is_visible(self) -> bool {
        matches!(self, Verdict::Visible)
    }
}

/// Per-dispatch camera data shared by every blade.
#[derive(Clone, Copy, Debug)]
pub struct ViewContext {
    pub camera_position: Vec3,
    pub view_proj: Mat4,
}

impl ViewContext {
    pub fn new(camera: &CameraMatrices) -> Self {
        Self {
            camera_position: camera.world_position(),
            view_proj: camera.view_projection(),
        }
    }
}

/// Camera-to-root vector with its `up` component removed.
pub fn ground_view_dir(blade: &Blade, camera_position: Vec3) -> Vec3 {
    let up = blade.up();
    let cam_to_blade = blade.v0() - camera_position;
    cam_to_blade - up * cam_to_blade.dot(up)
}

/// Ground-plane view distances below this count as a degenerate direction.
const MIN_VIEW_DISTANCE: f32 = 1e-4;

/// Orientation test: visible unless the view direction is nearly
/// perpendicular to the blade's width tangent.
///
/// A degenerate view direction (camera straight along `up`) counts as a
/// zero dot product.
pub fn orientation_visible(blade: &Blade, view_dir: Vec3, threshold: f32) -> bool {
    let alignment = if view_dir.length_squared() > MIN_VIEW_DISTANCE * MIN_VIEW_DISTANCE {
        view_dir.normalize().dot(blade.width_tangent()).abs()
    } else {
        0.0
    };
    alignment >= threshold
}

/// Whether `point` projects inside the clip volume expanded by `tolerance`.
///
/// Only clip x and y are tested.
pub fn in_frustum(view_proj: &Mat4, point: Vec3, tolerance: f32) -> bool {
    let clip = *view_proj * point.extend(1.0);
    let bound = clip.w + tolerance;
    clip.x >= -bound && clip.x <= bound && clip.y >= -bound && clip.y <= bound
}

/// Frustum test: visible if root, tip or curve midpoint is in frustum.
pub fn frustum_visible(blade: &Blade, view_proj: &Mat4, tolerance: f32) -> bool {
    let midpoint = blade.curve_point(0.5);
    [blade.v0(), blade.v2(), midpoint]
        .into_iter()
        .any(|p| in_frustum(view_proj, p, tolerance))
}

/// Distance-band test.
///
/// Blades fall into `levels` buckets by `id % levels`. Only buckets below
/// `floor(levels * (1 - distance / max_distance))` survive, so nothing
/// survives at or beyond `max_distance`.
pub fn distance_visible(
    id: usize,
    projected_distance: f32,
    max_distance: f32,
    levels: u32,
) -> bool {
    if levels == 0 || max_distance <= 0.0 {
        return true;
    }
    let bucket = (id % levels as usize) as f32;
    let cutoff = (levels as f32 * (1.0 - projected_distance / max_distance)).floor();
    bucket < cutoff
}

/// Classify one post-simulation blade.
pub fn classify(blade: &Blade, id: usize, view: &ViewContext, config: &CullConfig) -> Verdict {
    let view_dir = ground_view_dir(blade, view.camera_position);

    if config.distance
        && !distance_visible(id, view_dir.length(), config.max_distance, config.distance_levels)
    {
        return Verdict::Culled(CullReason::Distance);
    }
    if config.orientation && !orientation_visible(blade, view_dir, config.orientation_threshold) {
        return Verdict::Culled(CullReason::Orientation);
    }
    if config.frustum && !frustum_visible(blade, &view.view_proj, config.frustum_tolerance) {
        return Verdict::Culled(CullReason::Frustum);
    }
    Verdict::Visible
}
