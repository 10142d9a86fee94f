//! GPU-layout blade record and indirect-draw arguments.
//!
//! Each blade packs three Bézier control points and an up vector into four
//! `vec4`s, with one scalar attribute riding in each `w` component:
//!
//! | field | xyz          | w           |
//! |-------|--------------|-------------|
//! | `v0`  | root         | orientation |
//! | `v1`  | middle point | height      |
//! | `v2`  | tip          | width       |
//! | `up`  | local up     | stiffness   |

use bytemuck::{Pod, Zeroable};

use crate::core::types::{Vec3, Vec4};

/// One grass strand (64 bytes, 16-byte aligned).
/// Must match `Blade` in the compute and vertex shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Blade {
    v0: [f32; 4],
    v1: [f32; 4],
    v2: [f32; 4],
    up: [f32; 4],
}

impl Blade {
    /// Build a blade from its four packed vectors.
    ///
    /// The xyz of `up` is normalized (a zero vector becomes `+Y`); its `w`
    /// stiffness is kept as given.
    pub fn from_packed(v0: Vec4, v1: Vec4, v2: Vec4, up: Vec4) -> Self {
        let dir = up.truncate().try_normalize().unwrap_or(Vec3::Y);
        Self {
            v0: v0.to_array(),
            v1: v1.to_array(),
            v2: v2.to_array(),
            up: dir.extend(up.w).to_array(),
        }
    }

    /// Create an undisplaced blade standing straight along `up`.
    ///
    /// The tip rests at `v0 + height * up` and the middle point sits halfway.
    pub fn at_rest(
        root: Vec3,
        up: Vec3,
        orientation: f32,
        height: f32,
        width: f32,
        stiffness: f32,
    ) -> Self {
        let up = up.try_normalize().unwrap_or(Vec3::Y);
        let tip = root + up * height;
        let mid = root + up * (height * 0.5);
        Self::from_packed(
            root.extend(orientation),
            mid.extend(height),
            tip.extend(width),
            up.extend(stiffness),
        )
    }

    /// Root / anchor position.
    pub fn v0(&self) -> Vec3 {
        Vec3::from_slice(&self.v0[..3])
    }

    /// Middle control point.
    pub fn v1(&self) -> Vec3 {
        Vec3::from_slice(&self.v1[..3])
    }

    /// Tip control point.
    pub fn v2(&self) -> Vec3 {
        Vec3::from_slice(&self.v2[..3])
    }

    /// Local up direction.
    pub fn up(&self) -> Vec3 {
        Vec3::from_slice(&self.up[..3])
    }

    /// Facing angle around `up`, in radians.
    pub fn orientation(&self) -> f32 {
        self.v0[3]
    }

    /// Rest length from root to tip.
    pub fn height(&self) -> f32 {
        self.v1[3]
    }

    /// Blade width. Carried through for rendering only.
    pub fn width(&self) -> f32 {
        self.v2[3]
    }

    /// Recovery coefficient.
    pub fn stiffness(&self) -> f32 {
        self.up[3]
    }

    /// Replace the middle control point, keeping the packed height.
    pub fn set_v1(&mut self, v1: Vec3) {
        self.v1[..3].copy_from_slice(&v1.to_array());
    }

    /// Replace the tip control point, keeping the packed width.
    pub fn set_v2(&mut self, v2: Vec3) {
        self.v2[..3].copy_from_slice(&v2.to_array());
    }

    /// Undisplaced tip position, `v0 + height * up`.
    pub fn rest_tip(&self) -> Vec3 {
        self.v0() + self.up() * self.height()
    }

    /// Unit vector along the blade's width, derived from its orientation.
    pub fn width_tangent(&self) -> Vec3 {
        let (sin, cos) = self.orientation().sin_cos();
        Vec3::new(-cos, 0.0, sin).normalize_or_zero()
    }

    /// Unit vector perpendicular to both the width tangent and `up`.
    ///
    /// Zero when `up` is parallel to the width tangent.
    pub fn front(&self) -> Vec3 {
        self.width_tangent().cross(self.up()).normalize_or_zero()
    }

    /// Evaluate the quadratic Bézier curve at parameter `t` in `[0, 1]`.
    pub fn curve_point(&self, t: f32) -> Vec3 {
        let s = 1.0 - t;
        self.v0() * (s * s) + self.v1() * (2.0 * s * t) + self.v2() * (t * t)
    }

    /// Length of the control polygon, `|v0 v1| + |v1 v2|`.
    pub fn polyline_length(&self) -> f32 {
        self.v0().distance(self.v1()) + self.v1().distance(self.v2())
    }
}

/// Non-indexed indirect draw arguments (16 bytes).
///
/// Layout matches `draw_indirect`: `[vertex_count, instance_count,
/// first_vertex, first_instance]`. The issuer draws `vertex_count` blades
/// as one instance.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawArgs {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

impl DrawArgs {
    /// Arguments for drawing `count` compacted blades.
    pub fn with_count(count: u32) -> Self {
        Self {
            vertex_count: count,
            instance_count: 1,
            first_vertex: 0,
            first_instance: 0,
        }
    }
}

impl Default for DrawArgs {
    fn default() -> Self {
        Self::with_count(0)
    }
}
