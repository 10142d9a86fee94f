//! Shape stabilization after force integration.
//!
//! A single closed-form pass per tick: clamp the tip above ground, re-derive
//! the middle point from the tip's sideways swing, then rescale the control
//! polygon so the estimated curve length matches the blade height. The length
//! estimate is only approximate; the remaining error shrinks over successive
//! ticks instead of being solved exactly within one.

use crate::core::types::Vec3;
use crate::grass::blade::Blade;

/// Lowest fraction of the height the middle point may collapse to.
const MIN_MIDDLE_FRACTION: f32 = 0.05;

/// Push the tip up along `up` so it never sits below the root's ground plane.
pub fn ground_clamp(blade: &mut Blade) {
    let up = blade.up();
    let above = up.dot(blade.v2() - blade.v0());
    if above < 0.0 {
        blade.set_v2(blade.v2() - up * above);
    }
}

/// Length of the tip displacement projected onto the ground plane.
pub fn projected_lean(blade: &Blade) -> f32 {
    let up = blade.up();
    let lean = blade.v2() - blade.v0();
    (lean - up * lean.dot(up)).length()
}

/// Place `v1` above the root, lower the further the tip swings sideways.
///
/// Returns `false` and leaves the blade untouched when the height is zero.
pub fn rederive_middle(blade: &mut Blade) -> bool {
    let height = blade.height();
    if height <= 0.0 {
        return false;
    }
    let ratio = projected_lean(blade) / height;
    let fraction = (1.0 - ratio).max(MIN_MIDDLE_FRACTION * ratio.max(1.0));
    blade.set_v1(blade.v0() + blade.up() * (height * fraction));
    true
}

/// Cheap estimate of the quadratic Bézier arc length for degree 2:
/// `(2 * chord + polyline) / 3`.
pub fn estimated_length(v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    let chord = v0.distance(v2);
    let polyline = v0.distance(v1) + v1.distance(v2);
    (2.0 * chord + polyline) / 3.0
}

/// Rescale `v1` and `v2` about the root so the estimated length equals the
/// height.
///
/// Returns `false` and leaves the blade untouched when the estimate is zero.
pub fn correct_length(blade: &mut Blade) -> bool {
    let (v0, v1, v2) = (blade.v0(), blade.v1(), blade.v2());
    let length = estimated_length(v0, v1, v2);
    if length <= 0.0 || !length.is_finite() {
        return false;
    }
    let r = blade.height() / length;
    let v1_corrected = v0 + (v1 - v0) * r;
    let v2_corrected = v1_corrected + (v2 - v1) * r;
    blade.set_v1(v1_corrected);
    blade.set_v2(v2_corrected);
    true
}

/// Run the full single-pass stabilization.
pub fn stabilize(blade: &mut Blade) {
    ground_clamp(blade);
    if rederive_middle(blade) {
        correct_length(blade);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec4;

    fn displaced(tip: Vec3) -> Blade {
        let mut blade = Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 1.0, 0.1, 1.0);
        blade.set_v2(tip);
        blade
    }

    #[test]
    fn test_ground_clamp() {
        let mut blade = displaced(Vec3::new(0.5, -0.3, 0.2));
        ground_clamp(&mut blade);
        assert_eq!(blade.v2(), Vec3::new(0.5, 0.0, 0.2));

        let mut above = displaced(Vec3::new(0.5, 0.3, 0.2));
        ground_clamp(&mut above);
        assert_eq!(above.v2(), Vec3::new(0.5, 0.3, 0.2));
    }

    #[test]
    fn test_ground_clamp_with_short_packed_up() {
        let mut blade = Blade::from_packed(
            Vec4::ZERO,
            Vec4::new(0.0, 0.5, 0.0, 1.0),
            Vec4::new(0.4, -0.6, 0.0, 0.1),
            Vec4::new(0.0, 0.5, 0.0, 1.0),
        );
        ground_clamp(&mut blade);
        assert!(blade.up().dot(blade.v2() - blade.v0()) >= 0.0);
        assert_eq!(blade.v2(), Vec3::new(0.4, 0.0, 0.0));
    }

    #[test]
    fn test_ground_invariant_after_stabilize() {
        let tips = [
            Vec3::new(0.3, -2.0, 0.0),
            Vec3::new(-1.0, -0.01, 4.0),
            Vec3::new(0.0, -5.0, 0.0),
            Vec3::new(2.0, 0.5, -2.0),
        ];
        for tip in tips {
            let mut blade = displaced(tip);
            stabilize(&mut blade);
            assert!(blade.up().dot(blade.v2() - blade.v0()) >= 0.0, "tip {tip:?}");
        }
    }

    #[test]
    fn test_ground_invariant_on_slope() {
        let up = Vec3::new(0.3, 1.0, 0.0).normalize();
        let mut blade = Blade::at_rest(Vec3::new(1.0, 2.0, 3.0), up, 0.4, 1.0, 0.1, 1.0);
        blade.set_v2(Vec3::new(1.0, 1.0, 3.0));
        stabilize(&mut blade);
        assert!(up.dot(blade.v2() - blade.v0()) >= -1e-6);
    }

    #[test]
    fn test_middle_collapses_with_swing() {
        let mut upright = displaced(Vec3::new(0.0, 1.0, 0.0));
        rederive_middle(&mut upright);
        assert_eq!(upright.v1(), Vec3::new(0.0, 1.0, 0.0));

        let mut leaning = displaced(Vec3::new(0.6, 0.8, 0.0));
        rederive_middle(&mut leaning);
        assert!((leaning.v1() - Vec3::new(0.0, 0.4, 0.0)).length() < 1e-6);

        let mut flat = displaced(Vec3::new(3.0, 0.0, 0.0));
        rederive_middle(&mut flat);
        assert!((flat.v1() - Vec3::new(0.0, 0.15, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_length_correction_hits_estimate() {
        let mut blade = displaced(Vec3::new(1.5, 1.5, 0.0));
        rederive_middle(&mut blade);
        assert!(correct_length(&mut blade));
        let length = estimated_length(blade.v0(), blade.v1(), blade.v2());
        assert!((length - blade.height()).abs() < 1e-5);
        assert_eq!(blade.v0(), Vec3::ZERO);
    }

    #[test]
    fn test_rest_blade_is_exact() {
        let mut blade = Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 1.0, 0.1, 1.0);
        stabilize(&mut blade);
        assert_eq!(blade.v2(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(blade.v0().distance(blade.v2()), 1.0);
    }

    #[test]
    fn test_zero_height_is_skipped() {
        let mut blade = Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 0.0, 0.1, 1.0);
        blade.set_v2(Vec3::new(0.2, 0.1, 0.0));
        let before = blade;
        stabilize(&mut blade);
        assert_eq!(blade, before);
    }

    #[test]
    fn test_collapsed_blade_is_skipped() {
        let mut blade = Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 1.0, 0.1, 1.0);
        blade.set_v1(Vec3::ZERO);
        blade.set_v2(Vec3::ZERO);
        let before = blade;
        assert!(!correct_length(&mut blade));
        assert_eq!(blade, before);
    }
}
