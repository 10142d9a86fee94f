//! One simulation tick over the whole blade population.
//!
//! The source buffer is split into lockstep batches of `workgroup_size`
//! blades and the batches run on the rayon pool in any order. Each blade is
//! owned by exactly one worker for the whole tick:
//!
//! 1. integrate forces, 2. stabilize, 3. write back in place,
//! 4. classify visibility, 5. append survivors to the compacted buffer.
//!
//! The draw counter is reset before the pool starts and is the only value
//! mutated by more than one worker.

use std::sync::atomic::AtomicU32;

use rayon::prelude::*;

use crate::core::camera::CameraMatrices;
use crate::core::time::SimTime;
use crate::grass::blade::Blade;
use crate::grass::compact::CompactionTarget;
use crate::grass::config::GrassConfig;
use crate::grass::cull::{self, CullReason, Verdict, ViewContext};
use crate::grass::{forces, stabilize};

/// Per-dispatch counts, reduced from per-batch tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Blades simulated (the whole population).
    pub simulated: usize,
    /// Blades written to the compacted buffer.
    pub survivors: usize,
    pub distance_culled: usize,
    pub orientation_culled: usize,
    pub frustum_culled: usize,
    /// Visible blades dropped because the output buffer was full.
    pub overflowed: usize,
}

impl DispatchStats {
    fn record(&mut self, reason: CullReason) {
        match reason {
            CullReason::Distance => self.distance_culled += 1,
            CullReason::Orientation => self.orientation_culled += 1,
            CullReason::Frustum => self.frustum_culled += 1,
        }
    }

    fn merge(self, other: Self) -> Self {
        Self {
            simulated: self.simulated + other.simulated,
            survivors: self.survivors + other.survivors,
            distance_culled: self.distance_culled + other.distance_culled,
            orientation_culled: self.orientation_culled + other.orientation_culled,
            frustum_culled: self.frustum_culled + other.frustum_culled,
            overflowed: self.overflowed + other.overflowed,
        }
    }

    /// Total blades rejected by any visibility test.
    pub fn culled(&self) -> usize {
        self.distance_culled + self.orientation_culled + self.frustum_culled
    }
}

/// Advance one blade by a tick: force integration then stabilization.
pub fn simulate_blade(blade: &mut Blade, time: SimTime, config: &GrassConfig) {
    forces::integrate(blade, time, config);
    stabilize::stabilize(blade);
}

/// Run a full dispatch.
///
/// Updates `blades` in place, fills the prefix of `output` with the visible
/// blades and leaves the number of valid entries in `counter`, clamped to
/// the capacity of `output`.
pub fn dispatch(
    blades: &mut [Blade],
    output: &mut [Blade],
    counter: &mut AtomicU32,
    camera: &CameraMatrices,
    time: SimTime,
    config: &GrassConfig,
) -> DispatchStats {
    let group_size = config.workgroup_size.max(1);
    let view = ViewContext::new(camera);
    let target = CompactionTarget::new(output, counter);

    let mut stats = blades
        .par_chunks_mut(group_size)
        .enumerate()
        .map(|(group, batch)| {
            let mut tally = DispatchStats::default();
            for (lane, blade) in batch.iter_mut().enumerate() {
                let id = group * group_size + lane;
                simulate_blade(blade, time, config);
                tally.simulated += 1;

                match cull::classify(blade, id, &view, &config.cull) {
                    Verdict::Visible => match target.append(*blade) {
                        Some(_) => tally.survivors += 1,
                        None => tally.overflowed += 1,
                    },
                    Verdict::Culled(reason) => tally.record(reason),
                }
            }
            tally
        })
        .reduce(DispatchStats::default, DispatchStats::merge);

    let (count, dropped) = target.finish();
    debug_assert_eq!(count as usize, stats.survivors);
    if dropped > 0 {
        log::warn!(
            "Compacted buffer full: dropped {} visible blades (capacity {})",
            dropped,
            count
        );
    }
    stats.overflowed = dropped;
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use crate::core::types::{Mat4, Vec3};
    use crate::grass::config::CullConfig;
    use bytemuck::Zeroable;
    use std::sync::atomic::Ordering;

    fn calm_config() -> GrassConfig {
        GrassConfig {
            gravity: 0.0,
            wind_magnitude: 0.0,
            cull: CullConfig::disabled(),
            ..GrassConfig::default()
        }
    }

    fn field(count: usize) -> Vec<Blade> {
        (0..count)
            .map(|i| {
                let root = Vec3::new((i % 20) as f32 * 0.5, 0.0, (i / 20) as f32 * 0.5);
                let mut blade = Blade::at_rest(root, Vec3::Y, i as f32 * 0.37, 1.0, 0.05, 0.6);
                blade.set_v2(root + Vec3::new(0.3, 0.9, -0.1));
                blade
            })
            .collect()
    }

    fn identity_camera() -> CameraMatrices {
        CameraMatrices::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    fn run(
        blades: &mut [Blade],
        time: SimTime,
        config: &GrassConfig,
    ) -> (Vec<Blade>, u32, DispatchStats) {
        let mut output = vec![Blade::zeroed(); blades.len()];
        let mut counter = AtomicU32::new(0);
        let camera = Camera::look_at(Vec3::new(5.0, 3.0, -10.0), Vec3::new(5.0, 0.0, 5.0), Vec3::Y);
        let stats = dispatch(blades, &mut output, &mut counter, &camera.matrices(), time, config);
        (output, counter.load(Ordering::Relaxed), stats)
    }

    #[test]
    fn test_all_tests_disabled_keeps_every_blade() {
        let mut blades = field(320);
        let (output, count, stats) = run(&mut blades, SimTime::new(0.016, 1.0), &calm_config());

        assert_eq!(count, 320);
        assert_eq!(stats.survivors, 320);
        assert_eq!(stats.simulated, 320);
        assert_eq!(stats.culled(), 0);

        // Compacted buffer is a permutation of the updated source buffer.
        let key = |b: &Blade| (b.v0().x.to_bits(), b.v0().z.to_bits());
        let mut src: Vec<_> = blades.iter().map(key).collect();
        let mut dst: Vec<_> = output.iter().map(key).collect();
        src.sort_unstable();
        dst.sort_unstable();
        assert_eq!(src, dst);
        for blade in &output {
            assert!(blades.contains(blade));
        }
    }

    #[test]
    fn test_zero_delta_is_repeatable() {
        let config = GrassConfig::default();
        let mut first = field(100);
        let mut second = field(100);
        run(&mut first, SimTime::new(0.0, 4.0), &config);
        run(&mut second, SimTime::new(0.0, 4.0), &config);
        assert_eq!(
            bytemuck::cast_slice::<Blade, u8>(&first),
            bytemuck::cast_slice::<Blade, u8>(&second)
        );
    }

    #[test]
    fn test_counter_reset_between_dispatches() {
        let mut blades = field(64);
        let mut output = vec![Blade::zeroed(); 64];
        let mut counter = AtomicU32::new(0);
        let config = calm_config();
        for tick in 0..3 {
            dispatch(
                &mut blades,
                &mut output,
                &mut counter,
                &identity_camera(),
                SimTime::new(0.1, tick as f32 * 0.1),
                &config,
            );
            assert_eq!(counter.load(Ordering::Relaxed), 64);
        }
    }

    #[test]
    fn test_roots_never_move() {
        let mut blades = field(96);
        let roots: Vec<Vec3> = blades.iter().map(Blade::v0).collect();
        let config = GrassConfig::default();
        for tick in 0..20 {
            run(&mut blades, SimTime::new(0.05, tick as f32 * 0.05), &config);
        }
        for (blade, root) in blades.iter().zip(roots) {
            assert_eq!(blade.v0(), root);
            assert!(blade.up().dot(blade.v2() - blade.v0()) >= 0.0);
        }
    }

    #[test]
    fn test_length_converges_without_external_forces() {
        let mut blades = vec![Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 1.0, 0.1, 1.0)];
        blades[0].set_v2(Vec3::new(0.6, 0.8, 0.0));
        let config = calm_config();

        let error = |b: &Blade| (b.polyline_length() - b.height()).abs() / b.height();
        run(&mut blades, SimTime::new(0.2, 0.2), &config);
        let initial = error(&blades[0]);
        for tick in 1..50 {
            run(&mut blades, SimTime::new(0.2, 0.2 * (tick + 1) as f32), &config);
        }
        let last = error(&blades[0]);
        assert!(last < 0.01, "relative length error {last}");
        assert!(last <= initial);
    }

    #[test]
    fn test_single_rest_blade_scenario() {
        let mut blades = vec![Blade::at_rest(Vec3::ZERO, Vec3::Y, 0.0, 1.0, 0.1, 0.5)];
        let (_, count, _) = run(&mut blades, SimTime::new(1.0, 1.0), &calm_config());
        assert_eq!(count, 1);
        assert_eq!(blades[0].v2(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(blades[0].v0().distance(blades[0].v2()), 1.0);
    }

    #[test]
    fn test_stats_attribute_culls() {
        let mut blades = field(200);
        let mut config = calm_config();
        config.cull.distance = true;
        config.cull.max_distance = 0.001;
        let (_, count, stats) = run(&mut blades, SimTime::new(0.0, 0.0), &config);
        assert_eq!(count, 0);
        assert_eq!(stats.distance_culled, 200);
        assert_eq!(stats.survivors + stats.culled(), stats.simulated);
    }

    #[test]
    fn test_small_output_overflows_safely() {
        let mut blades = field(50);
        let mut output = vec![Blade::zeroed(); 10];
        let mut counter = AtomicU32::new(0);
        let stats = dispatch(
            &mut blades,
            &mut output,
            &mut counter,
            &identity_camera(),
            SimTime::new(0.0, 0.0),
            &calm_config(),
        );
        assert_eq!(stats.survivors, 10);
        assert_eq!(stats.overflowed, 40);
        assert_eq!(counter.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_batch_size_does_not_change_results() {
        let mut config = GrassConfig::default();
        config.cull = CullConfig::disabled();
        let mut a = field(101);
        let mut b = field(101);
        run(&mut a, SimTime::new(0.02, 3.0), &config);
        config.workgroup_size = 7;
        run(&mut b, SimTime::new(0.02, 3.0), &config);
        assert_eq!(a, b);
    }
}
