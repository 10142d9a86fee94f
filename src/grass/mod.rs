//! Grass blade simulation and visibility kernel.
//!
//! Each blade is a quadratic Bézier curve. Once per tick the kernel advances
//! every blade under gravity, recovery and wind, stabilizes its shape, and
//! compacts the visible ones into a second buffer whose length becomes the
//! vertex count of an indirect draw.

pub mod blade;
pub mod compact;
pub mod config;
pub mod cull;
pub mod dispatch;
pub mod forces;
pub mod stabilize;

pub use blade::{Blade, DrawArgs};
pub use config::{CullConfig, GrassConfig, WORKGROUP_SIZE};
pub use cull::{CullReason, Verdict};
pub use dispatch::DispatchStats;

use std::sync::atomic::AtomicU32;
use std::time::Instant;

use bytemuck::Zeroable;

use crate::core::camera::CameraMatrices;
use crate::core::error::Error;
use crate::core::time::SimTime;
use crate::core::types::Result;

/// Owns the source and compacted blade buffers plus the draw arguments.
pub struct GrassSystem {
    config: GrassConfig,
    blades: Vec<Blade>,
    compacted: Vec<Blade>,
    counter: AtomicU32,
    draw_args: DrawArgs,
    last_stats: DispatchStats,
}

impl GrassSystem {
    /// Create a system with a compacted buffer sized to the population.
    pub fn new(blades: Vec<Blade>, config: GrassConfig) -> Result<Self> {
        let compacted = vec![Blade::zeroed(); blades.len()];
        Self::with_output(blades, config, compacted)
    }

    /// Create a system around a caller-allocated compacted buffer.
    ///
    /// Fails if the buffer cannot hold every blade.
    pub fn with_output(
        blades: Vec<Blade>,
        config: GrassConfig,
        compacted: Vec<Blade>,
    ) -> Result<Self> {
        config.validate()?;
        if compacted.len() < blades.len() {
            return Err(Error::BufferSize {
                expected: blades.len(),
                actual: compacted.len(),
            });
        }
        log::info!(
            "Grass system: {} blades in {} batches of {}",
            blades.len(),
            blades.len().div_ceil(config.workgroup_size),
            config.workgroup_size
        );
        Ok(Self {
            config,
            blades,
            compacted,
            counter: AtomicU32::new(0),
            draw_args: DrawArgs::default(),
            last_stats: DispatchStats::default(),
        })
    }

    pub fn config(&self) -> &GrassConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect on the next dispatch.
    pub fn set_config(&mut self, config: GrassConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Number of blades in the source buffer.
    pub fn len(&self) -> usize {
        self.blades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blades.is_empty()
    }

    /// Source buffer, updated in place by every dispatch.
    pub fn blades(&self) -> &[Blade] {
        &self.blades
    }

    /// Mutable source buffer for authoring between dispatches.
    pub fn blades_mut(&mut self) -> &mut [Blade] {
        &mut self.blades
    }

    /// The valid prefix of the compacted buffer.
    pub fn visible_blades(&self) -> &[Blade] {
        &self.compacted[..self.draw_args.vertex_count as usize]
    }

    /// Whole compacted buffer. Entries past the draw count are stale.
    pub fn compacted_buffer(&self) -> &[Blade] {
        &self.compacted
    }

    /// Draw arguments produced by the last dispatch.
    pub fn draw_args(&self) -> DrawArgs {
        self.draw_args
    }

    /// Statistics from the last dispatch.
    pub fn last_stats(&self) -> DispatchStats {
        self.last_stats
    }

    /// Raw bytes of the source buffer for upload.
    pub fn blade_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.blades)
    }

    /// Raw bytes of the draw arguments for upload.
    pub fn draw_args_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.draw_args)
    }

    /// Run one tick: simulate, cull and compact every blade.
    ///
    /// Holding `&mut self` keeps the previous output from being read while
    /// the next dispatch writes it.
    pub fn dispatch(&mut self, camera: &CameraMatrices, time: SimTime) -> DispatchStats {
        let start = Instant::now();
        let stats = dispatch::dispatch(
            &mut self.blades,
            &mut self.compacted,
            &mut self.counter,
            camera,
            time,
            &self.config,
        );
        self.draw_args = DrawArgs::with_count(*self.counter.get_mut());
        self.last_stats = stats;

        log::debug!(
            "Grass dispatch: {}/{} visible (distance {}, orientation {}, frustum {}) in {:.2}ms",
            stats.survivors,
            stats.simulated,
            stats.distance_culled,
            stats.orientation_culled,
            stats.frustum_culled,
            start.elapsed().as_secs_f64() * 1000.0
        );
        stats
    }
}
