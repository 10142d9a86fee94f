//! Simulation time input

/// Time values for one dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimTime {
    /// Seconds since the previous tick (never negative).
    pub delta: f32,
    /// Monotonic seconds since the simulation started.
    pub total: f32,
}

impl SimTime {
    /// Create a time input. Negative or NaN deltas are clamped to zero.
    pub fn new(delta: f32, total: f32) -> Self {
        Self {
            delta: delta.max(0.0),
            total,
        }
    }
}

/// Clock advancing by a fixed step per tick.
#[derive(Clone, Debug)]
pub struct FixedStepClock {
    step: f32,
    total: f64,
    tick_count: u64,
}

impl FixedStepClock {
    /// Create a clock with the given step in seconds.
    pub fn new(step: f32) -> Self {
        Self {
            step: step.max(0.0),
            total: 0.0,
            tick_count: 0,
        }
    }

    /// Advance one step and return the time for that tick.
    pub fn tick(&mut self) -> SimTime {
        // Accumulate in f64 so long runs don't drift.
        self.total += self.step as f64;
        self.tick_count += 1;
        SimTime::new(self.step, self.total as f32)
    }

    /// Number of ticks taken so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Total elapsed simulated seconds.
    pub fn total_secs(&self) -> f64 {
        self.total
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}
