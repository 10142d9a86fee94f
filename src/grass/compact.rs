//! Lock-free stream compaction of surviving blades.
//!
//! Every surviving blade performs exactly one `fetch_add` on the shared draw
//! counter. The returned pre-increment value is that blade's private slot in
//! the output buffer, so concurrent writers never alias. Slot order follows
//! completion order and is unspecified.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::grass::blade::Blade;

/// Append-only view over the compacted output buffer.
///
/// Creating one resets the counter. Because construction needs exclusive
/// access to the counter, no worker can observe it before the reset; handing
/// the target to the worker pool afterwards publishes the zero to all of them.
pub struct CompactionTarget<'a> {
    slots: *mut Blade,
    capacity: usize,
    counter: &'a AtomicU32,
    _output: PhantomData<&'a mut [Blade]>,
}

// SAFETY: writes go only to slots uniquely reserved through the atomic
// counter, and the output slice stays mutably borrowed for 'a.
unsafe impl Send for CompactionTarget<'_> {}
unsafe impl Sync for CompactionTarget<'_> {}

impl<'a> CompactionTarget<'a> {
    /// Reset `counter` to zero and wrap `output` for concurrent appends.
    pub fn new(output: &'a mut [Blade], counter: &'a mut AtomicU32) -> Self {
        *counter.get_mut() = 0;
        Self {
            slots: output.as_mut_ptr(),
            capacity: output.len(),
            counter,
            _output: PhantomData,
        }
    }

    /// Number of slots in the output buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reserve a slot and store `blade` in it.
    ///
    /// Returns the slot index, or `None` if the buffer is already full (the
    /// blade is dropped but the counter still advanced).
    pub fn append(&self, blade: Blade) -> Option<usize> {
        let slot = self.counter.fetch_add(1, Ordering::Relaxed) as usize;
        if slot >= self.capacity {
            return None;
        }
        // SAFETY: `slot < capacity` and no other caller received the same
        // value from `fetch_add`.
        unsafe { self.slots.add(slot).write(blade) };
        Some(slot)
    }

    /// Clamp the counter to capacity and return it with the number of
    /// dropped appends.
    pub fn finish(self) -> (u32, usize) {
        let raw = self.counter.load(Ordering::Acquire);
        let count = (raw as usize).min(self.capacity);
        self.counter.store(count as u32, Ordering::Release);
        (count as u32, raw as usize - count)
    }
}
