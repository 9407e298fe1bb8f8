//! Time management utilities
//!
//! Everything in the pooling core runs on simulated time: callers feed the
//! frame delta in, nothing here reads the wall clock.

/// Frame clock advanced explicitly by the update loop
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    delta_time: f32,
    total_time: f64,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame; negative or non-finite deltas count as zero
    pub fn advance(&mut self, delta_time: f32) -> f32 {
        let delta = if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 };
        self.delta_time = delta;
        self.total_time += f64::from(delta);
        self.frame_count += 1;
        delta
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total simulated time in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Return to time zero (session end)
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
