//! Time management utilities

use std::time::Instant;

/// Per-frame clock advanced once at the start of every frame
///
/// Tracks the delta since the previous frame, the total elapsed time, and the
/// frame counter. A fixed timestep can be installed for deterministic
/// stepping (headless runs, tests); otherwise wall-clock time is used.
pub struct FrameClock {
    last_frame: Instant,
    delta: f32,
    elapsed: f32,
    frame: u64,
    fixed_delta: Option<f32>,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    /// Create a new wall-clock driven frame clock
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: 0.0,
            elapsed: 0.0,
            frame: 0,
            fixed_delta: None,
        }
    }

    /// Create a clock that advances by a fixed amount every frame
    pub fn fixed(delta: f32) -> Self {
        Self {
            fixed_delta: Some(delta),
            ..Self::new()
        }
    }

    /// Advance the clock by one frame (called once per frame, at begin)
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = self
            .fixed_delta
            .unwrap_or_else(|| now.duration_since(self.last_frame).as_secs_f32());
        self.elapsed += self.delta;
        self.last_frame = now;
        self.frame += 1;
    }

    /// Time since the previous frame in seconds
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Total elapsed time in seconds
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of frames started so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_clock_is_deterministic() {
        let mut clock = FrameClock::fixed(1.0 / 60.0);

        for _ in 0..60 {
            clock.tick();
        }

        assert_eq!(clock.frame(), 60);
        assert_relative_eq!(clock.elapsed(), 1.0, epsilon = 1e-4);
        assert_relative_eq!(clock.delta(), 1.0 / 60.0);
    }

    #[test]
    fn test_clock_starts_at_frame_zero() {
        let clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);
        assert_relative_eq!(clock.elapsed(), 0.0);
    }
}
