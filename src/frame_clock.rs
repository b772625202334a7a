/// Frame timing driven by host timestamps.
///
/// The host's frame scheduler passes a monotonically increasing timestamp in
/// milliseconds to each frame callback. `FrameClock` turns those into elapsed
/// seconds for animation and counts frames to measure FPS once per second.
///
/// The clock starts uninitialized: the first [`tick`](Self::tick) has nothing
/// to diff against and reports zero elapsed time. Every later tick reports the
/// time since the previous one.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Timestamp of the previous tick, `None` until the first tick.
    previous: Option<f64>,
    /// Seconds elapsed between the last two ticks.
    elapsed: f32,
    /// Frames recorded in the current FPS window.
    frame_count: u32,
    /// Start of the current FPS window, `None` until the first recorded frame.
    last_reset: Option<f64>,
    /// Frame count of the last completed window.
    last_fps: Option<u32>,
}

/// Length of an FPS measurement window in milliseconds.
pub const FPS_WINDOW_MS: f64 = 1000.0;

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock to `now` (milliseconds) and returns the seconds
    /// elapsed since the previous tick.
    ///
    /// Returns `0.0` on the first tick, and if the timestamp went backwards.
    pub fn tick(&mut self, now: f64) -> f32 {
        let elapsed = match self.previous {
            Some(previous) => ((now - previous) / 1000.0).max(0.0) as f32,
            None => 0.0,
        };
        self.previous = Some(now);
        self.elapsed = elapsed;
        elapsed
    }

    /// Counts a presented frame.
    ///
    /// The first recorded frame opens the window. Once at least
    /// [`FPS_WINDOW_MS`] has passed since the window opened, returns the
    /// number of frames recorded in it (including this one), then starts a
    /// new window at `now` with the counter at zero.
    pub fn record_frame(&mut self, now: f64) -> Option<u32> {
        self.frame_count += 1;
        let start = *self.last_reset.get_or_insert(now);
        if now - start < FPS_WINDOW_MS {
            return None;
        }
        let fps = self.frame_count;
        self.frame_count = 0;
        self.last_reset = Some(now);
        self.last_fps = Some(fps);
        log::debug!("fps: {}", fps);
        Some(fps)
    }

    /// True once the first tick has happened.
    pub fn is_running(&self) -> bool {
        self.previous.is_some()
    }

    /// Seconds reported by the most recent tick.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Frames recorded in the current, unfinished window.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Measurement from the last completed window.
    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }

    /// Returns the clock to its uninitialized state.
    ///
    /// Useful when resuming after the callback chain was stopped, so the
    /// pause is not reported as one huge frame.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert!(!clock.is_running());
        assert_eq!(clock.tick(123_456.0), 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn tick_reports_seconds() {
        let mut clock = FrameClock::new();
        clock.tick(1000.0);
        let dt = clock.tick(1016.0);
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(clock.elapsed(), dt);
    }

    #[test]
    fn tick_never_goes_negative() {
        let mut clock = FrameClock::new();
        clock.tick(500.0);
        assert_eq!(clock.tick(400.0), 0.0);
    }

    #[test]
    fn fps_emitted_once_per_window() {
        let mut clock = FrameClock::new();
        let mut readings = Vec::new();
        let mut calls = 0;

        // 0, 16, 33, 50, ... roughly 60 Hz, until the window closes.
        let mut frame = 0u32;
        loop {
            let t = (frame as f64 * 1000.0 / 60.0).floor();
            calls += 1;
            if let Some(fps) = clock.record_frame(t) {
                readings.push((t, fps));
                break;
            }
            frame += 1;
        }

        assert_eq!(readings.len(), 1);
        let (t, fps) = readings[0];
        assert!(t >= 1000.0);
        assert_eq!(fps, calls);
        assert_eq!(clock.frame_count(), 0);
        assert_eq!(clock.last_fps(), Some(calls));

        // The next window starts fresh.
        assert_eq!(clock.record_frame(t + 16.0), None);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn window_opens_at_first_recorded_frame() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.record_frame(16_000.0), None);

        let mut t = 16_000.0;
        let mut reading = None;
        while reading.is_none() {
            t += 20.0;
            reading = clock.record_frame(t);
        }

        assert_eq!(t, 17_000.0);
        assert_eq!(reading, Some(51));
    }

    #[test]
    fn reset_returns_to_uninitialized() {
        let mut clock = FrameClock::new();
        clock.tick(10.0);
        clock.record_frame(10.0);
        clock.reset();
        assert!(!clock.is_running());
        assert_eq!(clock.frame_count(), 0);
        assert_eq!(clock.tick(5000.0), 0.0);
    }
}
