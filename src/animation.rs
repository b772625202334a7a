//! The per-frame callback loop.
//!
//! A host scheduler hands out one timestamp per display refresh. For each one
//! [`AnimationLoop`] ticks the [`FrameClock`], snapshots the held keys, runs
//! the frame callback (update, then draw), and records the frame for the FPS
//! counter. The loop ends when the scheduler runs dry, when a [`StopToken`]
//! is triggered, or when the callback fails.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::frame_clock::FrameClock;
use crate::input::{InputSource, KeySnapshot};

/// Source of frame timestamps, in milliseconds.
///
/// Timestamps must not decrease. `None` means the host has torn down and no
/// more frames will come.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Fixed-interval timestamps for a bounded number of frames.
#[derive(Clone, Debug)]
pub struct ScriptedScheduler {
    next: f64,
    interval: f64,
    remaining: usize,
}

impl ScriptedScheduler {
    /// `frames` timestamps, `interval_ms` apart, starting at zero.
    pub fn new(frames: usize, interval_ms: f64) -> Self {
        Self {
            next: 0.0,
            interval: interval_ms,
            remaining: frames,
        }
    }

    /// Frames at the given rate for `seconds`.
    pub fn at_rate(rate: f64, seconds: f64) -> Self {
        Self::new((rate * seconds).round() as usize, 1000.0 / rate)
    }

    pub fn starting_at(mut self, timestamp_ms: f64) -> Self {
        self.next = timestamp_ms;
        self
    }
}

impl FrameScheduler for ScriptedScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let now = self.next;
        self.next += self.interval;
        Some(now)
    }
}

/// Replays an explicit list of timestamps.
#[derive(Clone, Debug)]
pub struct Timestamps<I> {
    iter: I,
}

impl<I: Iterator<Item = f64>> Timestamps<I> {
    pub fn new(timestamps: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: timestamps.into_iter(),
        }
    }
}

impl<I: Iterator<Item = f64>> FrameScheduler for Timestamps<I> {
    fn next_frame(&mut self) -> Option<f64> {
        self.iter.next()
    }
}

/// Cancellation flag for a running loop.
///
/// Clones share the flag. The loop checks it before starting each frame, so
/// the frame in progress when [`stop`](Self::stop) is called still completes.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Rc<Cell<bool>>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// An angle in degrees advancing at a constant speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimatedAngle {
    /// Current angle in `[0, 360)`.
    pub degrees: f32,
    /// Degrees per second.
    pub speed: f32,
}

impl AnimatedAngle {
    pub fn new(degrees: f32, speed: f32) -> Self {
        Self {
            degrees: degrees.rem_euclid(360.0),
            speed,
        }
    }

    /// Advances by `speed * elapsed`.
    pub fn advance(&mut self, elapsed: f32) -> f32 {
        self.nudge(self.speed * elapsed)
    }

    /// Adds `delta` degrees.
    pub fn nudge(&mut self, delta: f32) -> f32 {
        self.degrees = (self.degrees + delta).rem_euclid(360.0);
        self.degrees
    }
}

/// Everything the callback needs to know about the current frame.
#[derive(Clone, Debug)]
pub struct FrameInfo {
    /// Zero-based frame number.
    pub index: u64,
    /// Host timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Seconds since the previous frame, zero on the first.
    pub dt: f32,
    /// Seconds since the first frame.
    pub time: f32,
    /// Keys held at the start of the frame.
    pub keys: KeySnapshot,
    /// Most recent FPS measurement, if a full second has passed.
    pub fps: Option<u32>,
}

/// Outcome of a finished loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub last_fps: Option<u32>,
    /// True if the loop ended through its [`StopToken`].
    pub stopped: bool,
}

/// Drives the frame callback.
#[derive(Debug, Default)]
pub struct AnimationLoop {
    clock: FrameClock,
    stop: StopToken,
    frames: u64,
    first: Option<f64>,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `stop` as the cancellation flag.
    pub fn with_stop_token(stop: StopToken) -> Self {
        Self {
            stop,
            ..Self::default()
        }
    }

    /// Token that stops this loop.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Runs until the scheduler is exhausted, the stop token fires, or
    /// `frame` fails. A failing frame ends the loop and its error is
    /// returned.
    pub fn run<S, I, F, E>(
        &mut self,
        scheduler: &mut S,
        input: &mut I,
        mut frame: F,
    ) -> Result<RunSummary, E>
    where
        S: FrameScheduler + ?Sized,
        I: InputSource + ?Sized,
        F: FnMut(&FrameInfo) -> Result<(), E>,
        E: fmt::Display,
    {
        log::info!("animation loop started");
        let mut stopped = false;

        loop {
            if self.stop.is_stopped() {
                stopped = true;
                break;
            }
            let Some(now) = scheduler.next_frame() else {
                break;
            };

            let dt = self.clock.tick(now);
            let first = *self.first.get_or_insert(now);
            let info = FrameInfo {
                index: self.frames,
                timestamp_ms: now,
                dt,
                time: ((now - first) / 1000.0) as f32,
                keys: input.keys_at(now),
                fps: self.clock.last_fps(),
            };

            if let Err(e) = frame(&info) {
                log::error!("frame {} aborted: {}", info.index, e);
                return Err(e);
            }

            self.clock.record_frame(now);
            self.frames += 1;
        }

        let summary = RunSummary {
            frames: self.frames,
            last_fps: self.clock.last_fps(),
            stopped,
        };
        log::info!(
            "animation loop finished after {} frames (stopped: {})",
            summary.frames,
            summary.stopped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{HeldKeys, ScriptedInput};
    use winit::keyboard::KeyCode;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut scheduler = Timestamps::new(vec![500.0, 516.0, 532.0]);
        let mut input = ScriptedInput::new();
        let mut dts = Vec::new();

        let summary = AnimationLoop::new()
            .run(&mut scheduler, &mut input, |info| {
                dts.push(info.dt);
                Ok::<_, String>(())
            })
            .unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(dts[0], 0.0);
        assert!((dts[1] - 0.016).abs() < 1e-6);
    }

    #[test]
    fn speed_times_elapsed_is_rate_independent() {
        let run = |rate: f64| {
            let mut scheduler = ScriptedScheduler::at_rate(rate, 2.0);
            let mut input = ScriptedInput::new();
            let mut angle = AnimatedAngle::new(0.0, 30.0);
            AnimationLoop::new()
                .run(&mut scheduler, &mut input, |info| {
                    angle.advance(info.dt);
                    Ok::<_, String>(())
                })
                .unwrap();
            angle.degrees
        };

        // 2 seconds of timestamps: the last frame lands one interval short.
        assert!((run(10.0) - 30.0 * 1.9).abs() < 1e-2);
        assert!((run(100.0) - 30.0 * 1.99).abs() < 1e-2);
    }

    #[test]
    fn stop_token_ends_loop_after_current_frame() {
        let mut scheduler = ScriptedScheduler::new(100, 16.0);
        let mut input = ScriptedInput::new();
        let mut animation = AnimationLoop::new();
        let stop = animation.stop_token();

        let summary = animation
            .run(&mut scheduler, &mut input, |info| {
                if info.index == 4 {
                    stop.stop();
                }
                Ok::<_, String>(())
            })
            .unwrap();

        assert_eq!(summary.frames, 5);
        assert!(summary.stopped);
    }

    #[test]
    fn failing_frame_aborts_loop() {
        let mut scheduler = ScriptedScheduler::new(10, 16.0);
        let mut input = ScriptedInput::new();
        let mut seen = 0;

        let result = AnimationLoop::new().run(&mut scheduler, &mut input, |info| {
            seen += 1;
            if info.index == 2 {
                Err("stack underflow".to_string())
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("stack underflow".to_string()));
        assert_eq!(seen, 3);
    }

    #[test]
    fn frames_see_held_keys_and_fps() {
        let mut scheduler = ScriptedScheduler::at_rate(50.0, 1.5);
        let mut input = ScriptedInput::new().hold(KeyCode::KeyF, 0.0, 100.0);
        let mut held = 0;
        let mut measured = None;

        let summary = AnimationLoop::new()
            .run(&mut scheduler, &mut input, |info| {
                if info.keys.is_held(KeyCode::KeyF) {
                    held += 1;
                }
                measured = measured.or(info.fps);
                Ok::<_, String>(())
            })
            .unwrap();

        // Frames at 0, 20, 40, 60, 80 ms.
        assert_eq!(held, 5);
        // Frames at 0..=1000 ms inclusive close the first window.
        assert_eq!(summary.last_fps, Some(51));
        assert_eq!(measured, Some(51));
    }

    #[test]
    fn animated_angle_wraps() {
        let mut angle = AnimatedAngle::new(350.0, 20.0);
        assert!((angle.advance(1.0) - 10.0).abs() < 1e-4);
        assert!((angle.nudge(-20.0) - 350.0).abs() < 1e-4);
    }
}
