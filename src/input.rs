use std::collections::HashSet;

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Read-only view of which keys are currently held.
///
/// Navigation and animation code takes this instead of [`Input`] so it can be
/// driven from a snapshot, a plain set, or a fixed key list in tests.
pub trait HeldKeys {
    fn is_held(&self, key: KeyCode) -> bool;

    /// `+1.0` if only `positive` is held, `-1.0` if only `negative` is held,
    /// `0.0` otherwise.
    fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        match (self.is_held(positive), self.is_held(negative)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }
}

/// Tracks keyboard state.
///
/// This is the single writer of key state: the host feeds it window events
/// (or explicit [`press`](Self::press)/[`release`](Self::release) calls from a
/// non-winit host), and once per frame hands a [`KeySnapshot`] to the update
/// step.
#[derive(Clone, Debug, Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a window event and update key state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                match event.state {
                    ElementState::Pressed => self.press(key),
                    ElementState::Released => self.release(key),
                }
            }
        }
    }

    pub fn press(&mut self, key: KeyCode) {
        self.keys_down.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_down.remove(&key);
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Immutable copy of the held keys.
    pub fn snapshot(&self) -> KeySnapshot {
        KeySnapshot {
            held: self.keys_down.clone(),
        }
    }
}

impl HeldKeys for Input {
    fn is_held(&self, key: KeyCode) -> bool {
        self.key_down(key)
    }
}

/// Keys held at the moment a frame started.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    held: HashSet<KeyCode>,
}

impl KeySnapshot {
    /// Snapshot with no keys held.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyCode> {
        self.held.iter()
    }
}

impl FromIterator<KeyCode> for KeySnapshot {
    fn from_iter<I: IntoIterator<Item = KeyCode>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

impl HeldKeys for KeySnapshot {
    fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }
}

impl HeldKeys for HashSet<KeyCode> {
    fn is_held(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

impl HeldKeys for [KeyCode] {
    fn is_held(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

impl<const N: usize> HeldKeys for [KeyCode; N] {
    fn is_held(&self, key: KeyCode) -> bool {
        self.contains(&key)
    }
}

/// Provides the key state for each frame.
pub trait InputSource {
    /// Keys held at the start of the frame with the given timestamp.
    fn keys_at(&mut self, timestamp_ms: f64) -> KeySnapshot;
}

impl InputSource for Input {
    fn keys_at(&mut self, _timestamp_ms: f64) -> KeySnapshot {
        self.snapshot()
    }
}

/// Replays held keys over time windows. Used by headless hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    /// `(start_ms, end_ms, key)`: the key is held for `start <= t < end`.
    holds: Vec<(f64, f64, KeyCode)>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, key: KeyCode, start_ms: f64, end_ms: f64) -> Self {
        self.holds.push((start_ms, end_ms, key));
        self
    }
}

impl InputSource for ScriptedInput {
    fn keys_at(&mut self, timestamp_ms: f64) -> KeySnapshot {
        self.holds
            .iter()
            .filter(|(start, end, _)| *start <= timestamp_ms && timestamp_ms < *end)
            .map(|(_, _, key)| *key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_track_held_keys() {
        let mut input = Input::new();
        input.press(KeyCode::KeyA);
        input.press(KeyCode::KeyA);
        assert!(input.key_down(KeyCode::KeyA));
        assert_eq!(input.keys_at(0.0).len(), 1);

        input.release(KeyCode::KeyA);
        assert!(!input.key_down(KeyCode::KeyA));
        assert!(input.keys_at(16.0).is_empty());
    }

    #[test]
    fn snapshot_is_detached_from_input() {
        let mut input = Input::new();
        input.press(KeyCode::KeyW);
        let snapshot = input.snapshot();

        input.release(KeyCode::KeyW);
        input.press(KeyCode::KeyS);

        assert!(snapshot.is_held(KeyCode::KeyW));
        assert!(!snapshot.is_held(KeyCode::KeyS));
    }

    #[test]
    fn axis_cancels_opposing_keys() {
        let keys = [KeyCode::KeyA, KeyCode::KeyD];
        assert_eq!(keys.axis(KeyCode::KeyD, KeyCode::KeyA), 0.0);

        let keys = [KeyCode::KeyA];
        assert_eq!(keys.axis(KeyCode::KeyD, KeyCode::KeyA), -1.0);
    }

    #[test]
    fn scripted_input_holds_within_window() {
        let mut script = ScriptedInput::new().hold(KeyCode::KeyF, 100.0, 200.0);
        assert!(script.keys_at(50.0).is_empty());
        assert!(script.keys_at(100.0).is_held(KeyCode::KeyF));
        assert!(!script.keys_at(200.0).is_held(KeyCode::KeyF));
    }
}
