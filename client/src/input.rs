//! Keyboard sampling with edge detection, folded into the controls snapshot

use macroquad::prelude::*;
use shared::{Button, Controls};

/// Keys held this frame, one flag per button
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub enter: bool,
}

impl KeyState {
    /// Samples the keyboard (arrows or WASD, Enter or Space)
    pub fn sample() -> Self {
        Self {
            left: is_key_down(KeyCode::Left) || is_key_down(KeyCode::A),
            right: is_key_down(KeyCode::Right) || is_key_down(KeyCode::D),
            up: is_key_down(KeyCode::Up) || is_key_down(KeyCode::W),
            down: is_key_down(KeyCode::Down) || is_key_down(KeyCode::S),
            enter: is_key_down(KeyCode::Enter) || is_key_down(KeyCode::Space),
        }
    }
}

/// Turns per-frame key samples into press and release events
pub struct InputManager {
    previous: KeyState,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            previous: KeyState::default(),
        }
    }

    /// Samples the keyboard and applies the edges to `controls`
    pub fn update(&mut self, controls: &mut Controls) {
        self.apply(KeyState::sample(), controls);
    }

    /// Counts a press only on the frame a key goes down, so holding a key
    /// adds one to `downs` rather than one per frame.
    pub fn apply(&mut self, keys: KeyState, controls: &mut Controls) {
        let previous = self.previous;
        apply_edge(&mut controls.left, previous.left, keys.left);
        apply_edge(&mut controls.right, previous.right, keys.right);
        apply_edge(&mut controls.up, previous.up, keys.up);
        apply_edge(&mut controls.down, previous.down, keys.down);
        apply_edge(&mut controls.enter, previous.enter, keys.enter);
        self.previous = keys;
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_edge(button: &mut Button, was_down: bool, is_down: bool) {
    match (was_down, is_down) {
        (false, true) => button.press(),
        (true, false) => button.release(),
        _ => {}
    }
}
