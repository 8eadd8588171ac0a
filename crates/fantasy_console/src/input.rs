use std::collections::HashSet;

use fantasy_common::Key;

/// Keyboard state as seen by one frame of a cartridge.
///
/// `pressed` holds keys that went down since the last [`InputState::end_frame`];
/// `held` holds every key currently down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_key_event(&mut self, key: Key, is_down: bool) {
        if key == Key::None {
            return;
        }
        if is_down {
            if self.held.insert(key) {
                self.pressed.insert(key);
            }
        } else {
            self.held.remove(&key);
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Forget this frame's presses; held keys stay down.
    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }
}
