use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{Key, KeyCode, PhysicalKey};

use crate::animation::FanCommand;

/// What a key press asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
    Fan(FanCommand),
    Exit,
}

/// Keyboard mapping for the fan controls.
///
/// | Key       | Action               | Repeats |
/// |-----------|----------------------|---------|
/// | `Space`   | start / stop blades  | no      |
/// | `[`       | tilt cage down       | yes     |
/// | `]`       | tilt cage up         | yes     |
/// | `T`       | toggle texture       | no      |
/// | `L`       | toggle lighting      | no      |
/// | `Escape`  | quit                 | no      |
///
/// The brackets are matched on the character typed, so they follow the
/// keyboard layout. The letter keys and `Escape` are matched by position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyBindings {
    /// Pitch change per press, radians.
    pub pitch_step: f32,
}

impl KeyBindings {
    pub fn new(pitch_step: f32) -> Self {
        Self { pitch_step }
    }

    /// Maps a winit key event. Releases and unbound keys map to `None`.
    pub fn action_for(&self, event: &KeyEvent) -> Option<InputAction> {
        if event.state != ElementState::Pressed {
            return None;
        }
        let typed = match &event.logical_key {
            Key::Character(text) => self.map_character(text),
            _ => None,
        };
        typed.or_else(|| match event.physical_key {
            PhysicalKey::Code(key) => self.map(key, event.repeat),
            PhysicalKey::Unidentified(_) => None,
        })
    }

    /// Maps typed text. Pitch adjustments accept auto-repeat.
    pub fn map_character(&self, text: &str) -> Option<InputAction> {
        let delta = match text {
            "[" => -self.pitch_step,
            "]" => self.pitch_step,
            _ => return None,
        };
        Some(InputAction::Fan(FanCommand::AdjustCagePitch(delta)))
    }

    /// Maps a pressed physical key; `repeat` is true for auto-repeat presses.
    /// Toggles and exit fire only on the first press.
    pub fn map(&self, key: KeyCode, repeat: bool) -> Option<InputAction> {
        if repeat {
            return None;
        }
        let command = match key {
            KeyCode::Space => FanCommand::ToggleRunning,
            KeyCode::KeyT => FanCommand::ToggleTexture,
            KeyCode::KeyL => FanCommand::ToggleLighting,
            KeyCode::Escape => return Some(InputAction::Exit),
            _ => return None,
        };
        Some(InputAction::Fan(command))
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new(crate::animation::PITCH_STEP_DEGREES.to_radians())
    }
}
