//! Input handling.
//!
//! Maps the named action/axis bindings to [`InputEvent`]s. Presses and
//! releases are edge events, delivered once per transition; the turn axis
//! is sampled every frame from the held [`InputState`].

use serde::{Deserialize, Serialize};

/// Name of the turn axis binding.
pub const TURN_AXIS: &str = "MoveRight";

/// Bound actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Drive,
    Brake,
    Fire,
    Boost,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Drive, Action::Brake, Action::Fire, Action::Boost];

    /// Binding name as it appears in the input settings.
    pub fn binding_name(self) -> &'static str {
        match self {
            Action::Drive => "Driving",
            Action::Brake => "Breaking",
            Action::Fire => "Shooting",
            Action::Boost => "Boost",
        }
    }

    pub fn from_binding(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.binding_name() == name)
    }

    fn console_name(self) -> &'static str {
        match self {
            Action::Drive => "drive",
            Action::Brake => "brake",
            Action::Fire => "fire",
            Action::Boost => "boost",
        }
    }

    /// Console short name or full binding name.
    fn from_console(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.console_name() == name)
            .or_else(|| Self::from_binding(name))
    }
}

/// One input transition or axis sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Pressed(Action),
    Released(Action),
    /// Turn axis value in [-1, 1].
    Axis(f32),
}

impl InputEvent {
    /// Parses console input: `+drive`, `-boost`, `fire`, `turn -0.5`.
    /// Binding names work too: `+Breaking`, `MoveRight 0.5`.
    ///
    /// A bare `fire` is a press; axis values are clamped to [-1, 1].
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let head = parts.next()?;
        if let Some(name) = head.strip_prefix('+') {
            return Action::from_console(name).map(InputEvent::Pressed);
        }
        if let Some(name) = head.strip_prefix('-') {
            return Action::from_console(name).map(InputEvent::Released);
        }
        match head {
            "fire" => Some(InputEvent::Pressed(Action::Fire)),
            "turn" | TURN_AXIS => {
                let value: f32 = parts.next()?.parse().ok()?;
                value.is_finite().then(|| InputEvent::Axis(value.clamp(-1.0, 1.0)))
            }
            _ => None,
        }
    }
}

/// Held axis values, resampled every frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub turn: f32,
}

impl InputState {
    /// Folds an event into the held state. Only axis samples change it.
    pub fn apply(&mut self, event: InputEvent) {
        if let InputEvent::Axis(value) = event {
            self.turn = value.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_names_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_binding(action.binding_name()), Some(action));
        }
        assert_eq!(Action::from_binding("Breaking"), Some(Action::Brake));
        assert_eq!(Action::from_binding("Jump"), None);
    }

    #[test]
    fn parse_console_forms() {
        assert_eq!(InputEvent::parse("+drive"), Some(InputEvent::Pressed(Action::Drive)));
        assert_eq!(InputEvent::parse("-boost"), Some(InputEvent::Released(Action::Boost)));
        assert_eq!(InputEvent::parse("fire"), Some(InputEvent::Pressed(Action::Fire)));
        assert_eq!(InputEvent::parse("turn 3"), Some(InputEvent::Axis(1.0)));
        assert_eq!(InputEvent::parse("turn -0.25"), Some(InputEvent::Axis(-0.25)));
        assert_eq!(InputEvent::parse("turn"), None);
        assert_eq!(InputEvent::parse("turn NaN"), None);
        assert_eq!(InputEvent::parse("+jump"), None);
        assert_eq!(InputEvent::parse("+Breaking"), Some(InputEvent::Pressed(Action::Brake)));
        assert_eq!(InputEvent::parse("-Shooting"), Some(InputEvent::Released(Action::Fire)));
        assert_eq!(InputEvent::parse("MoveRight -2"), Some(InputEvent::Axis(-1.0)));
        assert_eq!(InputEvent::parse(""), None);
    }

    #[test]
    fn state_tracks_last_axis_sample() {
        let mut state = InputState::default();
        state.apply(InputEvent::Axis(0.5));
        state.apply(InputEvent::Pressed(Action::Drive));
        assert_eq!(state.turn, 0.5);
    }
}
