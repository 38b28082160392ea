use std::collections::HashMap;

/// Abstract key identity decoupled from the windowing backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
}

impl Key {
    /// Parses a key name from level configuration. Unknown names are a
    /// configuration error and must be rejected at construction.
    pub fn from_name(name: &str) -> Option<Key> {
        match name {
            "W" => Some(Key::W),
            "A" => Some(Key::A),
            "S" => Some(Key::S),
            "D" => Some(Key::D),
            "Up" => Some(Key::Up),
            "Down" => Some(Key::Down),
            "Left" => Some(Key::Left),
            "Right" => Some(Key::Right),
            "Space" => Some(Key::Space),
            "Escape" => Some(Key::Escape),
            _ => None,
        }
    }
}

/// Pressed-state snapshot carried by the keyboard event.
///
/// A key that has never produced an event is absent from the map and reads
/// as `None`, which is distinct from an explicitly released `Some(false)`.
/// The motion transition tables rely on that distinction.
#[derive(Debug, Clone, Default)]
pub struct KeyStates {
    states: HashMap<Key, bool>,
}

impl KeyStates {
    pub fn set(&mut self, key: Key, is_down: bool) {
        self.states.insert(key, is_down);
    }

    pub fn pressed(&self, key: Key) -> Option<bool> {
        self.states.get(&key).copied()
    }
}

/// Keys driving one entity's motion state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub up: Key,
    pub left: Key,
    pub right: Key,
}

/// Once-per-frame input snapshot produced by the input collaborator.
/// `key_events` holds the state transitions observed since the last frame.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub quit: bool,
    pub key_events: Vec<(Key, bool)>,
    pub mouse_click: Option<(f32, f32)>,
}

impl InputFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_key_event(mut self, key: Key, is_down: bool) -> Self {
        self.key_events.push((key, is_down));
        self
    }

    pub fn with_mouse_click(mut self, x: f32, y: f32) -> Self {
        self.mouse_click = Some((x, y));
        self
    }
}
