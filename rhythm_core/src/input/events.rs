#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// Milliseconds on the session's frame clock.
    pub timestamp: f64,
    /// Keyboard key, case-insensitive.
    pub key: char,
    pub pressed: bool,
}

impl InputEvent {
    pub fn press(key: char, timestamp: f64) -> Self {
        Self {
            timestamp,
            key,
            pressed: true,
        }
    }

    pub fn release(key: char, timestamp: f64) -> Self {
        Self {
            timestamp,
            key,
            pressed: false,
        }
    }
}
