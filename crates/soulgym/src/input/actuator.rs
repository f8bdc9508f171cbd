use crate::error::Result;
use crate::input::Key;

/// Sends key events to the game
pub trait Actuator {
    fn key_down(&mut self, key: Key) -> Result<()>;

    fn key_up(&mut self, key: Key) -> Result<()>;

    /// Tap a key
    fn press(&mut self, key: Key) -> Result<()> {
        self.key_down(key)?;
        self.key_up(key)
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn key_down(&mut self, key: Key) -> Result<()> {
        (**self).key_down(key)
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        (**self).key_up(key)
    }

    fn press(&mut self, key: Key) -> Result<()> {
        (**self).press(key)
    }
}

#[cfg(test)]
pub use recording::{KeyEvent, RecordingActuator};
