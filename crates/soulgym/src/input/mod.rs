//! Action dispatch and key actuation.

mod actuator;
mod dispatcher;
mod keyboard;
mod keys;

pub use actuator::Actuator;
pub use dispatcher::{ActionDispatcher, DiagnosticFlags, DispatchContext, MovementState};
pub use keyboard::KeyboardActuator;
pub use keys::{Key, KeyBindings};

#[cfg(test)]
pub use actuator::{KeyEvent, RecordingActuator};
