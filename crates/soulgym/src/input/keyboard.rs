//! Keyboard actuation through synthesized scan codes.
//!
//! The game reads raw input, so events carry scan codes rather than virtual
//! keys.

use crate::error::Result;
use crate::input::{Actuator, Key, KeyBindings};
use crate::retry::SharedSleeper;

/// Sends key events to the foreground window
pub struct KeyboardActuator {
    bindings: KeyBindings,
    sleeper: SharedSleeper,
}

impl KeyboardActuator {
    pub fn new(bindings: KeyBindings, sleeper: SharedSleeper) -> Self {
        Self { bindings, sleeper }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }
}

impl Actuator for KeyboardActuator {
    fn key_down(&mut self, key: Key) -> Result<()> {
        send_scan_code(self.bindings.scan_code(key), false)
    }

    fn key_up(&mut self, key: Key) -> Result<()> {
        send_scan_code(self.bindings.scan_code(key), true)
    }

    fn press(&mut self, key: Key) -> Result<()> {
        self.key_down(key)?;
        self.sleeper.sleep(self.bindings.press_hold);
        self.key_up(key)
    }
}

#[cfg(target_os = "windows")]
fn send_scan_code(scan_code: u16, release: bool) -> Result<()> {
    use crate::error::Error;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        INPUT, INPUT_0, INPUT_KEYBOARD, KEYBD_EVENT_FLAGS, KEYBDINPUT, KEYEVENTF_KEYUP,
        KEYEVENTF_SCANCODE, SendInput, VIRTUAL_KEY,
    };

    let mut flags: KEYBD_EVENT_FLAGS = KEYEVENTF_SCANCODE;
    if release {
        flags |= KEYEVENTF_KEYUP;
    }

    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: scan_code,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };

    // SAFETY: SendInput reads exactly one fully initialized INPUT.
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent != 1 {
        return Err(Error::Input(format!(
            "SendInput rejected scan code {:#04x}: {}",
            scan_code,
            std::io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn send_scan_code(scan_code: u16, _release: bool) -> Result<()> {
    Err(crate::error::Error::Input(format!(
        "Keyboard input is only supported on Windows (scan code {:#04x})",
        scan_code
    )))
}
