use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::config::millis;

/// Game controls the control loop can actuate
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Key {
    Forward,
    Attack,
    Dodge,
    Heal,
    Interact,
    LockOn,
    Gesture,
}

/// Keyboard scan codes (set 1) for each control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: u16,
    pub attack: u16,
    pub dodge: u16,
    pub heal: u16,
    pub interact: u16,
    pub lock_on: u16,
    pub gesture: u16,
    /// How long a tap holds the key down
    #[serde(rename = "press_ms", with = "millis")]
    pub press_hold: Duration,
}

impl KeyBindings {
    pub fn scan_code(&self, key: Key) -> u16 {
        match key {
            Key::Forward => self.forward,
            Key::Attack => self.attack,
            Key::Dodge => self.dodge,
            Key::Heal => self.heal,
            Key::Interact => self.interact,
            Key::LockOn => self.lock_on,
            Key::Gesture => self.gesture,
        }
    }
}

impl Default for KeyBindings {
    /// W, U, Space, R, E, Q, G
    fn default() -> Self {
        Self {
            forward: 0x11,
            attack: 0x16,
            dodge: 0x39,
            heal: 0x13,
            interact: 0x12,
            lock_on: 0x10,
            gesture: 0x22,
            press_hold: Duration::from_millis(50),
        }
    }
}
