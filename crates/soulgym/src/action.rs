//! Discrete action contract.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

use crate::error::{Error, Result};

/// Discrete action chosen by the learner
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    EnumString,
    IntoStaticStr,
    Display,
    EnumIter,
)]
#[repr(u8)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Attack = 0,
    Dodge = 1,
    Heal = 2,
}

impl Action {
    /// Number of discrete actions
    pub const COUNT: usize = 3;

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl TryFrom<i64> for Action {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_repr)
            .ok_or_else(|| {
                Error::InvalidAction(format!(
                    "action {} is outside 0..{}",
                    value,
                    Self::COUNT
                ))
            })
    }
}

/// Action plus forward-movement intensity in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionInput {
    action: Action,
    movement: f32,
}

impl ActionInput {
    /// Movement used when the learner does not supply one
    pub const DEFAULT_MOVEMENT: f32 = 1.0;

    pub fn new(action: Action, movement: f32) -> Result<Self> {
        if !movement.is_finite() || !(0.0..=1.0).contains(&movement) {
            return Err(Error::InvalidAction(format!(
                "movement {} is outside [0, 1]",
                movement
            )));
        }
        Ok(Self { action, movement })
    }

    /// Validate raw learner input
    pub fn from_raw(action: i64, movement: Option<f32>) -> Result<Self> {
        Self::new(
            Action::try_from(action)?,
            movement.unwrap_or(Self::DEFAULT_MOVEMENT),
        )
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn movement(&self) -> f32 {
        self.movement
    }
}

impl From<Action> for ActionInput {
    fn from(action: Action) -> Self {
        Self {
            action,
            movement: Self::DEFAULT_MOVEMENT,
        }
    }
}
