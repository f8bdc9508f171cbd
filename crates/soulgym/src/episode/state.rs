use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr};

use crate::bridge::{Observation, StateSnapshot};
use crate::input::DiagnosticFlags;

/// Where the controller is in the episode lifecycle
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// No process handle
    Detached,
    /// Attached, waiting for the player to enter the encounter
    AwaitingArena,
    /// In the arena, first observation pending
    Ready,
    /// Accepting steps
    Active,
    /// Episode finished; only `reset` is valid
    Terminal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Why a step ended the way it did
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, IntoStaticStr,
)]
pub enum DeathReason {
    #[strum(serialize = "boss dead")]
    #[serde(rename = "boss dead")]
    BossDead,
    #[strum(serialize = "player dead")]
    #[serde(rename = "player dead")]
    PlayerDead,
    #[strum(serialize = "timeout")]
    #[serde(rename = "timeout")]
    Timeout,
    #[strum(serialize = "alive")]
    #[serde(rename = "alive")]
    Alive,
}

impl DeathReason {
    /// The episode ended because of the game, not the step budget
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::BossDead | Self::PlayerDead)
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Diagnostic side of a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepInfo {
    pub death_reason: DeathReason,
    /// Steps taken in this episode, including this one
    pub step: u32,
    pub watchdog_fired: bool,
    /// The action was not sent: no lock-on, or the input failed
    pub action_skipped: bool,
}

/// Outcome of one control step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

/// Per-episode counters, rebuilt on every reset
#[derive(Debug, Clone)]
pub struct EpisodeState {
    pub number: u32,
    pub steps: u32,
    pub total_reward: f64,
    pub flags: DiagnosticFlags,
    /// Most recent post-tick sample
    pub last_snapshot: StateSnapshot,
}

impl EpisodeState {
    pub fn new(number: u32, first: StateSnapshot) -> Self {
        Self {
            number,
            steps: 0,
            total_reward: 0.0,
            flags: DiagnosticFlags::default(),
            last_snapshot: first,
        }
    }
}
