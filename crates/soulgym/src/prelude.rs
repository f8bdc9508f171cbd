//! Prelude module for convenient imports
//!
//! # Usage
//!
//! ```ignore
//! use soulgym::prelude::*;
//! ```
//!
//! This brings the following into scope:
//!
//! - Lifecycle: `EpisodeController`, `GameStateBridge`, `Config`
//! - Control contract: `Action`, `ActionInput`, `Observation`, `StepResult`
//! - Memory traits: `ReadMemory`, `WriteMemory`, `Attach`
//! - Error handling: `Error`, `Result`

// Lifecycle
pub use crate::bridge::GameStateBridge;
pub use crate::config::Config;
pub use crate::episode::{DeathReason, EpisodeController, Phase, StepInfo, StepResult};

// Control contract
pub use crate::action::{Action, ActionInput};
pub use crate::bridge::{Observation, StateSnapshot};

// Memory access
pub use crate::memory::{Attach, ProcessAttacher, ReadMemory, WriteMemory};
pub use crate::pointer::{PointerId, PointerResolver};

// Input
pub use crate::input::{ActionDispatcher, Actuator, KeyboardActuator};

// Timing
pub use crate::retry::{SharedSleeper, Sleeper, ThreadSleeper};

// Error handling
pub use crate::error::{Error, Result};
