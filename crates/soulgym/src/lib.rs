//! # soulgym
//!
//! Bridge between a running Dark Souls III process and a reinforcement
//! learning control loop.
//!
//! This crate provides:
//! - Process attach and raw memory access (Windows, and Linux via `/proc`)
//! - Named pointer chains with bounded retry resolution
//! - A typed view of the boss encounter and its mutators
//! - Keyboard action dispatch, reward shaping and the episode lifecycle
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables memory dumps and the value freezer.
//!   This feature is intended for CLI tools and development, not training.

pub mod action;
pub mod bridge;
pub mod config;
#[cfg(any(test, feature = "debug-tools"))]
pub mod debug;
pub mod episode;
pub mod error;
pub mod input;
pub mod memory;
pub mod pointer;
pub mod prelude;
pub mod retry;
pub mod reward;
pub mod session;
pub mod sidechannel;

pub use action::{Action, ActionInput};
pub use bridge::{AnimCategory, GameStateBridge, OBSERVATION_WIDTH, Observation, Position, StateSnapshot};
pub use config::Config;
pub use episode::{DeathReason, EpisodeController, EpisodeState, Phase, StepInfo, StepResult};
pub use error::{Error, Result};
pub use input::{ActionDispatcher, Actuator, Key, KeyBindings, KeyboardActuator};
pub use memory::{
    Attach, MemoryAccessor, ProcessAttacher, ProcessHandle, ProcessMemory, ReadMemory, Value,
    ValueType, WriteMemory,
};
pub use pointer::{PointerChain, PointerId, PointerResolver, PointerTable};
pub use retry::{RetryPolicy, SharedSleeper, Sleeper, ThreadSleeper};
pub use reward::{Evaluation, RewardConfig, RewardEngine};
pub use session::{EpisodeLog, EpisodeRecord};
pub use sidechannel::SideChannel;

// Debug utilities (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use debug::{MemoryDump, ValueFreezer};
