//! File-based exchange with the in-game companion script.

mod inbound;
mod outbound;

use std::path::PathBuf;

use crate::config::SideChannelConfig;
use crate::error::Result;

pub use inbound::{BossTelemetry, LOCKED_TOKEN, read_boss_telemetry, read_lock_on};
pub use outbound::{RESET_TOKEN, write_reset_trigger};

/// Resolved side-channel file locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideChannel {
    lock_on: PathBuf,
    boss_info: PathBuf,
    reset_trigger: PathBuf,
}

impl SideChannel {
    pub fn new(config: &SideChannelConfig) -> Self {
        Self {
            lock_on: config.lock_on_path(),
            boss_info: config.boss_info_path(),
            reset_trigger: config.reset_trigger_path(),
        }
    }

    pub fn boss_telemetry(&self) -> Option<BossTelemetry> {
        read_boss_telemetry(&self.boss_info)
    }

    pub fn lock_on(&self) -> Option<bool> {
        read_lock_on(&self.lock_on)
    }

    pub fn trigger_reset(&self) -> Result<()> {
        write_reset_trigger(&self.reset_trigger)
    }

    pub fn reset_trigger_path(&self) -> &PathBuf {
        &self.reset_trigger
    }
}

impl Default for SideChannel {
    fn default() -> Self {
        Self::new(&SideChannelConfig::default())
    }
}
