//! Typed view of the live encounter.
//!
//! [`GameStateBridge`] owns the attach lifecycle and turns named pointer
//! chains into typed accessors and mutators:
//! - accessors never fail; an unreadable or out-of-range value is `None`
//! - mutators return typed errors for the caller to log
//!
//! ## Example
//!
//! ```ignore
//! use soulgym::bridge::GameStateBridge;
//! use soulgym::memory::ProcessAttacher;
//!
//! let mut bridge = GameStateBridge::new(ProcessAttacher, &config, resolver)?;
//! bridge.attach()?;
//! let snapshot = bridge.snapshot();
//! ```

mod snapshot;

pub use snapshot::{AnimCategory, OBSERVATION_WIDTH, Observation, Position, StateSnapshot, UNKNOWN};

use tracing::{debug, info, warn};

use crate::config::{Config, EncounterConfig};
use crate::error::{Error, Result};
use crate::memory::layout::{self, flags};
use crate::memory::{Attach, ProcessMemory, ReadMemory, Value, WriteMemory};
use crate::pointer::{PointerId, PointerResolver, PointerTable};
use crate::sidechannel::{BossTelemetry, SideChannel};

/// Clear the defeated bit of a boss flag byte
pub fn clear_defeated_bit(byte: u8) -> u8 {
    byte & !flags::DEFEATED_BIT
}

/// Named accessors and mutators over an attached process
pub struct GameStateBridge<A: Attach> {
    attacher: A,
    process_name: String,
    memory: Option<A::Memory>,
    table: PointerTable,
    resolver: PointerResolver,
    encounter: EncounterConfig,
    side_channel: SideChannel,
}

impl<A: Attach> GameStateBridge<A> {
    pub fn new(attacher: A, config: &Config, resolver: PointerResolver) -> Result<Self> {
        Ok(Self {
            attacher,
            process_name: config.process.name.clone(),
            memory: None,
            table: config.pointer_table()?,
            resolver,
            encounter: config.encounter.clone(),
            side_channel: SideChannel::new(&config.side_channel),
        })
    }

    // ---- lifecycle ----

    /// Attach to the configured process
    pub fn attach(&mut self) -> Result<()> {
        let memory = self.attacher.attach(&self.process_name)?;
        info!(
            "Attached to {} (base {:#x})",
            self.process_name,
            memory.base_address()
        );
        self.memory = Some(memory);
        Ok(())
    }

    /// Drop the current handle and attach again
    pub fn reattach(&mut self) -> Result<()> {
        self.detach();
        self.attach()
    }

    pub fn detach(&mut self) {
        if self.memory.take().is_some() {
            info!("Detached from {}", self.process_name);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.memory.is_some()
    }

    /// Fail with [`Error::ProcessExited`] if the target went away.
    ///
    /// A dead handle is dropped, leaving the bridge detached.
    pub fn ensure_alive(&mut self) -> Result<()> {
        let memory = self.memory.as_ref().ok_or(Error::NotAttached)?;
        if memory.is_alive() {
            return Ok(());
        }
        self.memory = None;
        Err(Error::ProcessExited(self.process_name.clone()))
    }

    pub fn memory(&self) -> Option<&A::Memory> {
        self.memory.as_ref()
    }

    pub fn table(&self) -> &PointerTable {
        &self.table
    }

    pub fn resolver(&self) -> &PointerResolver {
        &self.resolver
    }

    pub fn side_channel(&self) -> &SideChannel {
        &self.side_channel
    }

    pub fn encounter(&self) -> &EncounterConfig {
        &self.encounter
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    // ---- raw named access ----

    /// Resolve a table entry to its value
    pub fn read(&self, id: PointerId) -> Option<Value> {
        let memory = self.memory.as_ref()?;
        let chain = self.table.get(id)?;
        self.resolver.resolve(memory, chain, id.as_str())
    }

    /// Resolve a table entry to its final address
    pub fn address_of(&self, id: PointerId) -> Option<u64> {
        let memory = self.memory.as_ref()?;
        let chain = self.table.get(id)?;
        self.resolver.update_address(memory, chain, id.as_str())
    }

    fn require_address(&self, id: PointerId) -> Result<(&A::Memory, u64)> {
        let memory = self.memory.as_ref().ok_or(Error::NotAttached)?;
        let chain = self.table.require(id)?;
        let address = self
            .resolver
            .update_address(memory, chain, id.as_str())
            .ok_or_else(|| Error::PointerUnresolved(id.to_string()))?;
        Ok((memory, address))
    }

    /// Write a value at a table entry's final address
    pub fn write(&self, id: PointerId, value: &Value) -> Result<()> {
        let (memory, address) = self.require_address(id)?;
        memory.write_value(address, value)?;
        debug!("Wrote {} = {} at {:#x}", id, value, address);
        Ok(())
    }

    fn read_i32(&self, id: PointerId) -> Option<i32> {
        self.read(id)
            .and_then(|v| v.as_i64())
            .and_then(|v| i32::try_from(v).ok())
    }

    // ---- accessors ----

    pub fn player_health(&self) -> Option<i32> {
        in_range(
            PointerId::PlayerHealth,
            self.read_i32(PointerId::PlayerHealth),
            self.encounter.player_max_health,
        )
    }

    pub fn player_stamina(&self) -> Option<i32> {
        self.read_i32(PointerId::PlayerStamina).filter(|v| *v >= 0)
    }

    /// Player x, y, z and facing from one resolved position address
    pub fn player_position(&self) -> Option<Position> {
        use layout::position::{ANGLE, X, Y, Z};
        self.read_position(PointerId::PlayerPosition, [X, Y, Z, ANGLE])
    }

    pub fn player_heal_charges(&self) -> Option<i32> {
        self.read_i32(PointerId::PlayerHealCharges)
            .filter(|v| *v >= 0)
    }

    /// Boss health from memory, or from the companion telemetry when the
    /// chain does not resolve
    pub fn boss_health(&self) -> Option<i32> {
        self.boss_health_with(|| self.side_channel.boss_telemetry())
    }

    fn boss_health_with(
        &self,
        telemetry: impl FnOnce() -> Option<BossTelemetry>,
    ) -> Option<i32> {
        let raw = self.read_i32(PointerId::BossHealth).or_else(|| {
            let health = telemetry()?.health?;
            debug!("Boss health from telemetry: {}", health);
            Some(health.round() as i32)
        });
        in_range(PointerId::BossHealth, raw, self.encounter.boss_max_health)
    }

    /// Boss position from memory when a chain is configured, otherwise from
    /// the companion telemetry (origin if that is unavailable too)
    pub fn boss_position(&self) -> Option<Position> {
        self.boss_position_with(|| self.side_channel.boss_telemetry())
    }

    fn boss_position_with(
        &self,
        telemetry: impl FnOnce() -> Option<BossTelemetry>,
    ) -> Option<Position> {
        use layout::boss_position::{ANGLE, X, Y, Z};
        if self.table.contains(PointerId::BossPosition) {
            return self.read_position(PointerId::BossPosition, [X, Y, Z, ANGLE]);
        }
        Some(telemetry().map(|t| t.position).unwrap_or_default())
    }

    pub fn boss_animation(&self) -> Option<AnimCategory> {
        self.side_channel.boss_telemetry().and_then(|t| t.anim)
    }

    pub fn in_encounter(&self) -> Option<bool> {
        self.read(PointerId::InEncounter)
            .and_then(|v| v.as_i64())
            .map(|v| v != 0)
    }

    pub fn boss_defeated(&self) -> Option<bool> {
        self.read(PointerId::BossDefeated)
            .and_then(|v| v.as_i64())
            .map(|v| (v as u8) & flags::DEFEATED_BIT != 0)
    }

    /// Lock-on status from the companion file, falling back to the target
    /// pointer when the file does not exist
    pub fn locked_on_target(&self) -> bool {
        if let Some(locked) = self.side_channel.lock_on() {
            return locked;
        }
        self.read(PointerId::LockOnTarget)
            .and_then(|v| v.as_i64())
            .is_some_and(|v| v != 0)
    }

    /// Sample every observed value once
    pub fn snapshot(&self) -> StateSnapshot {
        let telemetry = self.side_channel.boss_telemetry();
        StateSnapshot {
            player_health: self.player_health(),
            player_stamina: self.player_stamina(),
            player_position: self.player_position(),
            boss_health: self.boss_health_with(|| telemetry),
            boss_position: self.boss_position_with(|| telemetry),
            boss_anim: telemetry.and_then(|t| t.anim),
        }
    }

    fn read_position(&self, id: PointerId, offsets: [i64; 4]) -> Option<Position> {
        let memory = self.memory.as_ref()?;
        let address = self.address_of(id)?;
        let component = |offset: i64| {
            memory
                .read_f32(address.wrapping_add_signed(offset))
                .map_err(|e| debug!("{} component at {:+#x}: {}", id, offset, e))
                .ok()
        };
        Some(Position {
            x: component(offsets[0])?,
            y: component(offsets[1])?,
            z: component(offsets[2])?,
            angle: component(offsets[3])?,
        })
    }

    // ---- mutators ----

    pub fn set_player_health(&self, health: i32) -> Result<()> {
        self.write(PointerId::PlayerHealth, &Value::I32(health))
    }

    /// Restore the player to full health
    pub fn heal_player(&self) -> Result<()> {
        self.set_player_health(self.encounter.heal_value)?;
        info!("Player healed to {}", self.encounter.heal_value);
        Ok(())
    }

    /// Force the player's health to zero
    pub fn kill_player(&self) -> Result<()> {
        self.set_player_health(0)?;
        info!("Player killed");
        Ok(())
    }

    /// Move the player to the arena spawn point
    pub fn teleport_to_encounter(&self) -> Result<()> {
        use layout::position::{ANGLE, X, Y, Z};
        let spawn = self.encounter.arena_spawn;
        let (memory, address) = self.require_address(PointerId::PlayerPosition)?;
        for (offset, value) in [(X, spawn.x), (Y, spawn.y), (Z, spawn.z), (ANGLE, spawn.angle)] {
            memory.write_value(address.wrapping_add_signed(offset), &Value::F32(value))?;
        }
        info!(
            "Teleported player to ({:.2}, {:.2}, {:.2})",
            spawn.x, spawn.y, spawn.z
        );
        Ok(())
    }

    pub fn set_player_angle(&self, angle: f32) -> Result<()> {
        let (memory, address) = self.require_address(PointerId::PlayerPosition)?;
        memory.write_value(
            address.wrapping_add_signed(layout::position::ANGLE),
            &Value::F32(angle),
        )?;
        debug!("Player angle set to {}", angle);
        Ok(())
    }

    /// Clear the defeated bit with one read-modify-write.
    ///
    /// Returns the old and new byte.
    pub fn clear_defeated_flag(&self) -> Result<(u8, u8)> {
        let (memory, address) = self.require_address(PointerId::BossDefeated)?;
        let old = memory.read_u8(address)?;
        let new = clear_defeated_bit(old);
        memory.write_value(address, &Value::Byte(new))?;
        info!(
            "Boss defeated flag {:#04x} -> {:#04x} at {:#x}",
            old, new, address
        );
        Ok((old, new))
    }
}

/// Keep a health value only if it lies in `[0, max]`
fn in_range(id: PointerId, value: Option<i32>, max: i32) -> Option<i32> {
    let value = value?;
    if (0..=max).contains(&value) {
        Some(value)
    } else {
        warn!("{} out of range: {} (max {})", id, value, max);
        None
    }
}
