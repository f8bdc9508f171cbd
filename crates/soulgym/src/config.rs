//! TOML configuration
//!
//! Every section is optional; missing keys take their defaults. Durations are
//! written as integer milliseconds (`*_ms` keys).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::input::KeyBindings;
use crate::memory::layout::{arena, fog_gate, limits};
use crate::pointer::{PointerChain, PointerTable};
use crate::retry::RetryPolicy;
use crate::reward::RewardConfig;

/// Serde adapter storing a `Duration` as whole milliseconds
pub mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub resolver: RetryPolicy,
    pub encounter: EncounterConfig,
    pub dispatch: DispatchConfig,
    pub keys: KeyBindings,
    pub reward: RewardConfig,
    pub episode: EpisodeConfig,
    pub side_channel: SideChannelConfig,
    pub session: SessionConfig,
    /// Pointer chain overrides keyed by name
    pub pointers: BTreeMap<String, PointerChain>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as TOML, including the effective pointer table
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut effective = self.clone();
        effective.pointers = self.pointer_table()?.to_named();
        let content = toml::to_string_pretty(&effective)
            .map_err(|e| Error::Config(format!("serialize: {}", e)))?;
        fs::write(path.as_ref(), content)?;
        info!("Saved config to {}", path.as_ref().display());
        Ok(())
    }

    /// Built-in pointer table with configured overrides
    pub fn pointer_table(&self) -> Result<PointerTable> {
        PointerTable::with_overrides(&self.pointers)
    }

    /// Reject values the control loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.process.name.trim().is_empty() {
            return Err(Error::Config("process.name is empty".into()));
        }
        if self.encounter.player_max_health <= 0 || self.encounter.boss_max_health <= 0 {
            return Err(Error::Config("health baselines must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.dispatch.hysteresis)
            || !(0.0..=1.0).contains(&self.dispatch.movement_threshold)
        {
            return Err(Error::Config(
                "dispatch hysteresis and movement_threshold must lie in [0, 1]".into(),
            ));
        }
        if self.episode.max_steps == 0 {
            return Err(Error::Config("episode.max_steps must be at least 1".into()));
        }
        if self.reward.stale_limit == 0 {
            return Err(Error::Config("reward.stale_limit must be at least 1".into()));
        }
        self.pointer_table()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Executable name of the target process
    pub name: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: "DarkSoulsIII.exe".to_string(),
        }
    }
}

/// Position and facing written by a teleport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub angle: f32,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            x: arena::X,
            y: arena::Y,
            z: arena::Z,
            angle: arena::ANGLE,
        }
    }
}

/// Encounter constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Health reads above this are treated as unknown
    pub player_max_health: i32,
    pub boss_max_health: i32,
    /// Health written by a heal
    pub heal_value: i32,
    /// Scripted approach runs when `fog_gate_min_x < x < fog_gate_max_x`
    pub fog_gate_min_x: f32,
    pub fog_gate_max_x: f32,
    /// Facing angles tried in order while acquiring lock-on
    pub lock_on_angles: Vec<f32>,
    pub arena_spawn: SpawnPoint,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            player_max_health: limits::PLAYER_MAX_HEALTH,
            boss_max_health: limits::BOSS_MAX_HEALTH,
            heal_value: limits::PLAYER_MAX_HEALTH,
            fog_gate_min_x: fog_gate::MIN_X,
            fog_gate_max_x: fog_gate::MAX_X,
            lock_on_angles: vec![-2.5, 0.0, 2.5],
            arena_spawn: SpawnPoint::default(),
        }
    }
}

/// Action dispatch thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Minimum movement change that touches the forward key
    pub hysteresis: f32,
    /// Movement above this holds the forward key
    pub movement_threshold: f32,
    /// Attacks beyond this x distance count as whiffed
    pub attack_range: f32,
    /// Dodges beyond this x distance count as useless
    pub dodge_range: f32,
    /// Heal only at or below this health
    pub heal_health_threshold: i32,
    /// Heal only with more than this many charges
    pub min_heal_charges: i32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            hysteresis: 0.05,
            movement_threshold: 0.1,
            attack_range: 5.0,
            dodge_range: 4.0,
            heal_health_threshold: 250,
            min_heal_charges: 1,
        }
    }
}

/// Episode timing and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Steps before an episode is truncated
    pub max_steps: u32,
    /// Wait between dispatch and sampling
    #[serde(rename = "tick_ms", with = "millis")]
    pub tick: Duration,
    /// Wait at the start of every reset
    #[serde(rename = "settle_ms", with = "millis")]
    pub settle_delay: Duration,
    /// Wait after a forced player death
    #[serde(rename = "respawn_ms", with = "millis")]
    pub respawn_delay: Duration,
    /// Polls of the encounter flag before teleporting
    pub reentry_attempts: u32,
    #[serde(rename = "reentry_poll_ms", with = "millis")]
    pub reentry_poll: Duration,
    /// Polls for a live player once the arena is reached
    pub ready_attempts: u32,
    #[serde(rename = "ready_poll_ms", with = "millis")]
    pub ready_poll: Duration,
    /// Wait after turning before pressing lock-on
    #[serde(rename = "lock_on_turn_ms", with = "millis")]
    pub lock_on_turn_delay: Duration,
    /// Wait after pressing lock-on before checking it
    #[serde(rename = "lock_on_check_ms", with = "millis")]
    pub lock_on_check_delay: Duration,
    /// Forward hold of the fog gate approach
    #[serde(rename = "approach_hold_ms", with = "millis")]
    pub approach_hold: Duration,
    /// Wait after each approach key press
    #[serde(rename = "approach_wait_ms", with = "millis")]
    pub approach_wait: Duration,
    /// Play the gesture sequence after a boss defeat
    pub gesture_on_victory: bool,
    #[serde(rename = "gesture_gap_ms", with = "millis")]
    pub gesture_gap: Duration,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps: 1000,
            tick: Duration::from_millis(20),
            settle_delay: Duration::from_secs(8),
            respawn_delay: Duration::from_secs(7),
            reentry_attempts: 4,
            reentry_poll: Duration::from_secs(2),
            ready_attempts: 10,
            ready_poll: Duration::from_secs(1),
            lock_on_turn_delay: Duration::from_millis(50),
            lock_on_check_delay: Duration::from_millis(100),
            approach_hold: Duration::from_millis(900),
            approach_wait: Duration::from_secs(1),
            gesture_on_victory: true,
            gesture_gap: Duration::from_millis(100),
        }
    }
}

/// Files shared with the in-game companion script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideChannelConfig {
    pub dir: PathBuf,
    pub lock_on_file: String,
    pub boss_info_file: String,
    pub reset_trigger_file: String,
}

impl SideChannelConfig {
    pub fn lock_on_path(&self) -> PathBuf {
        self.dir.join(&self.lock_on_file)
    }

    pub fn boss_info_path(&self) -> PathBuf {
        self.dir.join(&self.boss_info_file)
    }

    pub fn reset_trigger_path(&self) -> PathBuf {
        self.dir.join(&self.reset_trigger_file)
    }
}

impl Default for SideChannelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            lock_on_file: "lock_on.txt".to_string(),
            boss_info_file: "gundyr_info.txt".to_string(),
            reset_trigger_file: "reset_trigger.txt".to_string(),
        }
    }
}

/// Episode log location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("sessions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ValueType;
    use crate::pointer::PointerId;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.resolver, RetryPolicy::default());
        assert_eq!(config.episode.max_steps, 1000);
        assert_eq!(config.episode.tick, Duration::from_millis(20));
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [process]
            name = "game.exe"

            [resolver]
            max_retries = 2

            [episode]
            settle_ms = 0
            max_steps = 50

            [pointers.boss_position]
            offsets = [0x4750A98, 0x0, 0x88, 0x18, 0x2428, 0x80]
            type = "f32"
            "#,
        )
        .unwrap();

        assert_eq!(config.process.name, "game.exe");
        assert_eq!(config.resolver.max_retries, 2);
        assert_eq!(config.resolver.delay, Duration::from_millis(500));
        assert_eq!(config.episode.settle_delay, Duration::ZERO);
        assert_eq!(config.episode.respawn_delay, Duration::from_secs(7));

        let table = config.pointer_table().unwrap();
        let boss = table.require(PointerId::BossPosition).unwrap();
        assert_eq!(boss.value_type, ValueType::F32);
        assert_eq!(boss.offsets[4], 0x2428);
    }

    #[test]
    fn test_load_rejects_unknown_pointer() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            "[pointers.mana]\noffsets = [1]\ntype = \"i32\"\n",
        )
        .unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = Config::load("does-not-exist.toml").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.dispatch.hysteresis = 2.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.episode.max_steps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_writes_effective_pointer_table() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.side_channel.dir = PathBuf::from("telemetry");
        config.save(file.path()).unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.side_channel.dir, PathBuf::from("telemetry"));
        assert_eq!(loaded.pointers.len(), PointerTable::builtin().iter().count());
        assert_eq!(loaded.pointer_table().unwrap(), PointerTable::builtin());
    }
}
