//! Reward shaping and the staleness watchdog.
//!
//! The engine keeps the last known health values between steps. A step whose
//! health values did not move and whose shaped reward repeats the previous
//! one is stale; a long enough stale streak fires the watchdog once, which
//! the episode controller turns into a forced player death.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bridge::StateSnapshot;
use crate::input::DiagnosticFlags;

/// Reward weights and watchdog limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward per point of boss damage
    pub boss_damage_weight: f64,
    /// Penalty per point of player damage
    pub player_damage_weight: f64,
    /// Penalty per raised diagnostic flag
    pub flag_penalty: f64,
    pub boss_defeated_bonus: f64,
    pub death_penalty: f64,
    /// Consecutive stale steps before the watchdog fires
    pub stale_limit: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            boss_damage_weight: 1.0,
            player_damage_weight: 0.1,
            flag_penalty: 0.05,
            boss_defeated_bonus: 500.0,
            death_penalty: 75.0,
            stale_limit: 30,
        }
    }
}

/// Result of one reward evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub reward: f64,
    pub boss_damage: f64,
    pub player_damage: f64,
    /// Shaped reward before terminal terms
    pub shaped: f64,
    pub stale_steps: u32,
    /// The watchdog fired on this step
    pub stale_timeout: bool,
}

/// Per-episode reward state
#[derive(Debug, Clone)]
pub struct RewardEngine {
    config: RewardConfig,
    prev_player: Option<f64>,
    prev_boss: Option<f64>,
    prev_reward: f64,
    stale_steps: u32,
}

impl RewardEngine {
    pub fn new(config: RewardConfig) -> Self {
        Self {
            config,
            prev_player: None,
            prev_boss: None,
            prev_reward: 0.0,
            stale_steps: 0,
        }
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Start a new episode from the first snapshot
    pub fn prime(&mut self, snapshot: &StateSnapshot) {
        self.prev_player = snapshot.player_health.map(f64::from);
        self.prev_boss = snapshot.boss_health.map(f64::from);
        self.prev_reward = 0.0;
        self.stale_steps = 0;
    }

    pub fn stale_steps(&self) -> u32 {
        self.stale_steps
    }

    /// Score the transition into `current`.
    ///
    /// `flags` should already be taken from the episode so each one counts
    /// once.
    pub fn evaluate(
        &mut self,
        current: &StateSnapshot,
        flags: DiagnosticFlags,
        boss_defeated: bool,
        player_dead: bool,
    ) -> Evaluation {
        let curr_player = current.player_health.map(f64::from);
        let curr_boss = current.boss_health.map(f64::from);

        let boss_damage = damage(self.prev_boss, curr_boss);
        let player_damage = damage(self.prev_player, curr_player);
        let shaped = boss_damage * self.config.boss_damage_weight
            - player_damage * self.config.player_damage_weight
            - f64::from(flags.count()) * self.config.flag_penalty;

        let changed = moved(self.prev_player, curr_player) || moved(self.prev_boss, curr_boss);
        if !changed && shaped == self.prev_reward {
            self.stale_steps += 1;
        } else {
            self.stale_steps = 0;
        }
        let stale_timeout = self.stale_steps == self.config.stale_limit;
        if stale_timeout {
            warn!(
                "No progress for {} steps, watchdog fired",
                self.config.stale_limit
            );
        }

        self.prev_player = curr_player.or(self.prev_player);
        self.prev_boss = curr_boss.or(self.prev_boss);
        self.prev_reward = shaped;

        let mut reward = shaped;
        if boss_defeated {
            reward += self.config.boss_defeated_bonus;
        }
        if player_dead || stale_timeout {
            reward -= self.config.death_penalty;
        }

        if changed || boss_defeated || player_dead {
            debug!(
                "Boss damage {:.1}, player damage {:.1}, reward {:.2}",
                boss_damage, player_damage, reward
            );
        }

        Evaluation {
            reward,
            boss_damage,
            player_damage,
            shaped,
            stale_steps: self.stale_steps,
            stale_timeout,
        }
    }
}

/// Health lost between two readings; zero when either is unknown
fn damage(prev: Option<f64>, curr: Option<f64>) -> f64 {
    match (prev, curr) {
        (Some(prev), Some(curr)) => (prev - curr).max(0.0),
        _ => 0.0,
    }
}

fn moved(prev: Option<f64>, curr: Option<f64>) -> bool {
    matches!((prev, curr), (Some(prev), Some(curr)) if prev != curr)
}
