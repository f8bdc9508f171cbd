//! Episode lifecycle over the live encounter.
//!
//! [`EpisodeController`] owns the bridge, the dispatcher and the reward
//! engine, and drives them through `reset` and `step`:
//!
//! ```text
//! Detached -> AwaitingArena -> Ready -> Active -> Terminal
//!     ^                                    |          |
//!     +------------ process exit ----------+   reset -+
//! ```
//!
//! All waits go through the injected [`Sleeper`](crate::retry::Sleeper), so
//! the whole lifecycle runs under a virtual clock in tests.
//!
//! ## Example
//!
//! ```ignore
//! let mut controller = EpisodeController::new(bridge, dispatcher, &config, sleeper);
//! let mut observation = controller.reset()?;
//! loop {
//!     let result = controller.step(ActionInput::from_raw(0, Some(1.0))?)?;
//!     if result.terminated || result.truncated {
//!         break;
//!     }
//!     observation = result.observation;
//! }
//! ```

mod state;

pub use state::{DeathReason, EpisodeState, Phase, StepInfo, StepResult};

use tracing::{debug, error, info, warn};

use crate::action::ActionInput;
use crate::bridge::{GameStateBridge, Observation};
use crate::config::{Config, EpisodeConfig};
use crate::error::{Error, Result};
use crate::input::{ActionDispatcher, Actuator, DispatchContext, Key, MovementState};
use crate::memory::Attach;
use crate::retry::{RetryPolicy, SharedSleeper};
use crate::reward::RewardEngine;
use crate::session::{EpisodeLog, EpisodeRecord};

/// Drives episodes against one game process
pub struct EpisodeController<A: Attach, K: Actuator> {
    bridge: GameStateBridge<A>,
    dispatcher: ActionDispatcher<K>,
    reward: RewardEngine,
    config: EpisodeConfig,
    sleeper: SharedSleeper,
    phase: Phase,
    state: Option<EpisodeState>,
    movement: MovementState,
    episodes: u32,
    session_log: Option<EpisodeLog>,
}

impl<A: Attach, K: Actuator> EpisodeController<A, K> {
    pub fn new(
        bridge: GameStateBridge<A>,
        dispatcher: ActionDispatcher<K>,
        config: &Config,
        sleeper: SharedSleeper,
    ) -> Self {
        Self {
            bridge,
            dispatcher,
            reward: RewardEngine::new(config.reward.clone()),
            config: config.episode.clone(),
            sleeper,
            phase: Phase::Detached,
            state: None,
            movement: MovementState::default(),
            episodes: 0,
            session_log: None,
        }
    }

    /// Record every finished episode to `log`
    pub fn with_session_log(mut self, log: EpisodeLog) -> Self {
        self.session_log = Some(log);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> Option<&EpisodeState> {
        self.state.as_ref()
    }

    /// Episodes started so far
    pub fn episodes(&self) -> u32 {
        self.episodes
    }

    pub fn bridge(&self) -> &GameStateBridge<A> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut GameStateBridge<A> {
        &mut self.bridge
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<K> {
        &self.dispatcher
    }

    pub fn session_log(&self) -> Option<&EpisodeLog> {
        self.session_log.as_ref()
    }

    // ---- reset ----

    /// Bring the encounter to a fresh start and return the first observation.
    ///
    /// Only attach failures are returned; every other problem on the way is
    /// logged and the reset carries on.
    pub fn reset(&mut self) -> Result<Observation> {
        self.release_movement();
        if let Some(previous) = self.state.take() {
            debug!(
                "Discarding episode {} after {} steps",
                previous.number, previous.steps
            );
        }

        if let Err(e) = self.ensure_attached() {
            error!("Could not attach to {}: {}", self.bridge.process_name(), e);
            self.phase = Phase::Detached;
            return Err(e);
        }
        self.phase = Phase::AwaitingArena;

        self.sleeper.sleep(self.config.settle_delay);

        if self.bridge.boss_defeated() == Some(true) {
            self.clear_victory();
        }

        self.wait_for_arena();
        self.phase = Phase::Ready;
        self.wait_until_ready();

        if let Err(e) = self.bridge.ensure_alive() {
            error!("Process lost during reset: {}", e);
            self.phase = Phase::Detached;
            return Err(e);
        }

        let snapshot = self.bridge.snapshot();
        self.reward.prime(&snapshot);
        self.episodes += 1;
        let observation = snapshot.observation();
        info!(
            "Episode {} started (player {:?}, boss {:?})",
            self.episodes, snapshot.player_health, snapshot.boss_health
        );
        self.state = Some(EpisodeState::new(self.episodes, snapshot));
        self.phase = Phase::Active;
        Ok(observation)
    }

    fn ensure_attached(&mut self) -> Result<()> {
        if self.bridge.is_attached() {
            match self.bridge.ensure_alive() {
                Ok(()) => return Ok(()),
                Err(e) => warn!("{}, attaching again", e),
            }
        }
        self.bridge.attach()
    }

    /// Undo a previous win so the boss is fought again
    fn clear_victory(&mut self) {
        info!("Boss defeated flag set, restoring encounter");
        if let Err(e) = self.bridge.clear_defeated_flag() {
            warn!("Could not clear boss defeated flag: {}", e);
        }
        if let Err(e) = self.bridge.kill_player() {
            warn!("Could not kill player: {}", e);
        }
        self.sleeper.sleep(self.config.respawn_delay);
    }

    fn wait_for_arena(&mut self) {
        let attempts = self.config.reentry_attempts;
        for attempt in 1..=attempts {
            if self.bridge.in_encounter() == Some(true) {
                debug!("In encounter after {} polls", attempt);
                self.heal();
                return;
            }

            self.sleeper.sleep(self.config.reentry_poll);
            if self.at_fog_gate() {
                if let Err(e) = self.approach_fog_gate() {
                    warn!("Fog gate approach failed: {}", e);
                }
            }
            if let Err(e) = self.bridge.side_channel().trigger_reset() {
                warn!("Could not write reset trigger: {}", e);
            }
        }

        warn!("Encounter not entered after {} polls, teleporting", attempts);
        if let Err(e) = self.bridge.teleport_to_encounter() {
            warn!("Teleport failed: {}", e);
        }
        self.heal();
    }

    fn wait_until_ready(&self) {
        let policy = RetryPolicy::new(
            self.config.ready_attempts.saturating_sub(1),
            self.config.ready_poll,
        );
        let bridge = &self.bridge;
        let alive = policy.run(&*self.sleeper, |_| {
            bridge.player_health().filter(|health| *health > 0)
        });
        if alive.is_none() {
            warn!(
                "Player not alive after {} checks, starting anyway",
                policy.max_attempts()
            );
        }
    }

    fn at_fog_gate(&self) -> bool {
        let encounter = self.bridge.encounter();
        self.bridge
            .player_position()
            .is_some_and(|p| p.x > encounter.fog_gate_min_x && p.x < encounter.fog_gate_max_x)
    }

    /// Walk through the fog gate and try to lock on
    fn approach_fog_gate(&mut self) -> Result<()> {
        debug!("Player at fog gate, walking in");
        self.dispatcher
            .hold(Key::Forward, self.config.approach_hold, &*self.sleeper)?;
        self.dispatcher.press(Key::Interact)?;
        self.sleeper.sleep(self.config.approach_wait);
        self.dispatcher.press(Key::LockOn)?;
        self.sleeper.sleep(self.config.approach_wait);
        Ok(())
    }

    fn heal(&self) {
        if let Err(e) = self.bridge.heal_player() {
            warn!("Could not heal player: {}", e);
        }
    }

    // ---- step ----

    /// Apply one action and advance the episode by one tick
    pub fn step(&mut self, input: ActionInput) -> Result<StepResult> {
        if self.phase != Phase::Active {
            return Err(self.wrong_phase());
        }
        if let Err(e) = self.bridge.ensure_alive() {
            error!("Episode aborted: {}", e);
            self.phase = Phase::Detached;
            self.state = None;
            self.movement = MovementState::default();
            return Err(e);
        }

        let in_encounter = self.bridge.in_encounter() == Some(true);
        let locked_on = if in_encounter {
            self.acquire_lock_on()
        } else {
            self.bridge.locked_on_target()
        };
        let mut action_skipped = in_encounter && !locked_on;

        let Some(state) = self.state.as_mut() else {
            return Err(Error::InvalidPhase {
                expected: Phase::Active.as_str(),
                actual: Phase::Ready.as_str(),
            });
        };

        // Input failures cost this step's action, not the episode
        if action_skipped {
            debug!("Not locked on, skipping {}", input.action());
            if let Err(e) = self
                .dispatcher
                .update_movement(input.movement(), false, &mut self.movement)
            {
                warn!("Could not update movement: {}", e);
            }
        } else {
            let current = self.bridge.snapshot();
            let context = DispatchContext {
                snapshot: &current,
                heal_charges: self.bridge.player_heal_charges(),
                locked_on,
            };
            if let Err(e) =
                self.dispatcher
                    .dispatch(input, &context, &mut self.movement, &mut state.flags)
            {
                warn!("Could not send {}: {}", input.action(), e);
                action_skipped = true;
            }
        }

        self.sleeper.sleep(self.config.tick);

        let snapshot = self.bridge.snapshot();
        let boss_defeated = self.bridge.boss_defeated() == Some(true);
        let mut player_dead = snapshot.player_health == Some(0);
        let evaluation =
            self.reward
                .evaluate(&snapshot, state.flags.take(), boss_defeated, player_dead);
        if evaluation.stale_timeout {
            if let Err(e) = self.bridge.kill_player() {
                warn!("Could not kill stale player: {}", e);
            }
            player_dead = true;
        }

        state.steps += 1;
        state.total_reward += evaluation.reward;

        let death_reason = if boss_defeated {
            DeathReason::BossDead
        } else if player_dead {
            DeathReason::PlayerDead
        } else if state.steps >= self.config.max_steps {
            DeathReason::Timeout
        } else {
            DeathReason::Alive
        };

        let observation = snapshot.observation();
        state.last_snapshot = snapshot;
        let info = StepInfo {
            death_reason,
            step: state.steps,
            watchdog_fired: evaluation.stale_timeout,
            action_skipped,
        };
        let record = EpisodeRecord::new(state.number, state.steps, state.total_reward, death_reason);

        if death_reason != DeathReason::Alive {
            self.finish(record, death_reason);
        }

        Ok(StepResult {
            observation,
            reward: evaluation.reward,
            terminated: death_reason.is_terminated(),
            truncated: death_reason.is_truncated(),
            info,
        })
    }

    /// Make sure the player is locked on to the boss.
    ///
    /// Turns through the configured angles, pressing lock-on at each, until
    /// the lock is reported. A failed key press gives up for this step.
    fn acquire_lock_on(&mut self) -> bool {
        if self.bridge.locked_on_target() {
            return true;
        }

        let angles = self.bridge.encounter().lock_on_angles.clone();
        for angle in angles {
            if let Err(e) = self.bridge.set_player_angle(angle) {
                warn!("Could not turn player to {}: {}", angle, e);
                continue;
            }
            self.sleeper.sleep(self.config.lock_on_turn_delay);
            if let Err(e) = self.dispatcher.press(Key::LockOn) {
                warn!("Could not press lock-on: {}", e);
                return false;
            }
            self.sleeper.sleep(self.config.lock_on_check_delay);
            if self.bridge.locked_on_target() {
                debug!("Locked on at angle {}", angle);
                return true;
            }
        }

        debug!("Lock-on not acquired");
        false
    }

    fn finish(&mut self, record: EpisodeRecord, reason: DeathReason) {
        self.release_movement();
        if reason == DeathReason::BossDead && self.config.gesture_on_victory {
            if let Err(e) = self.gesture() {
                warn!("Victory gesture failed: {}", e);
            }
        }

        info!(
            "Episode {} finished: {} after {} steps, total reward {:.2}",
            record.episode, reason, record.steps, record.total_reward
        );
        if let Some(log) = &self.session_log {
            if let Err(e) = log.append(&record) {
                warn!("Could not write episode log: {}", e);
            }
        }
        self.phase = Phase::Terminal;
    }

    /// `g`, `r`, `g`
    fn gesture(&mut self) -> Result<()> {
        for (i, key) in [Key::Gesture, Key::Heal, Key::Gesture].into_iter().enumerate() {
            if i > 0 {
                self.sleeper.sleep(self.config.gesture_gap);
            }
            self.dispatcher.press(key)?;
        }
        Ok(())
    }

    // ---- teardown ----

    /// Release held keys and drop the process handle
    pub fn close(&mut self) {
        self.release_movement();
        self.state = None;
        self.bridge.detach();
        self.phase = Phase::Detached;
    }

    fn release_movement(&mut self) {
        if let Err(e) = self.dispatcher.release_all(&mut self.movement) {
            warn!("Could not release movement keys: {}", e);
        }
    }

    fn wrong_phase(&self) -> Error {
        Error::InvalidPhase {
            expected: Phase::Active.as_str(),
            actual: self.phase.as_str(),
        }
    }
}
