use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace};

use crate::action::{Action, ActionInput};
use crate::bridge::StateSnapshot;
use crate::config::DispatchConfig;
use crate::error::Result;
use crate::input::{Actuator, Key};
use crate::retry::Sleeper;

/// Forward-key state carried between steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MovementState {
    /// Last movement value acted on
    pub current: f32,
    pub held: bool,
}

/// One-shot penalties raised by a dispatch and consumed by the reward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticFlags {
    pub whiffed_attack: bool,
    pub useless_dodge: bool,
}

impl DiagnosticFlags {
    /// Number of raised flags
    pub fn count(&self) -> u32 {
        self.whiffed_attack as u32 + self.useless_dodge as u32
    }

    /// Return the flags and clear them
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

/// What the dispatcher needs to know about the encounter
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext<'a> {
    pub snapshot: &'a StateSnapshot,
    pub heal_charges: Option<i32>,
    pub locked_on: bool,
}

/// Turns actions into key events
pub struct ActionDispatcher<K: Actuator> {
    actuator: K,
    config: DispatchConfig,
}

impl<K: Actuator> ActionDispatcher<K> {
    pub fn new(actuator: K, config: DispatchConfig) -> Self {
        Self { actuator, config }
    }

    pub fn actuator(&self) -> &K {
        &self.actuator
    }

    /// Send one action and update the forward key.
    ///
    /// Returns the key tapped for the action, `None` when a heal was
    /// suppressed.
    pub fn dispatch(
        &mut self,
        input: ActionInput,
        context: &DispatchContext<'_>,
        movement: &mut MovementState,
        flags: &mut DiagnosticFlags,
    ) -> Result<Option<Key>> {
        let distance = context.snapshot.x_distance();
        let pressed = match input.action() {
            Action::Attack => {
                self.actuator.press(Key::Attack)?;
                if distance.is_some_and(|d| d > self.config.attack_range) {
                    flags.whiffed_attack = true;
                }
                Some(Key::Attack)
            }
            Action::Dodge => {
                self.actuator.press(Key::Dodge)?;
                if distance.is_some_and(|d| d > self.config.dodge_range) {
                    flags.useless_dodge = true;
                }
                Some(Key::Dodge)
            }
            Action::Heal => {
                if self.heal_allowed(context) {
                    self.actuator.press(Key::Heal)?;
                    Some(Key::Heal)
                } else {
                    debug!(
                        "Heal suppressed (health {:?}, charges {:?})",
                        context.snapshot.player_health, context.heal_charges
                    );
                    None
                }
            }
        };

        self.update_movement(input.movement(), context.locked_on, movement)?;
        Ok(pressed)
    }

    fn heal_allowed(&self, context: &DispatchContext<'_>) -> bool {
        let low = context
            .snapshot
            .player_health
            .is_some_and(|h| h <= self.config.heal_health_threshold);
        let stocked = context
            .heal_charges
            .is_some_and(|c| c > self.config.min_heal_charges);
        low && stocked
    }

    /// Apply hysteresis to the forward key
    pub fn update_movement(
        &mut self,
        target: f32,
        locked_on: bool,
        state: &mut MovementState,
    ) -> Result<()> {
        if (target - state.current).abs() > self.config.hysteresis {
            self.actuator.key_up(Key::Forward)?;
            state.held = false;
            if target > self.config.movement_threshold && locked_on {
                self.actuator.key_down(Key::Forward)?;
                state.held = true;
                trace!("Holding forward ({:.2})", target);
            }
            state.current = target;
        } else if state.held && !locked_on {
            self.actuator.key_up(Key::Forward)?;
            state.held = false;
            trace!("Released forward, lock-on lost");
        }
        Ok(())
    }

    /// Release the forward key and forget the movement value
    pub fn release_all(&mut self, state: &mut MovementState) -> Result<()> {
        self.actuator.key_up(Key::Forward)?;
        *state = MovementState::default();
        Ok(())
    }

    pub fn press(&mut self, key: Key) -> Result<()> {
        self.actuator.press(key)
    }

    /// Hold `key` for `duration`
    pub fn hold(&mut self, key: Key, duration: Duration, sleeper: &dyn Sleeper) -> Result<()> {
        self.actuator.key_down(key)?;
        sleeper.sleep(duration);
        self.actuator.key_up(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::Position;
    use crate::input::{KeyEvent, RecordingActuator};
    use crate::retry::VirtualClock;

    fn snapshot(health: i32, player_x: f32, boss_x: f32) -> StateSnapshot {
        StateSnapshot {
            player_health: Some(health),
            player_position: Some(Position { x: player_x, ..Default::default() }),
            boss_position: Some(Position { x: boss_x, ..Default::default() }),
            ..Default::default()
        }
    }

    fn dispatcher() -> (ActionDispatcher<RecordingActuator>, RecordingActuator) {
        let recorder = RecordingActuator::new();
        (
            ActionDispatcher::new(recorder.clone(), DispatchConfig::default()),
            recorder,
        )
    }

    fn input(action: Action, movement: f32) -> ActionInput {
        ActionInput::new(action, movement).unwrap()
    }

    #[test]
    fn test_attack_in_range_sets_no_flag() {
        let (mut dispatcher, recorder) = dispatcher();
        let snap = snapshot(454, 120.0, 124.0);
        let context = DispatchContext { snapshot: &snap, heal_charges: Some(3), locked_on: true };
        let mut movement = MovementState::default();
        let mut flags = DiagnosticFlags::default();

        let pressed = dispatcher
            .dispatch(input(Action::Attack, 0.0), &context, &mut movement, &mut flags)
            .unwrap();
        assert_eq!(pressed, Some(Key::Attack));
        assert_eq!(flags, DiagnosticFlags::default());
        assert_eq!(recorder.presses(), vec![Key::Attack]);
    }

    #[test]
    fn test_far_attack_and_dodge_raise_flags() {
        let (mut dispatcher, _) = dispatcher();
        let snap = snapshot(454, 120.0, 125.5);
        let context = DispatchContext { snapshot: &snap, heal_charges: Some(3), locked_on: true };
        let mut movement = MovementState::default();
        let mut flags = DiagnosticFlags::default();

        dispatcher
            .dispatch(input(Action::Attack, 0.0), &context, &mut movement, &mut flags)
            .unwrap();
        dispatcher
            .dispatch(input(Action::Dodge, 0.0), &context, &mut movement, &mut flags)
            .unwrap();
        assert!(flags.whiffed_attack);
        assert!(flags.useless_dodge);
        assert_eq!(flags.count(), 2);

        let taken = flags.take();
        assert_eq!(taken.count(), 2);
        assert_eq!(flags.count(), 0);
    }

    #[test]
    fn test_dodge_threshold_is_strict() {
        let (mut dispatcher, _) = dispatcher();
        let snap = snapshot(454, 120.0, 124.0);
        let context = DispatchContext { snapshot: &snap, heal_charges: None, locked_on: false };
        let mut flags = DiagnosticFlags::default();
        dispatcher
            .dispatch(input(Action::Dodge, 0.0), &context, &mut MovementState::default(), &mut flags)
            .unwrap();
        assert!(!flags.useless_dodge);
    }

    #[test]
    fn test_heal_gate() {
        let (mut dispatcher, recorder) = dispatcher();
        let mut movement = MovementState::default();
        let mut flags = DiagnosticFlags::default();

        for (health, charges, expect) in [
            (250, Some(2), true),
            (251, Some(2), false),
            (100, Some(1), false),
            (100, None, false),
        ] {
            recorder.clear();
            let snap = snapshot(health, 0.0, 0.0);
            let context = DispatchContext { snapshot: &snap, heal_charges: charges, locked_on: false };
            let pressed = dispatcher
                .dispatch(input(Action::Heal, 0.0), &context, &mut movement, &mut flags)
                .unwrap();
            assert_eq!(pressed.is_some(), expect, "health {} charges {:?}", health, charges);
            assert_eq!(recorder.presses().contains(&Key::Heal), expect);
        }
    }

    #[test]
    fn test_movement_hysteresis() {
        let (mut dispatcher, recorder) = dispatcher();
        let mut state = MovementState::default();

        dispatcher.update_movement(1.0, true, &mut state).unwrap();
        assert!(state.held);
        assert!(recorder.is_held(Key::Forward));

        // Within hysteresis: no events
        recorder.clear();
        dispatcher.update_movement(0.97, true, &mut state).unwrap();
        assert!(recorder.events().is_empty());
        assert_eq!(state.current, 1.0);

        // Large drop below threshold releases
        dispatcher.update_movement(0.05, true, &mut state).unwrap();
        assert!(!state.held);
        assert_eq!(recorder.events(), vec![KeyEvent::Up(Key::Forward)]);
        assert_eq!(state.current, 0.05);
    }

    #[test]
    fn test_movement_requires_lock_on() {
        let (mut dispatcher, recorder) = dispatcher();
        let mut state = MovementState::default();

        dispatcher.update_movement(1.0, false, &mut state).unwrap();
        assert!(!state.held);
        assert!(!recorder.is_held(Key::Forward));
        assert_eq!(state.current, 1.0);

        // Losing lock-on releases a held key even without a value change
        dispatcher.update_movement(0.0, true, &mut state).unwrap();
        dispatcher.update_movement(1.0, true, &mut state).unwrap();
        assert!(state.held);
        dispatcher.update_movement(1.0, false, &mut state).unwrap();
        assert!(!state.held);
        assert!(!recorder.is_held(Key::Forward));
    }

    #[test]
    fn test_release_all_resets_state() {
        let (mut dispatcher, recorder) = dispatcher();
        let mut state = MovementState { current: 1.0, held: true };
        dispatcher.release_all(&mut state).unwrap();
        assert_eq!(state, MovementState::default());
        assert_eq!(recorder.events(), vec![KeyEvent::Up(Key::Forward)]);
    }

    #[test]
    fn test_hold_sleeps_between_events() {
        let (mut dispatcher, recorder) = dispatcher();
        let clock = VirtualClock::new();
        dispatcher
            .hold(Key::Forward, Duration::from_millis(900), &clock)
            .unwrap();
        assert_eq!(
            recorder.events(),
            vec![KeyEvent::Down(Key::Forward), KeyEvent::Up(Key::Forward)]
        );
        assert_eq!(clock.delays(), vec![Duration::from_millis(900)]);
    }
}
