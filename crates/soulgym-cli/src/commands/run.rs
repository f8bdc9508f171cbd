//! Run command implementation.
//!
//! Drives whole episodes with a fixed policy, mainly to check the loop
//! end to end before connecting a learner.

use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use soulgym::{Action, ActionInput, Config, DeathReason};
use tracing::info;

use super::build_controller;
use crate::cli::Policy;
use crate::input::spawn_keyboard_monitor;
use crate::shutdown::ShutdownSignal;

/// Chooses actions for the run command
pub struct PolicyDriver {
    policy: Policy,
    rng: SmallRng,
}

impl PolicyDriver {
    pub fn new(policy: Policy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self { policy, rng }
    }

    pub fn next(&mut self) -> Result<ActionInput> {
        let input = match self.policy {
            Policy::Random => {
                let action = self.rng.random_range(0..Action::COUNT as i64);
                let movement = self.rng.random_range(0.0..=1.0);
                ActionInput::from_raw(action, Some(movement))?
            }
            Policy::Attack => ActionInput::from(Action::Attack),
        };
        Ok(input)
    }
}

pub fn run(
    config: &Config,
    episodes: u32,
    policy: Policy,
    seed: Option<u64>,
    shutdown: Arc<ShutdownSignal>,
) -> Result<()> {
    let mut controller = build_controller(config, shutdown.clone())?;
    let mut driver = PolicyDriver::new(policy, seed);
    let monitor = spawn_keyboard_monitor(Arc::clone(&shutdown));

    println!("Running {} episode(s), press Esc or q to stop", episodes);
    let mut outcome = Ok(());
    for _ in 0..episodes {
        if shutdown.is_shutdown() {
            break;
        }
        if let Err(e) = controller.reset() {
            outcome = Err(e.into());
            break;
        }

        let mut total = 0.0;
        let mut last = None;
        while !shutdown.is_shutdown() {
            let result = match controller.step(driver.next()?) {
                Ok(result) => result,
                Err(e) => {
                    outcome = Err(e.into());
                    break;
                }
            };
            total += result.reward;
            if result.terminated || result.truncated {
                last = Some(result.info);
                break;
            }
        }
        if outcome.is_err() {
            break;
        }

        if let Some(info) = last {
            let reason = match info.death_reason {
                DeathReason::BossDead => info.death_reason.as_str().green().to_string(),
                DeathReason::PlayerDead => info.death_reason.as_str().red().to_string(),
                _ => info.death_reason.as_str().yellow().to_string(),
            };
            println!(
                "Episode {}: {} after {} steps, reward {:.2}",
                controller.episodes(),
                reason,
                info.step,
                total
            );
        }
    }

    controller.close();
    shutdown.trigger();
    let _ = monitor.join();
    info!("Run finished after {} episode(s)", controller.episodes());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_random_policy_is_repeatable() {
        let mut a = PolicyDriver::new(Policy::Random, Some(42));
        let mut b = PolicyDriver::new(Policy::Random, Some(42));
        for _ in 0..50 {
            let (x, y) = (a.next().unwrap(), b.next().unwrap());
            assert_eq!(x, y);
            assert!((0.0..=1.0).contains(&x.movement()));
        }
    }

    #[test]
    fn test_attack_policy() {
        let mut driver = PolicyDriver::new(Policy::Attack, None);
        let input = driver.next().unwrap();
        assert_eq!(input.action(), Action::Attack);
        assert_eq!(input.movement(), 1.0);
    }
}
