//! CLI command implementations.

pub mod address;
pub mod config;
pub mod dump;
pub mod freeze;
pub mod mutate;
pub mod resolve;
pub mod run;
pub mod serve;
pub mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use soulgym::{
    ActionDispatcher, Config, EpisodeController, EpisodeLog, GameStateBridge, KeyboardActuator,
    PointerResolver, ProcessAttacher, SharedSleeper, ThreadSleeper,
};
use tracing::{info, warn};

/// Controller over the live game and the real keyboard
pub type LiveController = EpisodeController<ProcessAttacher, KeyboardActuator>;

/// Attach a bridge to the configured process
pub fn attach_bridge(config: &Config) -> Result<GameStateBridge<ProcessAttacher>> {
    let resolver = PointerResolver::new(config.resolver, Arc::new(ThreadSleeper));
    let mut bridge = GameStateBridge::new(ProcessAttacher, config, resolver)?;
    bridge
        .attach()
        .with_context(|| format!("attaching to {}", config.process.name))?;
    Ok(bridge)
}

/// Build an unattached controller; `reset` performs the attach
pub fn build_controller(config: &Config, sleeper: SharedSleeper) -> Result<LiveController> {
    let resolver = PointerResolver::new(config.resolver, Arc::clone(&sleeper));
    let bridge = GameStateBridge::new(ProcessAttacher, config, resolver)?;
    let keyboard = KeyboardActuator::new(config.keys.clone(), Arc::clone(&sleeper));
    let dispatcher = ActionDispatcher::new(keyboard, config.dispatch.clone());
    let controller = EpisodeController::new(bridge, dispatcher, config, sleeper);

    if !config.session.enabled {
        return Ok(controller);
    }
    let mut log = EpisodeLog::new(&config.session.dir);
    match log.start() {
        Ok(path) => {
            info!("Logging episodes to {}", path.display());
            Ok(controller.with_session_log(log))
        }
        Err(e) => {
            warn!("Episode log disabled: {}", e);
            Ok(controller)
        }
    }
}
