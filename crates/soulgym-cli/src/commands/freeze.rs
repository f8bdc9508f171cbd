//! Freeze command implementation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use soulgym::{
    Attach, Config, PointerId, PointerResolver, ProcessAttacher, RetryPolicy, ThreadSleeper, Value,
    ValueFreezer,
};

use super::attach_bridge;
use super::address::format_address;
use crate::input::spawn_keyboard_monitor;
use crate::shutdown::ShutdownSignal;

pub fn run(
    config: &Config,
    name: &str,
    value: &str,
    interval: Duration,
    shutdown: Arc<ShutdownSignal>,
) -> Result<()> {
    let id = PointerId::from_str(name).map_err(|_| anyhow!("Unknown pointer name: {}", name))?;
    let bridge = attach_bridge(config)?;
    let chain = bridge.table().require(id)?.clone();
    let value = Value::parse(chain.value_type, value)?;
    let address = bridge
        .address_of(id)
        .ok_or_else(|| anyhow!("Could not resolve {}", id))?;

    // The worker thread gets its own handle and re-resolves every interval
    let memory = Arc::new(ProcessAttacher.attach(&config.process.name)?);
    let resolver = PointerResolver::new(RetryPolicy::none(), Arc::new(ThreadSleeper));
    let mut freezer = ValueFreezer::start(memory, resolver, chain, id.as_str(), value, interval);
    println!(
        "Freezing {} (now {}) to {} (Esc or q to stop)",
        id,
        format_address(address),
        freezer.value()
    );

    let monitor = spawn_keyboard_monitor(Arc::clone(&shutdown));
    while !shutdown.wait(Duration::from_millis(200)) {}
    freezer.stop();
    let _ = monitor.join();

    println!("Stopped after {} writes", freezer.writes());
    Ok(())
}
