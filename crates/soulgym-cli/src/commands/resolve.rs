//! Resolve command implementation.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use soulgym::{Config, PointerId};

use super::attach_bridge;
use super::address::format_address;

pub fn run(config: &Config, name: &str) -> Result<()> {
    let id = PointerId::from_str(name).map_err(|_| anyhow!("Unknown pointer name: {}", name))?;
    let bridge = attach_bridge(config)?;
    let chain = bridge.table().require(id)?;

    println!("Chain:   {} {}", id, chain);
    match bridge.address_of(id) {
        Some(address) => {
            println!("Address: {}", format_address(address));
            match bridge.read(id) {
                Some(value) => println!("Value:   {} ({})", value, chain.value_type),
                None => println!("Value:   unreadable"),
            }
        }
        None => println!(
            "Address: unresolved after {} attempts",
            bridge.resolver().policy().max_attempts()
        ),
    }
    Ok(())
}
