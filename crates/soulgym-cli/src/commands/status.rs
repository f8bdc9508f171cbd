//! Status command implementation.

use anyhow::Result;
use owo_colors::OwoColorize;
use soulgym::{Config, PointerId};

use super::attach_bridge;

pub fn run(config: &Config) -> Result<()> {
    let bridge = attach_bridge(config)?;
    let snapshot = bridge.snapshot();
    let encounter = bridge.encounter();

    println!("{}", "=== Encounter ===".bold());
    if let Some(memory) = bridge.memory() {
        println!("Process:      {} (pid {})", bridge.process_name(), memory.pid());
    }
    println!(
        "Player HP:    {}",
        health(snapshot.player_health, encounter.player_max_health)
    );
    println!("Stamina:      {}", fmt_opt(snapshot.player_stamina));
    println!("Heal charges: {}", fmt_opt(bridge.player_heal_charges()));
    match snapshot.player_position {
        Some(p) => println!(
            "Position:     ({:.2}, {:.2}, {:.2}) facing {:.2}",
            p.x, p.y, p.z, p.angle
        ),
        None => println!("Position:     {}", "unknown".yellow()),
    }
    println!(
        "Boss HP:      {}",
        health(snapshot.boss_health, encounter.boss_max_health)
    );
    if let Some(p) = snapshot.boss_position {
        println!("Boss at:      ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
    }
    println!(
        "Boss anim:    {}",
        snapshot.boss_anim.map_or("-", |a| a.tag())
    );
    println!(
        "X distance:   {}",
        snapshot
            .x_distance()
            .map_or("-".to_string(), |d| format!("{:.2}", d))
    );

    println!();
    println!("{}", "=== Flags ===".bold());
    println!("In encounter: {}", flag(bridge.in_encounter()));
    println!("Boss beaten:  {}", flag(bridge.boss_defeated()));
    println!("Locked on:    {}", flag(Some(bridge.locked_on_target())));

    println!();
    println!("{}", "=== Chains ===".bold());
    for (id, chain) in bridge.table().iter() {
        let status = match bridge.address_of(id) {
            Some(address) => format!("0x{:X}", address).green().to_string(),
            None => "unresolved".red().to_string(),
        };
        println!("{:<20} {}", id.as_str(), status);
    }
    if !bridge.table().contains(PointerId::BossPosition) {
        println!("{:<20} {}", PointerId::BossPosition.as_str(), "telemetry".dimmed());
    }

    println!();
    println!("Observation: {:?}", snapshot.observation().as_slice());
    Ok(())
}

fn health(value: Option<i32>, max: i32) -> String {
    match value {
        Some(0) => format!("0 / {}", max).red().to_string(),
        Some(v) if v * 4 <= max => format!("{} / {}", v, max).yellow().to_string(),
        Some(v) => format!("{} / {}", v, max).green().to_string(),
        None => "unknown".yellow().to_string(),
    }
}

fn fmt_opt(value: Option<i32>) -> String {
    value.map_or("-".to_string(), |v| v.to_string())
}

fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".green().to_string(),
        Some(false) => "no".to_string(),
        None => "unknown".yellow().to_string(),
    }
}
