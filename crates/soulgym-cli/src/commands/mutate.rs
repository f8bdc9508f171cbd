//! Mutate command implementation.

use anyhow::Result;
use soulgym::Config;

use super::attach_bridge;
use crate::cli::MutateAction;

pub fn run(config: &Config, action: MutateAction) -> Result<()> {
    let bridge = attach_bridge(config)?;
    match action {
        MutateAction::Heal => {
            bridge.heal_player()?;
            println!("Player healed to {}", bridge.encounter().heal_value);
        }
        MutateAction::Kill => {
            bridge.kill_player()?;
            println!("Player killed");
        }
        MutateAction::Teleport => {
            bridge.teleport_to_encounter()?;
            let spawn = bridge.encounter().arena_spawn;
            println!(
                "Teleported to ({:.2}, {:.2}, {:.2})",
                spawn.x, spawn.y, spawn.z
            );
        }
        MutateAction::ClearFlag => {
            let (old, new) = bridge.clear_defeated_flag()?;
            println!("Boss defeated flag 0x{:02X} -> 0x{:02X}", old, new);
        }
        MutateAction::Angle { value } => {
            bridge.set_player_angle(value)?;
            println!("Player angle set to {}", value);
        }
    }
    Ok(())
}
