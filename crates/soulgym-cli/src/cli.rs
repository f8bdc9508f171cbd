use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "soulgym")]
#[command(about = "Dark Souls III encounter bridge for reinforcement learning")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "soulgym.toml", env = "SOULGYM_CONFIG", global = true)]
    pub config: PathBuf,

    /// Override the target process name
    #[arg(long, global = true)]
    pub process: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Attach and print one snapshot of the encounter
    Status,

    /// Resolve one named pointer chain
    Resolve {
        /// Chain name (e.g. player_health)
        name: String,
    },

    /// Dump memory at an address
    Dump {
        /// Address: hex (`0x1445A2F60`) or module-relative (`base+0x4543F60`)
        address: String,

        /// Bytes to read
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Show 4-byte words as integers and floats instead of hex rows
        #[arg(long)]
        floats: bool,
    },

    /// Apply a one-shot change to the game
    Mutate {
        #[command(subcommand)]
        action: MutateAction,
    },

    /// Keep rewriting a named value until Esc, q or Ctrl+C
    Freeze {
        /// Chain name (e.g. player_health)
        name: String,

        /// Value to hold, parsed as the chain's type
        value: String,

        #[arg(long, default_value_t = 50)]
        interval_ms: u64,
    },

    /// Drive episodes locally with a simple policy
    Run {
        #[arg(short, long, default_value_t = 1)]
        episodes: u32,

        #[arg(short, long, value_enum, default_value_t = Policy::Random)]
        policy: Policy,

        /// Seed for the random policy
        #[arg(long)]
        seed: Option<u64>,
    },

    /// JSON-lines control loop on stdin/stdout
    Serve,

    /// Write the effective configuration
    Config {
        #[arg(short, long, default_value = "soulgym.toml")]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum MutateAction {
    /// Restore full health
    Heal,
    /// Set player health to zero
    Kill,
    /// Move the player to the arena spawn point
    Teleport,
    /// Clear the boss defeated flag
    ClearFlag,
    /// Set the player's facing angle
    Angle {
        #[arg(allow_negative_numbers = true)]
        value: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Uniform random action and movement
    Random,
    /// Always attack while walking forward
    Attack,
}
