mod cli;
mod commands;
mod input;
mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use soulgym::Config;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use shutdown::ShutdownSignal;

fn main() -> Result<()> {
    // Logs go to stderr so `serve` keeps stdout for the protocol
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("soulgym=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(c) => {
            info!("Loaded config from {:?}", cli.config);
            c
        }
        Err(e) => {
            warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        }
    };
    if let Some(name) = cli.process {
        config.process.name = name;
    }

    let shutdown = Arc::new(ShutdownSignal::new());
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("Shutdown requested");
            shutdown.trigger();
        })?;
    }

    match cli.command {
        Command::Status => commands::status::run(&config),
        Command::Resolve { name } => commands::resolve::run(&config, &name),
        Command::Dump {
            address,
            size,
            floats,
        } => commands::dump::run(&config, &address, size, floats),
        Command::Mutate { action } => commands::mutate::run(&config, action),
        Command::Freeze {
            name,
            value,
            interval_ms,
        } => commands::freeze::run(
            &config,
            &name,
            &value,
            Duration::from_millis(interval_ms),
            shutdown,
        ),
        Command::Run {
            episodes,
            policy,
            seed,
        } => commands::run::run(&config, episodes, policy, seed, shutdown),
        Command::Serve => commands::serve::run(&config, shutdown),
        Command::Config { output } => commands::config::run(&config, &output),
    }
}
