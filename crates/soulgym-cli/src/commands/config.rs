//! Config command implementation.

use std::path::Path;

use anyhow::Result;
use soulgym::Config;

pub fn run(config: &Config, output: &Path) -> Result<()> {
    config.save(output)?;
    println!("Configuration written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soulgym.toml");
        let mut config = Config::default();
        config.episode.max_steps = 250;

        run(&config, &path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.episode.max_steps, 250);
        assert_eq!(loaded.pointer_table().unwrap(), config.pointer_table().unwrap());
    }
}
