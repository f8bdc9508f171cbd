use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Token the companion script waits for before re-running its reset
pub const RESET_TOKEN: &str = "reset";

/// Ask the companion script to move the player back to the arena
pub fn write_reset_trigger(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, RESET_TOKEN)?;
    debug!("Wrote reset trigger to {}", path.display());
    Ok(())
}
