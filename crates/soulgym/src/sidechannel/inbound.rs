use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::bridge::{AnimCategory, Position};

/// Token written by the companion script while locked on
pub const LOCKED_TOKEN: &str = "locked";

/// Boss state reported by the companion script
///
/// First line of the file: `health,x,y,z,angle,anim`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossTelemetry {
    pub health: Option<f32>,
    pub position: Position,
    pub anim: Option<AnimCategory>,
}

impl BossTelemetry {
    /// Parse one telemetry line; `None` if fields are missing or non-numeric
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        if parts.len() < 6 {
            return None;
        }
        let number = |i: usize| parts[i].parse::<f32>().ok().filter(|v| v.is_finite());
        Some(Self {
            health: number(0),
            position: Position {
                x: number(1)?,
                y: number(2)?,
                z: number(3)?,
                angle: number(4)?,
            },
            anim: AnimCategory::from_tag(parts[5]),
        })
    }
}

/// Read the boss telemetry file.
///
/// A missing file is normal before the companion script starts and is only
/// logged at debug level; a malformed one is a warning.
pub fn read_boss_telemetry(path: &Path) -> Option<BossTelemetry> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!("Boss telemetry unavailable ({}): {}", path.display(), e);
            return None;
        }
    };
    let line = content.lines().next().unwrap_or_default();
    let telemetry = BossTelemetry::parse(line);
    if telemetry.is_none() {
        warn!("Malformed boss telemetry in {}: {:?}", path.display(), line);
    }
    telemetry
}

/// Read the lock-on status file; `None` when it does not exist
pub fn read_lock_on(path: &Path) -> Option<bool> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content.trim() == LOCKED_TOKEN),
        Err(e) => {
            debug!("Lock-on status unavailable ({}): {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_line() {
        let telemetry = BossTelemetry::parse("1037,130.5,-64.0,560.25,1.57,A").unwrap();
        assert_eq!(telemetry.health, Some(1037.0));
        assert_eq!(telemetry.position.x, 130.5);
        assert_eq!(telemetry.position.angle, 1.57);
        assert_eq!(telemetry.anim, Some(AnimCategory::Attack));
    }

    #[test]
    fn test_parse_unknown_anim_and_extra_fields() {
        let telemetry = BossTelemetry::parse("900, 1, 2, 3, 4, idle, extra").unwrap();
        assert_eq!(telemetry.anim, None);
        assert_eq!(telemetry.position.z, 3.0);
    }

    #[test]
    fn test_parse_rejects_short_or_bad_lines() {
        assert!(BossTelemetry::parse("1037,1,2,3,4").is_none());
        assert!(BossTelemetry::parse("1037,x,2,3,4,W").is_none());
        assert!(BossTelemetry::parse("").is_none());
    }

    #[test]
    fn test_unparsable_health_is_unknown() {
        let telemetry = BossTelemetry::parse("?,1,2,3,4,W").unwrap();
        assert_eq!(telemetry.health, None);
    }

    #[test]
    fn test_read_boss_telemetry_uses_first_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gundyr_info.txt");
        fs::write(&path, "500,1,2,3,4,T\n0,0,0,0,0,W\n").unwrap();
        let telemetry = read_boss_telemetry(&path).unwrap();
        assert_eq!(telemetry.anim, Some(AnimCategory::Turn));

        assert!(read_boss_telemetry(&dir.path().join("missing.txt")).is_none());
    }

    #[test]
    fn test_read_lock_on() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock_on.txt");
        assert_eq!(read_lock_on(&path), None);

        fs::write(&path, "locked\n").unwrap();
        assert_eq!(read_lock_on(&path), Some(true));

        fs::write(&path, "unlocked").unwrap();
        assert_eq!(read_lock_on(&path), Some(false));
    }
}
