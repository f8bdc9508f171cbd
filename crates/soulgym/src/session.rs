//! Per-episode session log.
//!
//! One NDJSON line per finished episode, under
//! `<dir>/<YYYY-MM-DD>/episodes_<HHMMSS>.jsonl`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::episode::DeathReason;
use crate::error::Result;

/// Summary of one finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub timestamp: DateTime<Local>,
    pub episode: u32,
    pub steps: u32,
    pub total_reward: f64,
    pub death_reason: String,
}

impl EpisodeRecord {
    pub fn new(episode: u32, steps: u32, total_reward: f64, death_reason: DeathReason) -> Self {
        Self {
            timestamp: Local::now(),
            episode,
            steps,
            total_reward,
            death_reason: death_reason.to_string(),
        }
    }
}

pub struct EpisodeLog {
    base_dir: PathBuf,
    current: Option<PathBuf>,
}

impl EpisodeLog {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            current: None,
        }
    }

    /// Open a new log file for this run
    pub fn start(&mut self) -> Result<PathBuf> {
        let now: DateTime<Local> = Local::now();
        let dir = self.base_dir.join(now.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir)?;

        let file = dir.join(format!("episodes_{}.jsonl", now.format("%H%M%S")));
        self.current = Some(file.clone());
        Ok(file)
    }

    /// Append one record; a no-op before [`EpisodeLog::start`]
    pub fn append(&self, record: &EpisodeRecord) -> Result<()> {
        if let Some(ref path) = self.current {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            writeln!(file, "{}", serde_json::to_string(record)?)?;
        }
        Ok(())
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_before_start_is_noop() {
        let dir = tempdir().unwrap();
        let log = EpisodeLog::new(dir.path());
        log.append(&EpisodeRecord::new(1, 10, 5.0, DeathReason::Timeout))
            .unwrap();
        assert!(log.current_path().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_records_are_json_lines() {
        let dir = tempdir().unwrap();
        let mut log = EpisodeLog::new(dir.path());
        let path = log.start().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(path.extension().unwrap(), "jsonl");

        log.append(&EpisodeRecord::new(1, 120, 37.5, DeathReason::BossDead))
            .unwrap();
        log.append(&EpisodeRecord::new(2, 1000, -3.0, DeathReason::Timeout))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let records: Vec<EpisodeRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].death_reason, "boss dead");
        assert_eq!(records[1].steps, 1000);
        assert_eq!(records[1].total_reward, -3.0);
    }
}
