//! Debug utilities for inspecting and pinning game memory
//!
//! This module provides tools for:
//! - Dumping raw memory around an address (`MemoryDump`)
//! - Holding a value in place against game writes (`ValueFreezer`)

mod dump;
mod freeze;

pub use dump::MemoryDump;
pub use freeze::ValueFreezer;
