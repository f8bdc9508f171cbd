//! Memory layout constants for the player and encounter structures
//!
//! Pointer chains themselves are configuration data (see [`crate::pointer`]);
//! these are the fixed offsets relative to a resolved address.

/// Player position block, relative to the resolved X coordinate
pub mod position {
    /// Word size (32-bit float)
    pub const WORD: i64 = 4;

    pub const X: i64 = 0;
    pub const Y: i64 = WORD;
    pub const Z: i64 = WORD * 2;
    /// Facing angle sits before the coordinates
    pub const ANGLE: i64 = -WORD * 3;
}

/// Boss position block, relative to the resolved X coordinate
pub mod boss_position {
    pub const WORD: i64 = 4;

    pub const X: i64 = 0;
    pub const Y: i64 = WORD;
    pub const Z: i64 = WORD * 2;
    pub const ANGLE: i64 = WORD * 4;
}

/// Player vitals, relative to the resolved health value
pub mod vitals {
    pub const STAMINA: i64 = 0x18;
}

/// Encounter flags
pub mod flags {
    /// Bit 7 of the boss flag byte marks the boss as defeated
    pub const DEFEATED_BIT: u8 = 0x80;
}

/// Engine-side limits
pub mod limits {
    /// Full player health
    pub const PLAYER_MAX_HEALTH: i32 = 454;
    /// Full boss health
    pub const BOSS_MAX_HEALTH: i32 = 1037;
}

/// Arena spawn point used when the player cannot re-enter on their own
pub mod arena {
    pub const X: f32 = 124.450_34;
    pub const Y: f32 = -63.953_537;
    pub const Z: f32 = 555.809_02;
    pub const ANGLE: f32 = -2.778_103_4;
}

/// Fog gate trigger band along the x axis (exclusive)
pub mod fog_gate {
    pub const MIN_X: f32 = 122.0;
    pub const MAX_X: f32 = 127.0;
}
