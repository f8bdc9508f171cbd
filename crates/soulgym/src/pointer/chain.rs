use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::memory::ValueType;

/// Named entries of the pointer table
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointerId {
    PlayerHealth,
    PlayerStamina,
    /// X coordinate; Y, Z and angle follow the position layout
    PlayerPosition,
    PlayerHealCharges,
    BossHealth,
    /// X coordinate; Y, Z and angle follow the boss position layout
    BossPosition,
    InEncounter,
    BossDefeated,
    LockOnTarget,
}

impl PointerId {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Ordered offset chain ending in a typed value
///
/// Every offset but the last is added and then dereferenced as a 64-bit
/// pointer; the last is only added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerChain {
    pub offsets: Vec<i64>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Absolute start address; the main module base when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<u64>,
}

impl PointerChain {
    pub fn new(offsets: impl Into<Vec<i64>>, value_type: ValueType) -> Self {
        Self {
            offsets: offsets.into(),
            value_type,
            base: None,
        }
    }

    pub fn with_base(mut self, base: u64) -> Self {
        self.base = Some(base);
        self
    }

    /// Same chain with the last offset shifted by `delta`
    pub fn shifted(&self, delta: i64) -> Self {
        let mut chain = self.clone();
        if let Some(last) = chain.offsets.last_mut() {
            *last += delta;
        }
        chain
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl std::fmt::Display for PointerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.base {
            Some(base) => write!(f, "[{:#x}]", base)?,
            None => write!(f, "[base]")?,
        }
        for offset in &self.offsets {
            if *offset < 0 {
                write!(f, " -{:#x}", offset.unsigned_abs())?;
            } else {
                write!(f, " +{:#x}", offset)?;
            }
        }
        write!(f, " : {}", self.value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_pointer_id_names() {
        assert_eq!(PointerId::PlayerHealCharges.as_str(), "player_heal_charges");
        assert_eq!(
            PointerId::from_str("lock_on_target").unwrap(),
            PointerId::LockOnTarget
        );
        assert_eq!(PointerId::iter().count(), 9);
    }

    #[test]
    fn test_shifted_changes_last_offset_only() {
        let chain = PointerChain::new(vec![0x100, 0x28, 0x90], ValueType::I32);
        assert_eq!(chain.shifted(0x18).offsets, vec![0x100, 0x28, 0xA8]);
        assert_eq!(chain.shifted(-0xC).offsets, vec![0x100, 0x28, 0x84]);
    }

    #[test]
    fn test_display() {
        let chain = PointerChain::new(vec![0x10, -0x8], ValueType::Byte);
        assert_eq!(chain.to_string(), "[base] +0x10 -0x8 : byte");
    }
}
