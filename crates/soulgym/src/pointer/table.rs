use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::memory::ValueType;
use crate::memory::layout::vitals;
use crate::pointer::{PointerChain, PointerId};

/// Pointer chains for the player character
const PLAYER_VITALS: [i64; 5] = [0x0454_3F60, 0x28, 0x3A0, 0x70, 0x90];
const PLAYER_POSITION: [i64; 3] = [0x0454_3F60, 0x28, 0x80];
const PLAYER_HEAL_CHARGES: [i64; 8] = [0x0479_5348, 0x8, 0xE0, 0x48, 0x115, 0x5, 0x145, 0xA35];

/// Pointer chains for the encounter
const BOSS_HEALTH: [i64; 8] = [0x0496_48F8, 0x98, 0x200, 0x28, 0x168, 0x10, 0xF0, 0xF28];
const IN_ENCOUNTER: [i64; 2] = [0x0475_72B8, 0xC0];
const BOSS_DEFEATED: [i64; 4] = [0x0475_2F68, 0x40, 0x9C0, 0xAE7];
const LOCK_ON_TARGET: [i64; 1] = [0x0475_0A98];

/// Lookup table from [`PointerId`] to its chain
///
/// Starts from built-in defaults; configured entries replace them by name.
/// `boss_position` has no default and is read from the side channel unless
/// configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTable {
    chains: BTreeMap<PointerId, PointerChain>,
}

impl PointerTable {
    pub fn builtin() -> Self {
        let player_health = PointerChain::new(PLAYER_VITALS, ValueType::I32);
        let chains = BTreeMap::from([
            (
                PointerId::PlayerStamina,
                player_health.shifted(vitals::STAMINA),
            ),
            (PointerId::PlayerHealth, player_health),
            (
                PointerId::PlayerPosition,
                PointerChain::new(PLAYER_POSITION, ValueType::F32),
            ),
            (
                PointerId::PlayerHealCharges,
                PointerChain::new(PLAYER_HEAL_CHARGES, ValueType::I32),
            ),
            (
                PointerId::BossHealth,
                PointerChain::new(BOSS_HEALTH, ValueType::I32),
            ),
            (
                PointerId::InEncounter,
                PointerChain::new(IN_ENCOUNTER, ValueType::Byte),
            ),
            (
                PointerId::BossDefeated,
                PointerChain::new(BOSS_DEFEATED, ValueType::Byte),
            ),
            (
                PointerId::LockOnTarget,
                PointerChain::new(LOCK_ON_TARGET, ValueType::U32),
            ),
        ]);
        Self { chains }
    }

    /// Built-in table with configured overrides applied.
    ///
    /// Unknown names and empty chains are rejected.
    pub fn with_overrides(overrides: &BTreeMap<String, PointerChain>) -> Result<Self> {
        let mut table = Self::builtin();
        for (name, chain) in overrides {
            let id = PointerId::from_str(name)
                .map_err(|_| Error::Config(format!("unknown pointer name: {}", name)))?;
            if chain.is_empty() {
                return Err(Error::Config(format!("pointer {} has no offsets", name)));
            }
            table.chains.insert(id, chain.clone());
        }
        Ok(table)
    }

    pub fn get(&self, id: PointerId) -> Option<&PointerChain> {
        self.chains.get(&id)
    }

    /// Chain for `id`, or [`Error::PointerMissing`]
    pub fn require(&self, id: PointerId) -> Result<&PointerChain> {
        self.get(id)
            .ok_or_else(|| Error::PointerMissing(id.to_string()))
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.chains.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PointerId, &PointerChain)> {
        self.chains.iter().map(|(id, chain)| (*id, chain))
    }

    /// Entries keyed by name, as stored in configuration
    pub fn to_named(&self) -> BTreeMap<String, PointerChain> {
        self.iter()
            .map(|(id, chain)| (id.to_string(), chain.clone()))
            .collect()
    }
}

impl Default for PointerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let table = PointerTable::builtin();
        assert!(table.contains(PointerId::PlayerHealth));
        assert!(!table.contains(PointerId::BossPosition));
        assert_eq!(
            table.require(PointerId::PlayerStamina).unwrap().offsets,
            vec![0x0454_3F60, 0x28, 0x3A0, 0x70, 0xA8]
        );
        assert_eq!(
            table.require(PointerId::BossDefeated).unwrap().value_type,
            ValueType::Byte
        );
    }

    #[test]
    fn test_missing_entry_is_typed_error() {
        let err = PointerTable::builtin()
            .require(PointerId::BossPosition)
            .unwrap_err();
        assert!(matches!(err, Error::PointerMissing(name) if name == "boss_position"));
    }

    #[test]
    fn test_overrides_replace_by_name() {
        let overrides = BTreeMap::from([(
            "boss_position".to_string(),
            PointerChain::new(vec![0x0475_0A98, 0x0, 0x88, 0x18, 0x2428, 0x80], ValueType::F32),
        )]);
        let table = PointerTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.require(PointerId::BossPosition).unwrap().offsets.len(), 6);
        assert!(table.contains(PointerId::PlayerHealth));
    }

    #[test]
    fn test_overrides_reject_unknown_and_empty() {
        let unknown = BTreeMap::from([(
            "mana".to_string(),
            PointerChain::new(vec![0x10], ValueType::I32),
        )]);
        assert!(PointerTable::with_overrides(&unknown).is_err());

        let empty = BTreeMap::from([(
            "boss_health".to_string(),
            PointerChain::new(Vec::new(), ValueType::I32),
        )]);
        assert!(PointerTable::with_overrides(&empty).is_err());
    }
}
