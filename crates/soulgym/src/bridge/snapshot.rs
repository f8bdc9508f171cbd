use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// Width of the observation vector
pub const OBSERVATION_WIDTH: usize = 15;

/// Encoding of an unknown numeric value in the observation
pub const UNKNOWN: f32 = -1.0;

/// Coarse boss animation category reported by the companion script
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    FromRepr,
    EnumString,
    IntoStaticStr,
    Display,
    EnumIter,
)]
#[repr(u8)]
pub enum AnimCategory {
    #[strum(serialize = "W")]
    Walk = 0,
    #[strum(serialize = "E")]
    Engage = 1,
    #[strum(serialize = "A")]
    Attack = 2,
    #[strum(serialize = "T")]
    Turn = 3,
}

impl AnimCategory {
    /// Parse a category tag; anything unrecognized is `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.trim().parse().ok()
    }

    pub fn tag(&self) -> &'static str {
        self.into()
    }

    /// One-hot encoding in W, E, A, T order; unknown is all zeros
    pub fn one_hot(category: Option<Self>) -> [f32; 4] {
        let mut encoded = [0.0; 4];
        if let Some(category) = category {
            encoded[category as usize] = 1.0;
        }
        encoded
    }
}

/// Position plus facing angle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub angle: f32,
}

/// One sample of the encounter, built fresh every step
///
/// `None` marks a value that could not be read or fell out of range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateSnapshot {
    pub player_health: Option<i32>,
    pub player_stamina: Option<i32>,
    pub player_position: Option<Position>,
    pub boss_health: Option<i32>,
    pub boss_position: Option<Position>,
    pub boss_anim: Option<AnimCategory>,
}

impl StateSnapshot {
    /// Fixed-width observation vector
    pub fn observation(&self) -> Observation {
        let health = |v: Option<i32>| v.map_or(UNKNOWN, |v| v as f32);
        let position = |p: Option<Position>| match p {
            Some(p) => [p.x, p.y, p.z, p.angle],
            None => [UNKNOWN; 4],
        };

        let mut values = [0.0; OBSERVATION_WIDTH];
        values[0] = health(self.player_health);
        values[1] = health(self.player_stamina);
        values[2..6].copy_from_slice(&position(self.player_position));
        values[6] = health(self.boss_health);
        values[7..11].copy_from_slice(&position(self.boss_position));
        values[11..15].copy_from_slice(&AnimCategory::one_hot(self.boss_anim));
        Observation(values)
    }

    pub fn player_x(&self) -> Option<f32> {
        self.player_position.map(|p| p.x)
    }

    pub fn boss_x(&self) -> Option<f32> {
        self.boss_position.map(|p| p.x)
    }

    /// Distance between player and boss along the x axis
    pub fn x_distance(&self) -> Option<f32> {
        Some((self.player_x()? - self.boss_x()?).abs())
    }
}

/// Observation vector handed to the learner
///
/// Layout: player health, stamina, x, y, z, angle; boss health, x, y, z,
/// angle; animation one-hot (W, E, A, T).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Observation(pub [f32; OBSERVATION_WIDTH]);

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn player_health(&self) -> f32 {
        self.0[0]
    }

    pub fn boss_health(&self) -> f32 {
        self.0[6]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn test_one_hot_vectors_are_unique() {
        let vectors: HashSet<[u32; 4]> = AnimCategory::iter()
            .map(|c| AnimCategory::one_hot(Some(c)).map(f32::to_bits))
            .collect();
        assert_eq!(vectors.len(), 4);
        for category in AnimCategory::iter() {
            let encoded = AnimCategory::one_hot(Some(category));
            assert_eq!(encoded.iter().sum::<f32>(), 1.0);
        }
    }

    #[test]
    fn test_unknown_category_is_all_zeros() {
        assert_eq!(AnimCategory::from_tag("idle"), None);
        assert_eq!(AnimCategory::one_hot(AnimCategory::from_tag("idle")), [0.0; 4]);
    }

    #[test]
    fn test_tags() {
        assert_eq!(AnimCategory::from_tag(" A "), Some(AnimCategory::Attack));
        assert_eq!(AnimCategory::Turn.tag(), "T");
        assert_eq!(AnimCategory::one_hot(Some(AnimCategory::Engage)), [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_observation_layout() {
        let snapshot = StateSnapshot {
            player_health: Some(454),
            player_stamina: Some(95),
            player_position: Some(Position {
                x: 124.0,
                y: -64.0,
                z: 555.0,
                angle: -2.7,
            }),
            boss_health: Some(1037),
            boss_position: Some(Position::default()),
            boss_anim: Some(AnimCategory::Attack),
        };
        let obs = snapshot.observation();
        assert_eq!(obs.player_health(), 454.0);
        assert_eq!(obs.0[2], 124.0);
        assert_eq!(obs.boss_health(), 1037.0);
        assert_eq!(&obs.0[11..], &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_observation_unknowns() {
        let obs = StateSnapshot::default().observation();
        assert_eq!(&obs.0[..11], &[UNKNOWN; 11]);
        assert_eq!(&obs.0[11..], &[0.0; 4]);
    }

    #[test]
    fn test_x_distance() {
        let snapshot = StateSnapshot {
            player_position: Some(Position { x: 120.0, ..Default::default() }),
            boss_position: Some(Position { x: 126.5, ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(snapshot.x_distance(), Some(6.5));
        assert_eq!(StateSnapshot::default().x_distance(), None);
    }
}
