//! Leveled afflictions attached to party members.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::constants::DEFAULT_STATUS_OBTAINED_KEY;

fn default_obtained_key() -> String {
    DEFAULT_STATUS_OBTAINED_KEY.to_string()
}

/// A status effect instance.
///
/// The level stays within `1..=max_level` while attached; reaching the max
/// level is fatal for the carrier, dropping below 1 detaches the effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    id: String,
    level: u8,
    max_level: u8,
    healable: bool,
    base_chance: f32,
    #[serde(default = "default_obtained_key")]
    obtained_key: String,
}

impl StatusEffect {
    /// A fresh level-1 instance.
    #[must_use]
    pub fn new(id: impl Into<String>, max_level: u8, healable: bool, base_chance: f32) -> Self {
        Self {
            id: id.into(),
            level: 1,
            max_level: max_level.max(1),
            healable,
            base_chance,
            obtained_key: default_obtained_key(),
        }
    }

    #[must_use]
    pub fn with_obtained_key(mut self, key: impl Into<String>) -> Self {
        self.obtained_key = key.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub const fn max_level(&self) -> u8 {
        self.max_level
    }

    #[must_use]
    pub const fn healable(&self) -> bool {
        self.healable
    }

    #[must_use]
    pub const fn base_chance(&self) -> f32 {
        self.base_chance
    }

    /// Message key surfaced when this status is first attached.
    #[must_use]
    pub fn obtained_key(&self) -> &str {
        &self.obtained_key
    }

    /// Copy of this status reset to level 1.
    #[must_use]
    pub fn fresh(&self) -> Self {
        Self {
            level: 1,
            ..self.clone()
        }
    }

    /// Raise the level by one. Returns `true` once the max level is reached.
    pub fn increase_level(&mut self) -> bool {
        self.level = self.level.saturating_add(1).min(self.max_level);
        self.level >= self.max_level
    }

    /// Lower the level by one.
    ///
    /// Returns `false` without change at level 1, meaning the caller should detach the effect.
    pub fn decrease_level(&mut self) -> bool {
        if self.level <= 1 {
            return false;
        }
        self.level -= 1;
        true
    }

    /// Roll once per level for harm; the first success short-circuits.
    pub fn chance<R: Rng + ?Sized>(&self, difficulty: Difficulty, rng: &mut R) -> bool {
        let threshold = self.base_chance * difficulty.affliction_multiplier();
        (0..self.level).any(|_| rng.r#gen::<f32>() < threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn increase_signals_at_max_level() {
        let mut status = StatusEffect::new("cholera", 3, true, 0.1);
        assert!(!status.increase_level());
        assert_eq!(status.level(), 2);
        assert!(status.increase_level());
        assert_eq!(status.level(), 3);
        assert!(status.increase_level());
        assert_eq!(status.level(), 3);
    }

    #[test]
    fn decrease_stops_at_one() {
        let mut status = StatusEffect::new("cholera", 5, true, 0.1);
        assert!(!status.decrease_level());
        assert_eq!(status.level(), 1);
        status.increase_level();
        status.increase_level();
        assert!(status.decrease_level());
        assert_eq!(status.level(), 2);
    }

    #[test]
    fn fresh_resets_level() {
        let mut status = StatusEffect::new("hunger", 5, false, 0.2).with_obtained_key("hunger.start");
        status.increase_level();
        let clone = status.fresh();
        assert_eq!(clone.level(), 1);
        assert_eq!(clone.obtained_key(), "hunger.start");
    }

    #[test]
    fn chance_extremes_are_deterministic() {
        let mut rng = SmallRng::seed_from_u64(8);
        let harmless = StatusEffect::new("blister", 4, true, 0.0);
        let lethal = StatusEffect::new("plague", 4, false, 1.0);
        for _ in 0..100 {
            assert!(!harmless.chance(Difficulty::Hard, &mut rng));
            assert!(lethal.chance(Difficulty::Easy, &mut rng));
        }
    }

    #[test]
    fn deserializes_with_default_key() {
        let status: StatusEffect = serde_json::from_str(
            r#"{"id":"dysentery","level":2,"max_level":4,"healable":true,"base_chance":0.15}"#,
        )
        .unwrap();
        assert_eq!(status.level(), 2);
        assert_eq!(status.obtained_key(), DEFAULT_STATUS_OBTAINED_KEY);
    }
}
