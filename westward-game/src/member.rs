//! Party members, their roles and affliction bookkeeping.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::config::{Difficulty, TrailConfig};
use crate::constants::BASE_MAX_HEALTH;
use crate::status::StatusEffect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Party role granting bonuses and, for some, the ability to treat others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    /// Hint used only when generating random members.
    #[serde(default)]
    pub preferred_gender: Option<Gender>,
    #[serde(default)]
    pub bonus_money: f32,
    #[serde(default)]
    pub bonus_points: i32,
    #[serde(default)]
    pub bonus_health: i32,
    #[serde(default)]
    pub can_heal: bool,
}

impl Role {
    #[must_use]
    pub fn suits(&self, gender: Gender) -> bool {
        self.preferred_gender.is_none_or(|preferred| preferred == gender)
    }
}

/// Result of attaching a status to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusApplied {
    /// The status was not present and is now attached at level 1.
    Attached,
    /// The status was present and gained a level.
    Escalated { level: u8 },
    /// Escalation reached the max level; the member is dead.
    Fatal,
}

pub type StatusList = SmallVec<[StatusEffect; 4]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub role: Role,
    pub gender: Gender,
    health: i32,
    #[serde(default)]
    statuses: StatusList,
}

impl Member {
    /// A healthy member with no afflictions.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, gender: Gender) -> Self {
        let health = BASE_MAX_HEALTH + role.bonus_health;
        Self {
            name: name.into(),
            role,
            gender,
            health,
            statuses: StatusList::new(),
        }
    }

    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    #[must_use]
    pub const fn max_health(&self) -> i32 {
        BASE_MAX_HEALTH + self.role.bonus_health
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    #[must_use]
    pub fn is_hurt(&self) -> bool {
        self.health < self.max_health()
    }

    #[must_use]
    pub fn statuses(&self) -> &[StatusEffect] {
        &self.statuses
    }

    #[must_use]
    pub fn status(&self, id: &str) -> Option<&StatusEffect> {
        self.statuses.iter().find(|status| status.id() == id)
    }

    pub fn status_mut(&mut self, id: &str) -> Option<&mut StatusEffect> {
        self.statuses.iter_mut().find(|status| status.id() == id)
    }

    #[must_use]
    pub fn has_status(&self, id: &str) -> bool {
        self.status(id).is_some()
    }

    #[must_use]
    pub fn has_healable_status(&self) -> bool {
        self.statuses.iter().any(StatusEffect::healable)
    }

    pub fn status_ids(&self) -> impl Iterator<Item = &str> {
        self.statuses.iter().map(StatusEffect::id)
    }

    /// Adjust health, capped at max health. Returns `true` if the member died.
    pub fn modify_health(&mut self, delta: i32) -> bool {
        self.health = self.health.saturating_add(delta).min(self.max_health());
        !self.is_alive()
    }

    /// Attach `status` at level 1, or escalate the held instance of the same kind.
    pub fn add_status(&mut self, status: &StatusEffect) -> StatusApplied {
        if let Some(held) = self.status_mut(status.id()) {
            if held.increase_level() {
                self.health = 0;
                return StatusApplied::Fatal;
            }
            return StatusApplied::Escalated {
                level: held.level(),
            };
        }
        self.statuses.push(status.fresh());
        StatusApplied::Attached
    }

    /// Detach a status by id. Returns `false` if it was not attached.
    pub fn remove_status(&mut self, id: &str) -> bool {
        let before = self.statuses.len();
        self.statuses.retain(|status| status.id() != id);
        before != self.statuses.len()
    }

    /// Roll every attached status for harm. Returns `true` if the member died.
    pub fn tick<R: Rng + ?Sized>(&mut self, difficulty: Difficulty, damage: i32, rng: &mut R) -> bool {
        let hits = self
            .statuses
            .iter()
            .filter(|status| status.chance(difficulty, rng))
            .count();
        for _ in 0..hits {
            if self.modify_health(-damage) {
                return true;
            }
        }
        false
    }

    /// Generate a member with a random gender, a fitting role and a unique name.
    ///
    /// Returns `None` when no role suits the rolled gender or the name pool is empty.
    pub fn randomize<R: Rng + ?Sized>(
        roles: &[Role],
        config: &TrailConfig,
        existing_names: &[String],
        rng: &mut R,
    ) -> Option<Self> {
        let gender = if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };
        let candidates: Vec<&Role> = roles.iter().filter(|role| role.suits(gender)).collect();
        let role = (*candidates.choose(rng)?).clone();
        let pool = match gender {
            Gender::Male => &config.male_names,
            Gender::Female => &config.female_names,
        };
        let first = pool.choose(rng)?;
        let name = unique_name(first, existing_names, rng);
        Some(Self::new(name, role, gender))
    }
}

fn unique_name<R: Rng + ?Sized>(first: &str, existing: &[String], rng: &mut R) -> String {
    let mut initials: Vec<char> = ('A'..='Z').collect();
    initials.shuffle(rng);
    let render = |initial: char| format!("{first} {initial}.");
    initials
        .iter()
        .map(|initial| render(*initial))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or_else(|| render(initials[0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn role(id: &str, preferred: Option<Gender>) -> Role {
        Role {
            id: id.to_string(),
            preferred_gender: preferred,
            bonus_money: 0.0,
            bonus_points: 0,
            bonus_health: 20,
            can_heal: false,
        }
    }

    #[test]
    fn health_is_capped_at_role_maximum() {
        let mut member = Member::new("Ada B.", role("scout", None), Gender::Female);
        assert_eq!(member.max_health(), 120);
        assert!(!member.modify_health(50));
        assert_eq!(member.health(), 120);
        assert!(member.modify_health(-200));
        assert!(!member.is_alive());
    }

    #[test]
    fn repeated_status_escalates_until_fatal() {
        let mut member = Member::new("Abe C.", role("smith", None), Gender::Male);
        let cholera = StatusEffect::new("cholera", 3, true, 0.0);
        assert_eq!(member.add_status(&cholera), StatusApplied::Attached);
        assert_eq!(member.statuses().len(), 1);
        assert_eq!(
            member.add_status(&cholera),
            StatusApplied::Escalated { level: 2 }
        );
        assert_eq!(member.add_status(&cholera), StatusApplied::Fatal);
        assert!(!member.is_alive());
        assert_eq!(member.statuses().len(), 1);
    }

    #[test]
    fn tick_applies_damage_per_hit() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut member = Member::new("Eli D.", role("cook", None), Gender::Male);
        member.add_status(&StatusEffect::new("fever", 5, true, 1.0));
        member.add_status(&StatusEffect::new("rash", 5, true, 0.0));
        assert!(!member.tick(Difficulty::Easy, 10, &mut rng));
        assert_eq!(member.health(), member.max_health() - 10);
    }

    #[test]
    fn randomize_honours_preferred_gender() {
        let mut rng = SmallRng::seed_from_u64(17);
        let roles = vec![
            role("midwife", Some(Gender::Female)),
            role("blacksmith", Some(Gender::Male)),
        ];
        let config = TrailConfig::default();
        let mut names = Vec::new();
        for _ in 0..30 {
            let member = Member::randomize(&roles, &config, &names, &mut rng).unwrap();
            let expected = if member.gender == Gender::Female {
                "midwife"
            } else {
                "blacksmith"
            };
            assert_eq!(member.role.id, expected);
            assert!(member.name.ends_with('.'));
            assert!(!names.contains(&member.name));
            names.push(member.name);
        }
    }

    #[test]
    fn randomize_without_fitting_role_yields_none() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(Member::randomize(&[], &TrailConfig::default(), &[], &mut rng).is_none());
    }
}
