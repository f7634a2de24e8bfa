//! Hunting grounds: a herd of quarry, shots paid for in ammunition.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::constants::{HUNT_SPAWN_CHANCE, NOTE_DEATH_FROM_ILLNESS, NOTE_HUNT_INJURY};
use crate::events::Consequence;
use crate::inventory::ItemType;
use crate::loot::{LootDrop, LootTable};
use crate::member::StatusApplied;
use crate::party::PartyState;

/// An animal kind that may appear on a hunting ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quarry {
    pub id: String,
    pub health: u32,
    #[serde(default)]
    pub score: u32,
    pub max_count: u32,
    pub drop: LootTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuntingGround {
    pub id: String,
    pub animals: Vec<Quarry>,
}

/// A live animal in the herd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animal {
    quarry: usize,
    health: u32,
}

impl Animal {
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShotOutcome {
    /// No ammunition left; nothing was fired.
    NoAmmunition,
    Missed,
    Wounded { remaining_health: u32 },
    Downed {
        quarry_id: String,
        score: u32,
        drops: Vec<LootDrop>,
        consequences: Vec<Consequence>,
    },
}

/// One hunting trip.
#[derive(Debug, Clone)]
pub struct Hunt {
    ground: HuntingGround,
    herd: Vec<Animal>,
    score: u32,
    shots_fired: u32,
}

impl Hunt {
    #[must_use]
    pub const fn new(ground: HuntingGround) -> Self {
        Self {
            ground,
            herd: Vec::new(),
            score: 0,
            shots_fired: 0,
        }
    }

    #[must_use]
    pub fn herd(&self) -> &[Animal] {
        &self.herd
    }

    #[must_use]
    pub fn quarry_of(&self, animal: &Animal) -> &Quarry {
        &self.ground.animals[animal.quarry]
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Let more animals wander in. An empty herd always gets one of each kind
    /// that has room; otherwise each kind below its cap joins with a small chance.
    pub fn spawn<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let empty = self.herd.is_empty();
        for (index, quarry) in self.ground.animals.iter().enumerate() {
            let present = self.herd.iter().filter(|animal| animal.quarry == index).count();
            let has_room = u32::try_from(present).is_ok_and(|present| present < quarry.max_count);
            if has_room && (empty || rng.r#gen::<f32>() < HUNT_SPAWN_CHANCE) {
                self.herd.push(Animal {
                    quarry: index,
                    health: quarry.health.max(1),
                });
            }
        }
    }

    /// Fire one round at `target` (an index into [`Hunt::herd`]); `None` is a miss.
    ///
    /// Every shot costs one unit of ammunition. A downed animal's loot goes to
    /// the party: items into the inventory, afflictions onto a random member.
    pub fn shoot<R: Rng + ?Sized>(
        &mut self,
        party: &mut PartyState,
        catalog: &Catalog,
        target: Option<usize>,
        rng: &mut R,
    ) -> ShotOutcome {
        if !party.inventory.remove_of_type(ItemType::Ammo, 1.0, 0.0, rng) {
            return ShotOutcome::NoAmmunition;
        }
        self.shots_fired += 1;
        let Some(index) = target.filter(|&index| index < self.herd.len()) else {
            return ShotOutcome::Missed;
        };
        let animal = &mut self.herd[index];
        animal.health = animal.health.saturating_sub(1);
        if animal.health > 0 {
            return ShotOutcome::Wounded {
                remaining_health: animal.health,
            };
        }
        let animal = self.herd.remove(index);
        let quarry = &self.ground.animals[animal.quarry];
        self.score += quarry.score;
        let drops = quarry.drop.run(catalog, rng);
        let consequences = collect_drops(party, &drops, rng);
        log::debug!("{} downed a {}", party.save_name, quarry.id);
        ShotOutcome::Downed {
            quarry_id: quarry.id.clone(),
            score: quarry.score,
            drops,
            consequences,
        }
    }
}

fn collect_drops<R: Rng + ?Sized>(
    party: &mut PartyState,
    drops: &[LootDrop],
    rng: &mut R,
) -> Vec<Consequence> {
    let mut consequences = Vec::new();
    for drop in drops {
        match drop {
            LootDrop::Item(stack) => party.inventory.add(stack.clone()),
            LootDrop::Status(effect) => {
                let Some(index) = party.random_member_index(rng) else {
                    continue;
                };
                let member = &mut party.members[index];
                let name = member.name.clone();
                let key = if member.add_status(effect) == StatusApplied::Fatal {
                    NOTE_DEATH_FROM_ILLNESS
                } else {
                    NOTE_HUNT_INJURY
                };
                consequences.push(Consequence::new(key, [name, effect.id().to_string()]));
            }
        }
    }
    party.remove_dead();
    consequences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loot::{LootEntry, LootTarget};
    use crate::sampler::IntRange;
    use crate::test_support::{fixture_catalog, fixture_party};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn ground(health: u32, status_drop: bool) -> HuntingGround {
        let mut entries = vec![LootEntry {
            target: LootTarget::Item,
            id: "jerky".to_string(),
            weight: 0.0,
            count: IntRange::exact(5),
            always_drop: true,
        }];
        if status_drop {
            entries.push(LootEntry {
                target: LootTarget::Status,
                id: "snakebite".to_string(),
                weight: 0.0,
                count: IntRange::exact(1),
                always_drop: true,
            });
        }
        HuntingGround {
            id: "prairie".to_string(),
            animals: vec![Quarry {
                id: "bison".to_string(),
                health,
                score: 50,
                max_count: 1,
                drop: LootTable { rolls: 1, entries },
            }],
        }
    }

    #[test]
    fn empty_herd_always_spawns_up_to_cap() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut hunt = Hunt::new(ground(1, false));
        hunt.spawn(&mut rng);
        assert_eq!(hunt.herd().len(), 1);
        for _ in 0..20 {
            hunt.spawn(&mut rng);
        }
        assert_eq!(hunt.herd().len(), 1);
    }

    #[test]
    fn shooting_without_ammunition_is_blocked() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut party = fixture_party(&catalog, 1);
        party.inventory.remove("bullets", party.inventory.item_count("bullets"));
        let mut hunt = Hunt::new(ground(1, false));
        hunt.spawn(&mut rng);
        let outcome = hunt.shoot(&mut party, &catalog, Some(0), &mut rng);
        assert_eq!(outcome, ShotOutcome::NoAmmunition);
        assert_eq!(hunt.shots_fired(), 0);
        assert_eq!(hunt.herd().len(), 1);
    }

    #[test]
    fn each_shot_spends_one_round() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut party = fixture_party(&catalog, 1);
        let rounds = party.inventory.item_count("bullets");
        let mut hunt = Hunt::new(ground(2, false));
        hunt.spawn(&mut rng);
        assert_eq!(hunt.shoot(&mut party, &catalog, None, &mut rng), ShotOutcome::Missed);
        assert_eq!(
            hunt.shoot(&mut party, &catalog, Some(0), &mut rng),
            ShotOutcome::Wounded { remaining_health: 1 }
        );
        assert_eq!(party.inventory.item_count("bullets"), rounds - 2);
    }

    #[test]
    fn downed_quarry_pays_out_loot() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut party = fixture_party(&catalog, 1);
        let jerky = party.inventory.item_count("jerky");
        let mut hunt = Hunt::new(ground(1, true));
        hunt.spawn(&mut rng);
        let ShotOutcome::Downed {
            quarry_id,
            score,
            consequences,
            ..
        } = hunt.shoot(&mut party, &catalog, Some(0), &mut rng)
        else {
            panic!("expected the bison to go down");
        };
        assert_eq!(quarry_id, "bison");
        assert_eq!(score, 50);
        assert_eq!(hunt.score(), 50);
        assert!(hunt.herd().is_empty());
        assert_eq!(party.inventory.item_count("jerky"), jerky + 5);
        assert!(party.members[0].has_status("snakebite"));
        assert_eq!(consequences[0].key, NOTE_HUNT_INJURY);
    }
}
