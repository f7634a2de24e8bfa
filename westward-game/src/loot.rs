//! Weighted, multi-roll loot tables over the item and status catalogs.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogRef};
use crate::inventory::ItemStack;
use crate::sampler::IntRange;
use crate::status::StatusEffect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LootTarget {
    Item,
    Status,
}

const fn single_unit() -> IntRange {
    IntRange::exact(1)
}

const fn single_roll() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub target: LootTarget,
    pub id: String,
    #[serde(default)]
    pub weight: f32,
    #[serde(default = "single_unit")]
    pub count: IntRange,
    #[serde(default)]
    pub always_drop: bool,
}

/// One materialized loot result.
#[derive(Debug, Clone, PartialEq)]
pub enum LootDrop {
    Item(ItemStack),
    Status(StatusEffect),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    #[serde(default = "single_roll")]
    pub rolls: u32,
    #[serde(default)]
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    /// Execute every roll over every entry.
    ///
    /// Item results are merged by id with counts summed; status results are
    /// emitted as separate level-1 instances and only for always-drop entries.
    ///
    /// # Panics
    ///
    /// Panics if an entry names an id missing from `catalog`; catalogs are
    /// validated against their loot tables when built.
    pub fn run<R: Rng + ?Sized>(&self, catalog: &Catalog, rng: &mut R) -> Vec<LootDrop> {
        let mut drops = Vec::new();
        for _ in 0..self.rolls {
            for entry in &self.entries {
                match entry.target {
                    LootTarget::Item => {
                        let count = if entry.always_drop {
                            Some(entry.count.sample(rng))
                        } else {
                            entry.count.sample_weighted(entry.weight, rng)
                        };
                        let Some(count) = count.and_then(|value| u32::try_from(value).ok()) else {
                            continue;
                        };
                        if count > 0 {
                            merge_item(&mut drops, catalog.item(&entry.id).stack(count));
                        }
                    }
                    LootTarget::Status => {
                        if entry.always_drop {
                            drops.push(LootDrop::Status(catalog.status(&entry.id).instantiate()));
                        }
                    }
                }
            }
        }
        drops
    }

    pub(crate) fn references(&self) -> impl Iterator<Item = CatalogRef<'_>> {
        self.entries.iter().map(|entry| match entry.target {
            LootTarget::Item => CatalogRef::Item(&entry.id),
            LootTarget::Status => CatalogRef::Status(&entry.id),
        })
    }
}

fn merge_item(drops: &mut Vec<LootDrop>, stack: ItemStack) {
    let existing = drops.iter_mut().find_map(|drop| match drop {
        LootDrop::Item(held) if held.same_kind(&stack) => Some(held),
        _ => None,
    });
    match existing {
        Some(held) => held.count = held.count.saturating_add(stack.count),
        None => drops.push(LootDrop::Item(stack)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_catalog;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn item_entry(id: &str, count: IntRange, weight: f32, always_drop: bool) -> LootEntry {
        LootEntry {
            target: LootTarget::Item,
            id: id.to_string(),
            weight,
            count,
            always_drop,
        }
    }

    #[test]
    fn same_id_always_drops_merge_into_one_stack() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(3);
        let table = LootTable {
            rolls: 1,
            entries: vec![
                item_entry("jerky", IntRange::exact(2), 0.0, true),
                item_entry("jerky", IntRange::exact(3), 0.0, true),
            ],
        };
        let drops = table.run(&catalog, &mut rng);
        assert_eq!(drops.len(), 1);
        match &drops[0] {
            LootDrop::Item(stack) => {
                assert_eq!(stack.id, "jerky");
                assert_eq!(stack.count, 5);
            }
            LootDrop::Status(_) => panic!("expected an item drop"),
        }
    }

    #[test]
    fn rolls_multiply_merged_counts() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(3);
        let table = LootTable {
            rolls: 3,
            entries: vec![item_entry("bullets", IntRange::exact(4), 0.0, true)],
        };
        let drops = table.run(&catalog, &mut rng);
        assert_eq!(drops, vec![LootDrop::Item(catalog.item("bullets").stack(12))]);
    }

    #[test]
    fn weighted_entries_follow_their_weight() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(5);
        let table = LootTable {
            rolls: 2,
            entries: vec![
                item_entry("jerky", IntRange::exact(1), 1.0, false),
                item_entry("medicine", IntRange::exact(1), 0.0, false),
            ],
        };
        let drops = table.run(&catalog, &mut rng);
        assert_eq!(drops, vec![LootDrop::Item(catalog.item("jerky").stack(2))]);
    }

    #[test]
    fn statuses_drop_only_when_always_and_never_merge() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(5);
        let status = |always_drop| LootEntry {
            target: LootTarget::Status,
            id: "snakebite".to_string(),
            weight: 1.0,
            count: IntRange::exact(1),
            always_drop,
        };
        let table = LootTable {
            rolls: 2,
            entries: vec![status(true), status(false)],
        };
        let drops = table.run(&catalog, &mut rng);
        assert_eq!(drops.len(), 2);
        assert!(drops.iter().all(|drop| matches!(
            drop,
            LootDrop::Status(effect) if effect.id() == "snakebite" && effect.level() == 1
        )));
    }
}
