//! Party inventory ledger: item stacks merged by id and drawn down by type.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::ItemDef;
use crate::config::Difficulty;
use crate::constants::{STARTING_ITEM_SKIP_CHANCE, STARTING_WAGON_PART_CHANCE};
use crate::numbers::usize_to_i32;
use crate::sampler::gaussian_or_exact;

/// Item category used for type-wide consumption and starting kits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Food,
    FoodIngredient,
    Weapon,
    Ammo,
    WagonParts,
    Medicine,
    Supplies,
    Tool,
    Clothes,
}

impl ItemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::FoodIngredient => "foodIngredient",
            Self::Weapon => "weapon",
            Self::Ammo => "ammo",
            Self::WagonParts => "wagonParts",
            Self::Medicine => "medicine",
            Self::Supplies => "supplies",
            Self::Tool => "tool",
            Self::Clothes => "clothes",
        }
    }

    /// Inclusive unit range granted per item of this type in a new game's kit.
    /// Wagon parts are handled separately as a single optional unit.
    const fn starting_range(self) -> (u32, u32) {
        match self {
            Self::Food | Self::Medicine => (1, 10),
            Self::FoodIngredient | Self::Supplies => (1, 20),
            Self::Weapon | Self::Tool => (1, 4),
            Self::Ammo => (1, 100),
            Self::Clothes => (1, 8),
            Self::WagonParts => (1, 1),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A counted stack of one catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: String,
    pub count: u32,
    #[serde(rename = "type")]
    pub kind: ItemType,
    #[serde(default)]
    pub barter_value: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_applied: Option<String>,
}

impl ItemStack {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ItemType, count: u32) -> Self {
        Self {
            id: id.into(),
            count,
            kind,
            barter_value: 0.0,
            status_applied: None,
        }
    }

    /// Two stacks are the same kind iff their ids match.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Ordered collection of item stacks; empty stacks are never retained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    stacks: Vec<ItemStack>,
}

impl Inventory {
    #[must_use]
    pub const fn new() -> Self {
        Self { stacks: Vec::new() }
    }

    /// Build a ledger from loose stacks, merging duplicates.
    #[must_use]
    pub fn from_stacks(stacks: impl IntoIterator<Item = ItemStack>) -> Self {
        let mut inventory = Self::new();
        for stack in stacks {
            inventory.add(stack);
        }
        inventory
    }

    #[must_use]
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    #[must_use]
    pub fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ItemStack> {
        self.stacks.iter().find(|stack| stack.id == id)
    }

    /// Units held of a specific item id.
    #[must_use]
    pub fn item_count(&self, id: &str) -> u32 {
        self.find(id).map_or(0, |stack| stack.count)
    }

    /// Units held across every stack of `kind`.
    #[must_use]
    pub fn count_of_type(&self, kind: ItemType) -> u32 {
        self.stacks
            .iter()
            .filter(|stack| stack.kind == kind)
            .map(|stack| stack.count)
            .sum()
    }

    /// Units held across the whole ledger.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.stacks.iter().map(|stack| stack.count).sum()
    }

    /// Merge `stack` into an existing same-id stack or append it.
    pub fn add(&mut self, stack: ItemStack) {
        if stack.count == 0 {
            return;
        }
        if let Some(existing) = self.stacks.iter_mut().find(|held| held.same_kind(&stack)) {
            existing.count = existing.count.saturating_add(stack.count);
        } else {
            self.stacks.push(stack);
        }
    }

    /// Remove `count` units of `id`.
    ///
    /// Returns `false` without mutation when the held stack cannot cover the request.
    pub fn remove(&mut self, id: &str, count: u32) -> bool {
        let Some(index) = self.stacks.iter().position(|stack| stack.id == id) else {
            return count == 0;
        };
        if self.stacks[index].count < count {
            return false;
        }
        self.take_units(index, count);
        true
    }

    /// Consume a gaussian (or exact, when `std_dev` is zero) amount of `kind`.
    ///
    /// The target is clamped to the units available and drawn one unit at a
    /// time from uniformly chosen stacks. Returns `false` only when no stock
    /// of that type existed; partial consumption still reports `true`.
    pub fn remove_of_type<R: Rng + ?Sized>(
        &mut self,
        kind: ItemType,
        mean: f64,
        std_dev: f64,
        rng: &mut R,
    ) -> bool {
        let available = self.count_of_type(kind);
        if available == 0 {
            return false;
        }
        let target = gaussian_or_exact(rng, mean, std_dev).max(0);
        let mut remaining = u32::try_from(target).unwrap_or(0).min(available);
        while remaining > 0 {
            let candidates: Vec<usize> = self
                .stacks
                .iter()
                .enumerate()
                .filter(|(_, stack)| stack.kind == kind && stack.count > 0)
                .map(|(index, _)| index)
                .collect();
            if candidates.is_empty() {
                break;
            }
            let index = candidates[rng.gen_range(0..candidates.len())];
            self.take_units(index, 1);
            remaining -= 1;
        }
        true
    }

    /// Remove one unit from a uniformly chosen stack, `count` times.
    ///
    /// Stops early once the ledger is empty and returns the units removed.
    pub fn remove_random_items<R: Rng + ?Sized>(&mut self, count: u32, rng: &mut R) -> u32 {
        let mut removed = 0;
        for _ in 0..count {
            if self.stacks.is_empty() {
                break;
            }
            let index = rng.gen_range(0..self.stacks.len());
            self.take_units(index, 1);
            removed += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }

    fn take_units(&mut self, index: usize, count: u32) {
        let stack = &mut self.stacks[index];
        stack.count = stack.count.saturating_sub(count);
        if stack.count == 0 {
            self.stacks.remove(index);
        }
    }

    /// Roll a starting kit from the item catalog.
    ///
    /// Harder tiers skip each catalog item with even odds before rolling counts.
    pub fn generate_random<R: Rng + ?Sized>(
        items: &[ItemDef],
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Self {
        let mut inventory = Self::new();
        for item in items {
            if difficulty != Difficulty::Easy && rng.gen_bool(STARTING_ITEM_SKIP_CHANCE) {
                continue;
            }
            let count = if item.kind == ItemType::WagonParts {
                u32::from(rng.gen_bool(STARTING_WAGON_PART_CHANCE))
            } else {
                let (min, max) = item.kind.starting_range();
                rng.gen_range(min..=max)
            };
            inventory.add(item.stack(count));
        }
        inventory
    }
}

/// Mean food units a party of `members` eats in a day at the given pace multiplier.
#[must_use]
pub fn daily_food_target(members: usize, food_multiplier: f32) -> f64 {
    f64::from(usize_to_i32(members)) * f64::from(food_multiplier)
}
