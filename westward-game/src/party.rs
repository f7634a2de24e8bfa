//! Live journey state for the one active party.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarDate;
use crate::catalog::Catalog;
use crate::config::{Difficulty, Pace};
use crate::constants::SCORE_WEIGHT;
use crate::inventory::Inventory;
use crate::member::Member;
use crate::numbers::usize_to_i32;
use crate::save::SaveData;

/// Minigame currently offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MiniGame {
    #[default]
    None,
    Hunting,
    River,
}

impl MiniGame {
    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Hunting => "minigame.hunting",
            Self::River => "minigame.river",
        }
    }

    /// Uniform draw over every variant; a river offer degrades to none when
    /// the party is not at a crossing.
    pub fn random<R: Rng + ?Sized>(can_cross_river: bool, rng: &mut R) -> Self {
        match rng.gen_range(0..3) {
            0 => Self::Hunting,
            1 if can_cross_river => Self::River,
            _ => Self::None,
        }
    }
}

/// Cached position of the party relative to the landmark list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LandmarkCursor {
    /// Index of the next landmark to reach; 0 is the origin sentinel and an
    /// index past the end means only the trail's end remains.
    pub next_index: usize,
    pub next_mile: i32,
    pub last_index: Option<usize>,
    pub last_mile: i32,
    pub last_has_shop: bool,
    pub can_cross_river: bool,
}

impl LandmarkCursor {
    /// Rebuild the cache for a saved next-landmark index.
    #[must_use]
    pub fn restore(next_index: usize, catalog: &Catalog, total_miles: i32) -> Self {
        if next_index == 0 {
            return Self::default();
        }
        let next = catalog.landmark(next_index);
        let last_index = next_index - 1;
        let last = catalog.landmark(last_index);
        Self {
            next_index: next_index.min(catalog.landmarks().len()),
            next_mile: next.map_or(total_miles, |landmark| landmark.mile),
            last_index: last.map(|_| last_index),
            last_mile: last.map_or(0, |landmark| landmark.mile),
            last_has_shop: last.is_some_and(crate::catalog::Landmark::has_shop),
            can_cross_river: next.is_some_and(|landmark| landmark.has_river),
        }
    }
}

/// The live party: members, provisions, position and calendar.
#[derive(Debug, Clone)]
pub struct PartyState {
    pub save_name: String,
    pub members: Vec<Member>,
    pub inventory: Inventory,
    pub date: CalendarDate,
    pub pace: Pace,
    money: f32,
    mile: i32,
    total_miles: i32,
    difficulty: Difficulty,
    cursor: LandmarkCursor,
    can_sleep: bool,
    minigame: MiniGame,
    last_day_miles: i32,
}

impl PartyState {
    /// Initialize a journey from a save record.
    #[must_use]
    pub fn from_save(data: SaveData, catalog: &Catalog, total_miles: i32) -> Self {
        let cursor = LandmarkCursor::restore(data.next_landmark_index, catalog, total_miles);
        Self {
            save_name: data.save_name,
            members: data.members,
            inventory: data.inventory,
            date: data.date,
            pace: Pace::default(),
            money: data.money.abs(),
            mile: data.mile,
            total_miles,
            difficulty: data.difficulty,
            cursor,
            can_sleep: data.can_sleep,
            minigame: MiniGame::None,
            last_day_miles: 0,
        }
    }

    /// Snapshot the journey as a save record stamped with the current local time.
    #[must_use]
    pub fn build_save_data(&self) -> SaveData {
        SaveData {
            save_name: self.save_name.clone(),
            members: self.members.clone(),
            inventory: self.inventory.clone(),
            money: self.money,
            mile: self.mile,
            difficulty: self.difficulty,
            date: self.date,
            next_landmark_index: self.cursor.next_index,
            can_sleep: self.can_sleep,
            date_saved: SaveData::timestamp_now(),
        }
    }

    #[must_use]
    pub const fn money(&self) -> f32 {
        self.money
    }

    /// Adjust money, folding the sign so the balance is never negative.
    pub fn modify_money(&mut self, delta: f32) {
        self.money = (self.money + delta).abs();
    }

    #[must_use]
    pub const fn mile(&self) -> i32 {
        self.mile
    }

    /// Move the party along the trail; event effects may move it backwards.
    pub const fn modify_mile(&mut self, delta: i32) {
        self.mile = self.mile.saturating_add(delta);
    }

    #[must_use]
    pub const fn total_miles(&self) -> i32 {
        self.total_miles
    }

    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub const fn landmarks(&self) -> &LandmarkCursor {
        &self.cursor
    }

    #[must_use]
    pub const fn next_landmark_index(&self) -> usize {
        self.cursor.next_index
    }

    #[must_use]
    pub const fn is_at_origin(&self) -> bool {
        self.cursor.next_index == 0
    }

    /// Step the landmark cursor past the landmark just reached.
    ///
    /// Returns the index of the landmark that was reached, or `None` when
    /// only the trail's end remained.
    pub fn advance_landmark(&mut self, catalog: &Catalog) -> Option<usize> {
        let reached_index = self.cursor.next_index;
        let Some(reached) = catalog.landmark(reached_index) else {
            self.cursor.next_mile = self.total_miles;
            return None;
        };
        self.cursor.last_index = Some(reached_index);
        self.cursor.last_mile = self.cursor.next_mile;
        self.cursor.last_has_shop = reached.has_shop();

        let count = catalog.landmarks().len();
        if reached_index + 1 >= count {
            self.cursor.next_index = count;
            self.cursor.next_mile = self.total_miles;
            return Some(reached_index);
        }
        self.cursor.next_index = reached_index + 1;
        if let Some(next) = catalog.landmark(self.cursor.next_index) {
            self.cursor.next_mile = next.mile;
            self.cursor.can_cross_river = next.has_river;
        }
        Some(reached_index)
    }

    /// Fraction of the current leg already covered.
    #[must_use]
    pub fn percentage_to_next_landmark(&self) -> f32 {
        let goal = self.cursor.next_mile - self.cursor.last_mile;
        if goal <= 0 {
            return 1.0;
        }
        let progress = self.mile - self.cursor.last_mile;
        crate::numbers::i32_to_f32(progress) / crate::numbers::i32_to_f32(goal)
    }

    #[must_use]
    pub const fn is_at_landmark(&self) -> bool {
        self.cursor.last_index.is_some() && self.cursor.last_mile == self.mile
    }

    /// At a landmark that offers a shop.
    #[must_use]
    pub const fn is_at_civilization(&self) -> bool {
        self.is_at_landmark() && self.cursor.last_has_shop
    }

    #[must_use]
    pub const fn can_cross_river(&self) -> bool {
        self.cursor.can_cross_river
    }

    #[must_use]
    pub const fn can_sleep(&self) -> bool {
        self.can_sleep
    }

    pub const fn set_can_sleep(&mut self, can_sleep: bool) {
        self.can_sleep = can_sleep;
    }

    /// Spend the night: one calendar day passes. Returns `false` if sleep is not available.
    pub fn sleep<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.can_sleep {
            return false;
        }
        self.date.increment_day(rng);
        self.can_sleep = false;
        true
    }

    #[must_use]
    pub const fn minigame(&self) -> MiniGame {
        self.minigame
    }

    #[must_use]
    pub fn has_minigame(&self) -> bool {
        self.minigame != MiniGame::None
    }

    pub fn offer_minigame<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.minigame = MiniGame::random(self.cursor.can_cross_river, rng);
    }

    /// Consume the current offer; a river crossing also uses up eligibility.
    pub fn play_minigame(&mut self) -> MiniGame {
        let played = self.minigame;
        if played == MiniGame::River {
            self.cursor.can_cross_river = false;
        }
        self.minigame = MiniGame::None;
        played
    }

    /// Miles covered on the most recent travel day.
    #[must_use]
    pub const fn last_day_miles(&self) -> i32 {
        self.last_day_miles
    }

    pub(crate) const fn set_last_day_miles(&mut self, miles: i32) {
        self.last_day_miles = miles;
    }

    #[must_use]
    pub fn has_healers(&self) -> bool {
        self.members.iter().any(|member| member.role.can_heal)
    }

    #[must_use]
    pub fn random_member_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.members.is_empty() {
            None
        } else {
            Some(rng.gen_range(0..self.members.len()))
        }
    }

    /// Drop every member whose health has reached zero, returning them.
    pub fn remove_dead(&mut self) -> Vec<Member> {
        let (alive, dead): (Vec<Member>, Vec<Member>) =
            self.members.drain(..).partition(Member::is_alive);
        self.members = alive;
        for member in &dead {
            log::info!("{} has died", member.name);
        }
        dead
    }

    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|member| member.name.clone()).collect()
    }

    /// Final score: health and role points per member plus money and item
    /// units, scaled by difficulty.
    #[must_use]
    pub fn score(&self) -> i64 {
        let members: f64 = self
            .members
            .iter()
            .map(|member| {
                SCORE_WEIGHT.mul_add(f64::from(member.health()), f64::from(member.role.bonus_points))
            })
            .sum();
        let money = (SCORE_WEIGHT * f64::from(self.money)).trunc();
        let items = SCORE_WEIGHT * f64::from(self.inventory.total_units());
        let scaled = (members + money + items) * self.difficulty.score_multiplier();
        i64::from(crate::numbers::round_f64_to_i32(scaled.trunc()))
    }

    #[must_use]
    pub fn member_count(&self) -> i32 {
        usize_to_i32(self.members.len())
    }
}
