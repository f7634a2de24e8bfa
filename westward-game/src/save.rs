//! Save records and the new-game builder that randomizes a fresh journey.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{CalendarDate, Month};
use crate::catalog::Catalog;
use crate::config::{Difficulty, TrailConfig};
use crate::constants::BACKDATE_MILES_PER_DAY;
use crate::inventory::Inventory;
use crate::member::Member;
use crate::numbers::{clamp_f64_to_f32, round_f64_to_i32, round_f64_to_u32};
use crate::sampler::gaussian;

const SAVE_TIMESTAMP_FORMAT: &str = "%B %d, %Y %I:%M %p";

/// Everything needed to resume a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub save_name: String,
    pub members: Vec<Member>,
    pub inventory: Inventory,
    pub money: f32,
    pub mile: i32,
    pub difficulty: Difficulty,
    pub date: CalendarDate,
    pub next_landmark_index: usize,
    pub can_sleep: bool,
    pub date_saved: String,
}

impl SaveData {
    /// Local wall-clock time formatted like `April 03, 2025 07:15 PM`.
    #[must_use]
    pub fn timestamp_now() -> String {
        chrono::Local::now().format(SAVE_TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a save record.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("a save name is required")]
    MissingSaveName,
    #[error("at least one party member is required")]
    MissingMembers,
    #[error("a difficulty tier must be chosen")]
    MissingDifficulty,
}

/// Collects new-game choices and randomizes whatever the operator left open.
#[derive(Debug, Clone)]
pub struct SaveDataBuilder<'a> {
    catalog: &'a Catalog,
    config: &'a TrailConfig,
    rng: ChaCha20Rng,
    save_name: Option<String>,
    members: Vec<Member>,
    difficulty: Option<Difficulty>,
    inventory: Option<Inventory>,
    money: Option<f32>,
    month: Option<Month>,
    day: Option<u8>,
}

impl<'a> SaveDataBuilder<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, config: &'a TrailConfig, seed: u64) -> Self {
        Self {
            catalog,
            config,
            rng: ChaCha20Rng::seed_from_u64(seed),
            save_name: None,
            members: Vec::new(),
            difficulty: None,
            inventory: None,
            money: None,
            month: None,
            day: None,
        }
    }

    #[must_use]
    pub fn save_name(mut self, name: impl Into<String>) -> Self {
        self.save_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn add_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Add a randomized member with a name unique within the party.
    #[must_use]
    pub fn add_random_member(mut self) -> Self {
        let names: Vec<String> = self.members.iter().map(|member| member.name.clone()).collect();
        match Member::randomize(self.catalog.roles().all(), self.config, &names, &mut self.rng) {
            Some(member) => self.members.push(member),
            None => log::warn!("no role or name fits a random member; skipping"),
        }
        self
    }

    #[must_use]
    pub const fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    #[must_use]
    pub fn inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = Some(inventory);
        self
    }

    #[must_use]
    pub const fn money(mut self, money: f32) -> Self {
        self.money = Some(money);
        self
    }

    /// Fix the starting date; an out-of-range day is re-rolled at build time.
    #[must_use]
    pub const fn start_date(mut self, month: Month, day: u8) -> Self {
        self.month = Some(month);
        self.day = Some(day);
        self
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Finish the record, randomizing inventory, money and calendar as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError`] when the save name, members or difficulty are missing.
    pub fn build(mut self) -> Result<SaveData, SaveError> {
        let save_name = self
            .save_name
            .take()
            .filter(|name| !name.trim().is_empty())
            .ok_or(SaveError::MissingSaveName)?;
        if self.members.is_empty() {
            return Err(SaveError::MissingMembers);
        }
        let difficulty = self.difficulty.ok_or(SaveError::MissingDifficulty)?;

        let inventory = match self.inventory.take() {
            Some(inventory) => inventory,
            None => Inventory::generate_random(self.catalog.items().all(), difficulty, &mut self.rng),
        };
        let money = match self.money {
            Some(money) => money.abs(),
            None => self.random_money(difficulty),
        };
        let month = self
            .month
            .unwrap_or_else(|| self.random_starting_month(difficulty));
        let day = match self.day {
            Some(day) if (1..=month.days()).contains(&day) => day,
            _ => self.rng.gen_range(1..=month.days()),
        };
        let mut date = CalendarDate::new(month, day);
        let backdate = self.random_total_days(difficulty);
        date.add_days(backdate, &mut self.rng);
        date.forecast(&mut self.rng);

        log::info!(
            "new journey `{save_name}`: {} members, difficulty {difficulty}, starting {date}",
            self.members.len()
        );
        Ok(SaveData {
            save_name,
            members: self.members,
            inventory,
            money,
            mile: 0,
            difficulty,
            date,
            next_landmark_index: 0,
            can_sleep: false,
            date_saved: SaveData::timestamp_now(),
        })
    }

    fn random_money(&mut self, difficulty: Difficulty) -> f32 {
        let start = f64::from(self.config.starting_money);
        let money = match difficulty {
            Difficulty::Easy => start,
            Difficulty::Normal => (start * self.rng.gen_range(0.5..1.0)).round(),
            Difficulty::Hard => {
                let floor = (start / 16.0).round();
                let drawn = gaussian(&mut self.rng, start / 2.0, start / 4.0).round();
                drawn.max(floor).min(start)
            }
        };
        clamp_f64_to_f32(money)
    }

    fn random_starting_month(&mut self, difficulty: Difficulty) -> Month {
        let spread = match difficulty {
            Difficulty::Easy => return Month::Apr,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 2.5,
        };
        let drawn = round_f64_to_i32(gaussian(&mut self.rng, 4.0, spread));
        let number = (drawn % 13).max(1);
        u8::try_from(number)
            .ok()
            .and_then(Month::from_number)
            .unwrap_or(Month::Apr)
    }

    fn random_total_days(&mut self, difficulty: Difficulty) -> u32 {
        let miles = f64::from(self.config.previous_miles_for(difficulty));
        let (slow, fast) = BACKDATE_MILES_PER_DAY;
        round_f64_to_u32(miles / self.rng.gen_range(slow..fast))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::Gender;
    use crate::test_support::fixture_catalog;

    #[test]
    fn build_requires_name_members_and_difficulty() {
        let catalog = fixture_catalog();
        let config = TrailConfig::default();
        let missing_name = SaveDataBuilder::new(&catalog, &config, 1)
            .add_random_member()
            .difficulty(Difficulty::Easy)
            .build();
        assert_eq!(missing_name, Err(SaveError::MissingSaveName));

        let missing_members = SaveDataBuilder::new(&catalog, &config, 1)
            .save_name("oregon")
            .difficulty(Difficulty::Easy)
            .build();
        assert_eq!(missing_members, Err(SaveError::MissingMembers));

        let missing_difficulty = SaveDataBuilder::new(&catalog, &config, 1)
            .save_name("oregon")
            .add_random_member()
            .build();
        assert_eq!(missing_difficulty, Err(SaveError::MissingDifficulty));
    }

    #[test]
    fn easy_journey_starts_in_april_with_full_purse() {
        let catalog = fixture_catalog();
        let config = TrailConfig::default();
        let save = SaveDataBuilder::new(&catalog, &config, 42)
            .save_name("oregon")
            .add_random_member()
            .add_random_member()
            .difficulty(Difficulty::Easy)
            .build()
            .unwrap();
        assert_eq!(save.members.len(), 2);
        assert_ne!(save.members[0].name, save.members[1].name);
        assert_eq!(save.date.month(), Month::Apr);
        assert!((save.money - config.starting_money).abs() < f32::EPSILON);
        assert_eq!(save.mile, 0);
        assert_eq!(save.next_landmark_index, 0);
        assert!(!save.can_sleep);
        assert!(!save.inventory.is_empty());
    }

    #[test]
    fn hard_money_stays_within_bounds() {
        let catalog = fixture_catalog();
        let config = TrailConfig::default();
        for seed in 0..40 {
            let save = SaveDataBuilder::new(&catalog, &config, seed)
                .save_name("oregon")
                .add_random_member()
                .difficulty(Difficulty::Hard)
                .build()
                .unwrap();
            assert!(save.money >= (config.starting_money / 16.0).round());
            assert!(save.money <= config.starting_money);
        }
    }

    #[test]
    fn explicit_choices_are_kept() {
        let catalog = fixture_catalog();
        let config = TrailConfig {
            previous_miles: [0, 0, 0],
            ..TrailConfig::default()
        };
        let doctor = catalog.roles().find("doctor").unwrap().clone();
        let save = SaveDataBuilder::new(&catalog, &config, 7)
            .save_name("oregon")
            .add_member(Member::new("Ada B.", doctor, Gender::Female))
            .add_random_member()
            .difficulty(Difficulty::Normal)
            .money(55.0)
            .inventory(Inventory::new())
            .start_date(Month::Jun, 14)
            .build()
            .unwrap();
        assert!((save.money - 55.0).abs() < f32::EPSILON);
        assert!(save.inventory.is_empty());
        assert_eq!(save.members[0].name, "Ada B.");
        assert!(save.members[0].role.can_heal);
        assert_ne!(save.members[1].name, "Ada B.");
        assert_eq!((save.date.month(), save.date.day()), (Month::Jun, 14));
    }

    #[test]
    fn record_survives_json() {
        let catalog = fixture_catalog();
        let config = TrailConfig::default();
        let save = SaveDataBuilder::new(&catalog, &config, 9)
            .save_name("oregon")
            .add_random_member()
            .difficulty(Difficulty::Hard)
            .build()
            .unwrap();
        let json = save.to_json().unwrap();
        assert!(json.contains("\"difficulty\": 3"));
        assert_eq!(SaveData::from_json(&json).unwrap(), save);
    }
}
