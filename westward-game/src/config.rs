//! Trail configuration, travel pace and difficulty tiers.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::numbers::{i32_to_f32, u32_to_f32};

/// Party-selectable travel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Leisurely,
    #[default]
    Normal,
    Quick,
}

impl Pace {
    pub const ALL: [Self; 3] = [Self::Leisurely, Self::Normal, Self::Quick];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leisurely => "leisurely",
            Self::Normal => "normal",
            Self::Quick => "quick",
        }
    }

    /// Scales the daily mile budget and shortens the per-mile pacing delay.
    #[must_use]
    pub const fn mileage_multiplier(self) -> f32 {
        match self {
            Self::Leisurely => 0.6,
            Self::Normal => 1.0,
            Self::Quick => 1.4,
        }
    }

    /// Scales daily food consumption per member.
    #[must_use]
    pub const fn food_multiplier(self) -> f32 {
        match self {
            Self::Leisurely => 0.5,
            Self::Normal => 1.0,
            Self::Quick => 1.8,
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pace {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leisurely" => Ok(Self::Leisurely),
            "normal" => Ok(Self::Normal),
            "quick" => Ok(Self::Quick),
            _ => Err(()),
        }
    }
}

/// Difficulty tier chosen when a journey starts; serialized as 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Normal => 2,
            Self::Hard => 3,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Easy => 0,
            Self::Normal => 1,
            Self::Hard => 2,
        }
    }

    /// Multiplier applied to every affliction's per-roll base chance.
    #[must_use]
    pub const fn affliction_multiplier(self) -> f32 {
        match self {
            Self::Easy => 1.0,
            Self::Normal => 2.0,
            Self::Hard => 3.0,
        }
    }

    #[must_use]
    pub const fn score_multiplier(self) -> f64 {
        match self {
            Self::Easy => 1.0,
            Self::Normal => 1.1,
            Self::Hard => 1.3,
        }
    }

    /// Probability that a camp treatment succeeds.
    #[must_use]
    pub const fn heal_chance(self) -> f32 {
        match self {
            Self::Easy => 0.6,
            Self::Normal => 0.4,
            Self::Hard => 0.2,
        }
    }

    /// Base barter multiplier before trader and value adjustments.
    #[must_use]
    pub const fn trade_multiplier(self) -> f32 {
        match self {
            Self::Easy => 0.5,
            Self::Normal => 0.375,
            Self::Hard => 0.25,
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Easy),
            2 => Ok(Self::Normal),
            3 => Ok(Self::Hard),
            other => Err(format!("difficulty tier must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.tier()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tier())
    }
}

/// Journey-wide tunables shared by every session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailConfig {
    #[serde(default = "TrailConfig::default_total_miles")]
    pub total_miles: i32,
    #[serde(default = "TrailConfig::default_starting_money")]
    pub starting_money: f32,
    #[serde(default = "TrailConfig::default_party_size")]
    pub party_size: u8,
    /// Miles already behind the party per difficulty tier; used to back-date the calendar.
    #[serde(default = "TrailConfig::default_previous_miles")]
    pub previous_miles: [u32; 3],
    #[serde(default)]
    pub male_names: Vec<String>,
    #[serde(default)]
    pub female_names: Vec<String>,
    #[serde(default = "TrailConfig::default_base_daily_miles")]
    pub base_daily_miles: f32,
    #[serde(default = "TrailConfig::default_daily_mile_std_dev")]
    pub daily_mile_std_dev: f32,
    #[serde(default = "TrailConfig::default_mile_delay_ms")]
    pub mile_delay_ms: u64,
    #[serde(default = "TrailConfig::default_member_tick_interval")]
    pub member_tick_interval: i32,
    #[serde(default = "TrailConfig::default_affliction_damage")]
    pub affliction_damage: i32,
    #[serde(default = "TrailConfig::default_food_std_dev")]
    pub food_std_dev: f32,
    #[serde(default = "TrailConfig::default_river_crossing_miles")]
    pub river_crossing_miles: i32,
}

impl TrailConfig {
    const fn default_total_miles() -> i32 {
        2000
    }

    const fn default_starting_money() -> f32 {
        1000.0
    }

    const fn default_party_size() -> u8 {
        4
    }

    const fn default_previous_miles() -> [u32; 3] {
        [0, 250, 500]
    }

    const fn default_base_daily_miles() -> f32 {
        15.0
    }

    const fn default_daily_mile_std_dev() -> f32 {
        2.0
    }

    const fn default_mile_delay_ms() -> u64 {
        500
    }

    const fn default_member_tick_interval() -> i32 {
        5
    }

    const fn default_affliction_damage() -> i32 {
        10
    }

    const fn default_food_std_dev() -> f32 {
        0.5
    }

    const fn default_river_crossing_miles() -> i32 {
        15
    }

    /// Parse a configuration document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Miles already travelled before the journey starts for `difficulty`.
    #[must_use]
    pub const fn previous_miles_for(&self, difficulty: Difficulty) -> u32 {
        self.previous_miles[difficulty.index()]
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first field outside its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_miles < 1 {
            return Err(ConfigError::MinViolation {
                field: "total_miles",
                min: 1.0,
                value: i32_to_f32(self.total_miles),
            });
        }
        if !(1..=8).contains(&self.party_size) {
            return Err(ConfigError::RangeViolation {
                field: "party_size",
                min: 1.0,
                max: 8.0,
                value: f32::from(self.party_size),
            });
        }
        if !self.starting_money.is_finite() || self.starting_money < 0.0 {
            return Err(ConfigError::MinViolation {
                field: "starting_money",
                min: 0.0,
                value: self.starting_money,
            });
        }
        check_range("base_daily_miles", self.base_daily_miles, 1.0, 100.0)?;
        check_range("daily_mile_std_dev", self.daily_mile_std_dev, 0.0, 10.0)?;
        check_range("food_std_dev", self.food_std_dev, 0.0, 5.0)?;
        if self.member_tick_interval < 1 {
            return Err(ConfigError::MinViolation {
                field: "member_tick_interval",
                min: 1.0,
                value: i32_to_f32(self.member_tick_interval),
            });
        }
        if self.affliction_damage < 0 {
            return Err(ConfigError::MinViolation {
                field: "affliction_damage",
                min: 0.0,
                value: i32_to_f32(self.affliction_damage),
            });
        }
        if self.previous_miles.iter().any(|miles| *miles > 100_000) {
            let worst = self.previous_miles.iter().copied().max().unwrap_or_default();
            return Err(ConfigError::RangeViolation {
                field: "previous_miles",
                min: 0.0,
                max: 100_000.0,
                value: u32_to_f32(worst),
            });
        }
        if self.male_names.is_empty() {
            return Err(ConfigError::EmptyNamePool { gender: "male" });
        }
        if self.female_names.is_empty() {
            return Err(ConfigError::EmptyNamePool { gender: "female" });
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            total_miles: Self::default_total_miles(),
            starting_money: Self::default_starting_money(),
            party_size: Self::default_party_size(),
            previous_miles: Self::default_previous_miles(),
            male_names: vec!["Jedediah".into(), "Silas".into(), "Amos".into()],
            female_names: vec!["Eliza".into(), "Harriet".into(), "Ruth".into()],
            base_daily_miles: Self::default_base_daily_miles(),
            daily_mile_std_dev: Self::default_daily_mile_std_dev(),
            mile_delay_ms: Self::default_mile_delay_ms(),
            member_tick_interval: Self::default_member_tick_interval(),
            affliction_damage: Self::default_affliction_damage(),
            food_std_dev: Self::default_food_std_dev(),
            river_crossing_miles: Self::default_river_crossing_miles(),
        }
    }
}

/// Errors raised when trail configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f32,
        value: f32,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{gender} name pool is empty")]
    EmptyNamePool { gender: &'static str },
}
