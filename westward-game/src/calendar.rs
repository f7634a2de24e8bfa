//! Journey calendar: month/day bookkeeping with daily weather.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::weather::forecast_temperature;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Self; 12] = [
        Self::Jan,
        Self::Feb,
        Self::Mar,
        Self::Apr,
        Self::May,
        Self::Jun,
        Self::Jul,
        Self::Aug,
        Self::Sep,
        Self::Oct,
        Self::Nov,
        Self::Dec,
    ];

    /// 1-based month number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Jan => 1,
            Self::Feb => 2,
            Self::Mar => 3,
            Self::Apr => 4,
            Self::May => 5,
            Self::Jun => 6,
            Self::Jul => 7,
            Self::Aug => 8,
            Self::Sep => 9,
            Self::Oct => 10,
            Self::Nov => 11,
            Self::Dec => 12,
        }
    }

    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Days in the month; February always has 28.
    #[must_use]
    pub const fn days(self) -> u8 {
        match self {
            Self::Feb => 28,
            Self::Apr | Self::Jun | Self::Sep | Self::Nov => 30,
            _ => 31,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Jan => Self::Feb,
            Self::Feb => Self::Mar,
            Self::Mar => Self::Apr,
            Self::Apr => Self::May,
            Self::May => Self::Jun,
            Self::Jun => Self::Jul,
            Self::Jul => Self::Aug,
            Self::Aug => Self::Sep,
            Self::Sep => Self::Oct,
            Self::Oct => Self::Nov,
            Self::Nov => Self::Dec,
            Self::Dec => Self::Jan,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Jan => "January",
            Self::Feb => "February",
            Self::Mar => "March",
            Self::Apr => "April",
            Self::May => "May",
            Self::Jun => "June",
            Self::Jul => "July",
            Self::Aug => "August",
            Self::Sep => "September",
            Self::Oct => "October",
            Self::Nov => "November",
            Self::Dec => "December",
        }
    }
}

/// Month and day on the trail, with the day's forecast temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    month: Month,
    day: u8,
    #[serde(default)]
    temperature: i32,
}

impl CalendarDate {
    /// Build a date, clamping `day` into the month.
    #[must_use]
    pub fn new(month: Month, day: u8) -> Self {
        Self {
            month,
            day: day.clamp(1, month.days()),
            temperature: 0,
        }
    }

    #[must_use]
    pub const fn month(&self) -> Month {
        self.month
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    /// Fahrenheit temperature forecast for the current day.
    #[must_use]
    pub const fn temperature(&self) -> i32 {
        self.temperature
    }

    /// Advance one day, rolling month and year, and re-forecast the weather.
    pub fn increment_day<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.day += 1;
        if self.day > self.month.days() {
            self.day = 1;
            self.month = self.month.next();
        }
        self.temperature = forecast_temperature(self.month, rng);
    }

    /// Advance `days` whole days.
    pub fn add_days<R: Rng + ?Sized>(&mut self, days: u32, rng: &mut R) {
        for _ in 0..days {
            self.increment_day(rng);
        }
    }

    /// Re-draw today's temperature without moving the date.
    pub fn forecast<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.temperature = forecast_temperature(self.month, rng);
    }
}

const fn ordinal_suffix(day: u8) -> &'static str {
    if matches!(day % 100, 11..=13) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.month.name(),
            self.day,
            ordinal_suffix(self.day)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn increment_rolls_month_and_year() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut date = CalendarDate::new(Month::Feb, 28);
        date.increment_day(&mut rng);
        assert_eq!((date.month(), date.day()), (Month::Mar, 1));

        let mut date = CalendarDate::new(Month::Dec, 31);
        date.increment_day(&mut rng);
        assert_eq!((date.month(), date.day()), (Month::Jan, 1));
    }

    #[test]
    fn add_days_spans_months() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut date = CalendarDate::new(Month::Apr, 25);
        date.add_days(10, &mut rng);
        assert_eq!((date.month(), date.day()), (Month::May, 5));
        date.add_days(0, &mut rng);
        assert_eq!(date.day(), 5);
    }

    #[test]
    fn new_clamps_day_into_month() {
        assert_eq!(CalendarDate::new(Month::Feb, 31).day(), 28);
        assert_eq!(CalendarDate::new(Month::Jul, 0).day(), 1);
    }

    #[test]
    fn month_numbers_round_trip() {
        for month in Month::ALL {
            assert_eq!(Month::from_number(month.number()), Some(month));
        }
        assert_eq!(Month::from_number(0), None);
        assert_eq!(Month::from_number(13), None);
    }

    #[test]
    fn display_uses_english_ordinals() {
        assert_eq!(CalendarDate::new(Month::Apr, 1).to_string(), "April 1st");
        assert_eq!(CalendarDate::new(Month::May, 12).to_string(), "May 12th");
        assert_eq!(CalendarDate::new(Month::Jun, 23).to_string(), "June 23rd");
    }
}
