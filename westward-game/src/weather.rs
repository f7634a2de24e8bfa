//! Daily temperature forecasting by season.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calendar::Month;

/// Broad temperature reading used by the presentation side and rule constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Climate {
    Freezing,
    Cold,
    Mild,
    Hot,
}

impl Climate {
    #[must_use]
    pub const fn from_temperature(fahrenheit: i32) -> Self {
        match fahrenheit {
            i32::MIN..=32 => Self::Freezing,
            33..=50 => Self::Cold,
            51..=75 => Self::Mild,
            _ => Self::Hot,
        }
    }

    #[must_use]
    pub const fn i18n_key(self) -> &'static str {
        match self {
            Self::Freezing => "weather.freezing",
            Self::Cold => "weather.cold",
            Self::Mild => "weather.mild",
            Self::Hot => "weather.hot",
        }
    }
}

/// Half-open Fahrenheit band a month's daily temperature is drawn from.
#[must_use]
pub const fn temperature_band(month: Month) -> (i32, i32) {
    match month {
        Month::Nov | Month::Dec | Month::Jan | Month::Feb => (0, 45),
        Month::Mar | Month::Apr => (20, 60),
        Month::May | Month::Jun | Month::Jul | Month::Aug | Month::Sep => (55, 90),
        Month::Oct => (30, 65),
    }
}

/// Draw the day's temperature for `month`.
pub fn forecast_temperature<R: Rng + ?Sized>(month: Month, rng: &mut R) -> i32 {
    let (low, high) = temperature_band(month);
    rng.gen_range(low..high)
}
