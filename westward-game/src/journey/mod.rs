//! Journey progression: seeded RNG streams, the day scheduler and session hosting.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;

use crate::constants::{SCREEN_LOSS, SCREEN_VICTORY};

pub mod host;
pub mod scheduler;
pub mod session;

pub use host::{SessionError, SessionHost, TickStatus};
pub use scheduler::{JourneyScheduler, JourneyState};
pub use session::JourneySession;

/// How a journey ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyEnd {
    Victory,
    Loss,
}

impl JourneyEnd {
    #[must_use]
    pub const fn screen_id(self) -> &'static str {
        match self {
            Self::Victory => SCREEN_VICTORY,
            Self::Loss => SCREEN_LOSS,
        }
    }
}

impl fmt::Display for JourneyEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Victory => "victory",
            Self::Loss => "loss",
        })
    }
}

/// What the scheduler needs before it can make further progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Wait until no screen is pending and no input is awaited.
    AwaitIdle,
    /// Wait until no screen is pending.
    AwaitDrained,
    /// Sleep for the pacing delay, then wait until no screen is pending.
    AwaitPace(Duration),
    /// The day is done and the operator has been asked for input.
    DayComplete,
    /// The journey is over; the terminal screen has been queued.
    Ended(JourneyEnd),
}

/// Simulation domains that each draw from their own random stream, so extra
/// draws in one domain never shift the sequence seen by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Daily mileage and the calendar.
    Travel,
    Events,
    /// Affliction ticks.
    Members,
    Provisions,
    /// Minigame offers, hunting and crossings.
    Minigames,
    Camp,
    Trade,
}

impl Stream {
    pub const ALL: [Self; 7] = [
        Self::Travel,
        Self::Events,
        Self::Members,
        Self::Provisions,
        Self::Minigames,
        Self::Camp,
        Self::Trade,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Events => "events",
            Self::Members => "members",
            Self::Provisions => "provisions",
            Self::Minigames => "minigames",
            Self::Camp => "camp",
            Self::Trade => "trade",
        }
    }

    /// Seed for this stream: HMAC-SHA256 of the label keyed by the user seed.
    fn seed(self, user_seed: u64) -> u64 {
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
            return user_seed;
        };
        mac.update(self.label().as_bytes());
        mac.finalize()
            .into_bytes()
            .iter()
            .take(8)
            .rev()
            .fold(0, |seed, byte| (seed << 8) | u64::from(*byte))
    }
}

/// Per-session random streams, all derived from one user seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    streams: [CountingRng<SmallRng>; Stream::ALL.len()],
}

impl RngBundle {
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            streams: Stream::ALL.map(|stream| CountingRng::new(SmallRng::seed_from_u64(stream.seed(seed)))),
        }
    }

    pub fn stream(&mut self, stream: Stream) -> &mut CountingRng<SmallRng> {
        &mut self.streams[stream as usize]
    }

    pub fn travel(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Travel)
    }

    pub fn events(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Events)
    }

    pub fn members(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Members)
    }

    pub fn provisions(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Provisions)
    }

    pub fn minigames(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Minigames)
    }

    pub fn camp(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Camp)
    }

    pub fn trade(&mut self) -> &mut CountingRng<SmallRng> {
        self.stream(Stream::Trade)
    }

    #[must_use]
    pub fn draws(&self, stream: Stream) -> u64 {
        self.streams[stream as usize].count
    }

    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.streams.iter().map(|stream| stream.count).sum()
    }
}

/// RNG adapter that counts calls, for replay diagnostics.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    inner: R,
    count: u64,
}

impl<R: RngCore> CountingRng<R> {
    pub const fn new(inner: R) -> Self {
        Self { inner, count: 0 }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    fn tally(&mut self) -> &mut R {
        self.count = self.count.saturating_add(1);
        &mut self.inner
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.tally().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.tally().next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.tally().fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.tally().try_fill_bytes(dest)
    }
}
