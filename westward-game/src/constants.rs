//! Centralized balance constants, built-in screen ids and consequence keys.
//!
//! Tunables that operators may reasonably adjust live in
//! [`TrailConfig`](crate::config::TrailConfig); the values here define the
//! fixed rules of the simulation.

// Built-in screens ---------------------------------------------------------
pub const SCREEN_INTRO: &str = "intro";
pub const SCREEN_TRAVEL: &str = "travel";
pub const SCREEN_CONSEQUENCE: &str = "consequence";
pub const SCREEN_VICTORY: &str = "victory";
pub const SCREEN_LOSS: &str = "loss";

/// Screens every catalog must provide because the scheduler enqueues them directly.
pub const REQUIRED_SCREENS: [&str; 5] = [
    SCREEN_INTRO,
    SCREEN_TRAVEL,
    SCREEN_CONSEQUENCE,
    SCREEN_VICTORY,
    SCREEN_LOSS,
];

// Consequence keys ---------------------------------------------------------
pub(crate) const NOTE_ADD_DAYS: &str = "notification.addDays";
pub(crate) const NOTE_REMOVE_MILES: &str = "notification.removeMiles";
pub(crate) const NOTE_ADD_STATUS_ALL: &str = "notification.addStatusAll";
pub(crate) const NOTE_REMOVE_ITEM: &str = "notification.removeItem";
pub(crate) const NOTE_REMOVE_ALL_ITEM: &str = "notification.removeAllItem";
pub(crate) const NOTE_REMOVE_RANDOM_ITEM: &str = "notification.removeRandomItem";
pub(crate) const NOTE_REMOVE_MONEY: &str = "notification.removeMoney";
pub(crate) const NOTE_REMOVE_ALL_MONEY: &str = "notification.removeAllMoney";
pub(crate) const NOTE_DEATH_WITH_CAUSE: &str = "notification.deathWithCause";
pub(crate) const NOTE_DEATH_WITHOUT_CAUSE: &str = "notification.deathWithoutCause";
pub(crate) const NOTE_DEATH_FROM_ILLNESS: &str = "notification.deathFromIllness";
pub(crate) const NOTE_WAGON_FIXED: &str = "notification.wagonFixed";
pub(crate) const NOTE_WAGON_BROKE: &str = "notification.wagonBroke";
pub(crate) const NOTE_STARVE: &str = "basicScreen.starve";
pub(crate) const NOTE_CONTINUE_STARVE: &str = "basicScreen.continueStarve";
pub(crate) const NOTE_TRADE_PENALTY: &str = "trading.penalty";
pub(crate) const NOTE_HUNT_INJURY: &str = "hunting.injury";

/// Default message key shown when a status is attached.
pub const DEFAULT_STATUS_OBTAINED_KEY: &str = "notification.addStatus";

// Rules ------------------------------------------------------------------------
/// Status id attached to the whole party when provisions run out.
pub const HUNGER_STATUS_ID: &str = "hunger";
/// Starvation escalates only on calendar days divisible by this value.
pub(crate) const STARVATION_ESCALATION_PERIOD: u8 = 2;
/// Base health before role bonuses are applied.
pub const BASE_MAX_HEALTH: i32 = 100;
/// Share of max health restored or lost when treating a member with no healable affliction.
pub(crate) const UNTREATED_HEALTH_SWING: f32 = 0.2;
/// Attempts a trader allows before walking away.
pub const TRADE_ATTEMPTS: u8 = 3;
/// Mean and spread of items lost when a trader walks away.
pub(crate) const TRADE_PENALTY_MEAN: f64 = 3.0;
pub(crate) const TRADE_PENALTY_STD_DEV: f64 = 1.0;
/// Female traders double the odds of a successful barter.
pub(crate) const FEMALE_TRADER_BONUS: f32 = 2.0;
/// Score weight applied to health, money and item units.
pub(crate) const SCORE_WEIGHT: f64 = 10.0;
/// Uniform travel-speed window used to back-date a new journey's calendar.
pub(crate) const BACKDATE_MILES_PER_DAY: (f64, f64) = (10.0, 20.0);
/// Probability that a harder new game skips a catalog item entirely.
pub(crate) const STARTING_ITEM_SKIP_CHANCE: f64 = 0.5;
/// Probability that a new game starts with a wagon part.
pub(crate) const STARTING_WAGON_PART_CHANCE: f64 = 0.25;
/// Per-spawn-pass chance that a hunting ground adds another animal.
pub(crate) const HUNT_SPAWN_CHANCE: f32 = 0.1;
