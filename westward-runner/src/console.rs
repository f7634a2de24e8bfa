//! Console front end: drains the screen queue and answers each day's prompt
//! with a simple autopilot.
use colored::Colorize;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use westward_game::catalog::ScreenKind;
use westward_game::constants::{SCREEN_CONSEQUENCE, SCREEN_LOSS, SCREEN_VICTORY};
use westward_game::numbers::{round_f64_to_u32, u32_to_f32};
use westward_game::{
    CrossingOutcome, GameStorage, ItemType, JourneySession, MiniGame, Presenter,
    PurchaseOutcome, ScreenQueue, SessionHost, ShotOutcome, TradeResult, TreatmentOutcome,
};

const POLL: Duration = Duration::from_millis(50);
const SHOTS_PER_HUNT: usize = 5;
const FOOD_RESTOCK: u32 = 50;
/// Food units per member below which the autopilot restocks at a shop.
const LOW_FOOD_PER_MEMBER: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Victory,
    Loss,
    /// Stopped at the day limit; the journey was saved.
    Saved,
    /// The session went away without a terminal screen.
    Abandoned,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Victory => "victory",
            Self::Loss => "loss",
            Self::Saved => "saved",
            Self::Abandoned => "abandoned",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub mile: i32,
    pub total_miles: i32,
    pub date: String,
    pub score: i64,
    pub survivors: Vec<String>,
}

impl Snapshot {
    fn capture(session: &JourneySession) -> Self {
        let party = session.party();
        Self {
            mile: party.mile(),
            total_miles: party.total_miles(),
            date: party.date.to_string(),
            score: party.score(),
            survivors: party.member_names(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub outcome: Outcome,
    pub days: u32,
    pub snapshot: Snapshot,
}

pub struct Console<S: GameStorage> {
    host: Arc<SessionHost<S, ScreenQueue>>,
    queue: Arc<ScreenQueue>,
    rng: SmallRng,
    max_days: Option<u32>,
    quiet: bool,
}

impl<S: GameStorage> Console<S> {
    pub fn new(host: Arc<SessionHost<S, ScreenQueue>>, seed: u64, max_days: Option<u32>, quiet: bool) -> Self {
        let queue = Arc::clone(host.presenter());
        Self {
            host,
            queue,
            rng: SmallRng::seed_from_u64(seed ^ 0x00C0_FFEE),
            max_days,
            quiet,
        }
    }

    /// Present screens until the journey ends or the day limit is hit.
    ///
    /// # Errors
    ///
    /// Returns an error if saving at the day limit fails.
    pub fn run(mut self) -> anyhow::Result<Summary> {
        let mut days = 0;
        let mut snapshot = self.host.with_frame(Snapshot::capture).unwrap_or_default();
        let mut outcome = None;

        loop {
            if !self.queue.wait_for_work(POLL) {
                if !self.host.is_active() {
                    break;
                }
                continue;
            }

            while let Some(screen_id) = self.queue.peek() {
                match screen_id.as_str() {
                    SCREEN_VICTORY => outcome = Some(Outcome::Victory),
                    SCREEN_LOSS => outcome = Some(Outcome::Loss),
                    _ => {}
                }
                if outcome.is_some()
                    && let Some(last) = self.host.with_frame(Snapshot::capture)
                {
                    snapshot = last;
                }
                self.show(&screen_id);
                self.queue.pop();
            }

            if outcome.is_some() {
                continue;
            }
            if self.queue.is_awaiting_input() && self.queue.is_empty() {
                days += 1;
                if let Some(current) = self.host.with_frame(Snapshot::capture) {
                    snapshot = current;
                }
                if self.max_days.is_some_and(|limit| days >= limit) {
                    log::info!("day limit reached after {days} days");
                    if let Some(saved) = self.host.end_session(true)? {
                        log::info!("saved `{}` at mile {}", saved.save_name, saved.mile);
                    }
                    outcome = Some(Outcome::Saved);
                    break;
                }
                self.answer_day();
                self.queue.release_input();
            }
        }

        Ok(Summary {
            outcome: outcome.unwrap_or(Outcome::Abandoned),
            days,
            snapshot,
        })
    }

    fn say(&self, line: impl fmt::Display) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn show(&self, screen_id: &str) {
        if screen_id == SCREEN_CONSEQUENCE {
            if let Some(consequence) = self.queue.pop_consequence() {
                self.say(format!("  ! {consequence}").yellow());
            }
            return;
        }
        let kind = self
            .host
            .with_frame(|session| session.catalog().screens().find(screen_id).map(|screen| screen.kind.clone()))
            .flatten();
        match kind {
            Some(ScreenKind::Peril { text_key, .. }) => self.say(format!("  ~ {text_key}").red()),
            Some(ScreenKind::Landmark { text_key, .. }) => self.say(format!("[{text_key}]").bright_green()),
            Some(ScreenKind::Trading { text_key, .. }) => {
                self.say(format!("  $ {text_key}").cyan());
                self.barter(screen_id);
            }
            Some(ScreenKind::Shop { .. }) => self.say(format!("  $ {screen_id}").cyan()),
            Some(ScreenKind::Builtin) | None => match screen_id {
                SCREEN_VICTORY => self.say("The party reached the end of the trail.".bright_green().bold()),
                SCREEN_LOSS => self.say("Nobody in the party survived.".red().bold()),
                _ => {
                    if let Some(line) = self.host.with_frame(|session| {
                        let party = session.party();
                        format!(
                            "{screen_id:>12}  {}  mile {}/{}  food {}",
                            party.date,
                            party.mile(),
                            party.total_miles(),
                            party.inventory.count_of_type(ItemType::Food)
                        )
                    }) {
                        self.say(line.dimmed());
                    }
                }
            },
        }
    }

    /// One barter attempt with the best item that matches the good's worth.
    fn barter(&self, screen_id: &str) {
        let result = self.host.with_session_mut(|session| {
            let mut trade = session.open_trade(screen_id)?;
            if session.party().members.is_empty() {
                return None;
            }
            let wanted = trade.good().barter_value;
            let offer = session
                .party()
                .inventory
                .stacks()
                .iter()
                .filter(|stack| stack.barter_value > 0.0)
                .find(|stack| stack.barter_value * u32_to_f32(stack.count) >= wanted)
                .map(|stack| {
                    let count = round_f64_to_u32(f64::from(wanted / stack.barter_value).ceil()).max(1);
                    (stack.id.clone(), count.min(stack.count))
                })?;
            let good = trade.good().id.clone();
            let result = session.offer_trade(&mut trade, 0, &[(offer.0.as_str(), offer.1)]);
            Some((good, result))
        });
        match result.flatten() {
            Some((good, TradeResult::Accepted)) => self.say(format!("    traded for {good}").cyan()),
            Some((good, result)) => log::debug!("trade for {good} failed: {result:?}"),
            None => log::debug!("nothing worth offering at {screen_id}"),
        }
    }

    /// Autopilot for the end-of-day prompt.
    fn answer_day(&mut self) {
        let river_roll = self.rng.gen_bool(0.6);
        let notes = self
            .host
            .with_session_mut(|session| {
                let mut notes = Vec::new();
                restock(session, &mut notes);
                treat_someone(session, &mut notes);
                match session.party().minigame() {
                    MiniGame::Hunting => hunt(session, &mut notes),
                    MiniGame::River => match session.cross_river(river_roll) {
                        CrossingOutcome::Crossed { miles } => notes.push(format!("forded the river (+{miles} mi)")),
                        CrossingOutcome::SweptBack { miles } => notes.push(format!("swept back {miles} mi")),
                        CrossingOutcome::NotOffered => {}
                    },
                    MiniGame::None => {}
                }
                if session.rest() {
                    notes.push("rested".to_string());
                }
                notes
            })
            .unwrap_or_default();
        for note in notes {
            self.say(format!("    - {note}").blue());
        }
    }
}

fn restock(session: &mut JourneySession, notes: &mut Vec<String>) {
    let party = session.party();
    if !party.is_at_civilization() {
        return;
    }
    let members = u32::try_from(party.members.len()).unwrap_or(u32::MAX);
    if party.inventory.count_of_type(ItemType::Food) >= LOW_FOOD_PER_MEMBER.saturating_mul(members) {
        return;
    }
    let Some(shop) = party
        .landmarks()
        .last_index
        .and_then(|index| session.catalog().landmark(index))
        .and_then(|landmark| landmark.shop_screen_id.clone())
    else {
        return;
    };
    let food = session.catalog().screens().find(&shop).and_then(|screen| match &screen.kind {
        ScreenKind::Shop { listings } => listings
            .iter()
            .find(|listing| listing.item_type == ItemType::Food)
            .map(|listing| listing.item_id.clone()),
        _ => None,
    });
    if let Some(food) = food
        && let Some(PurchaseOutcome::Bought { spent }) = session.purchase(&shop, &food, FOOD_RESTOCK)
    {
        notes.push(format!("bought {FOOD_RESTOCK} {food} for ${spent:.2}"));
    }
}

fn treat_someone(session: &mut JourneySession, notes: &mut Vec<String>) {
    let party = session.party();
    if !party.has_healers() || party.inventory.count_of_type(ItemType::Medicine) == 0 {
        return;
    }
    let Some(patient) = party
        .members
        .iter()
        .position(|member| member.has_healable_status() || member.is_hurt())
    else {
        return;
    };
    let name = party.members[patient].name.clone();
    match session.treat(patient) {
        TreatmentOutcome::HealthRestored { amount } => notes.push(format!("{name} recovered {amount} health")),
        TreatmentOutcome::AfflictionEased { status } => notes.push(format!("{name}'s {status} eased")),
        TreatmentOutcome::HealthLost { amount } => notes.push(format!("{name} lost {amount} health in treatment")),
        TreatmentOutcome::AfflictionWorsened { status } => notes.push(format!("{name}'s {status} worsened")),
        TreatmentOutcome::Died { name } => notes.push(format!("{name} died under treatment")),
        TreatmentOutcome::NoHealer | TreatmentOutcome::NoMedicine | TreatmentOutcome::NothingToTreat => {}
    }
}

fn hunt(session: &mut JourneySession, notes: &mut Vec<String>) {
    let Some(mut trip) = session.start_hunt() else {
        return;
    };
    for _ in 0..SHOTS_PER_HUNT {
        let target = trip
            .herd()
            .iter()
            .enumerate()
            .max_by_key(|(_, animal)| trip.quarry_of(animal).score)
            .map(|(index, _)| index);
        match session.shoot(&mut trip, target) {
            ShotOutcome::NoAmmunition => {
                notes.push("out of ammunition".to_string());
                break;
            }
            ShotOutcome::Downed { quarry_id, .. } => notes.push(format!("shot a {quarry_id}")),
            ShotOutcome::Missed | ShotOutcome::Wounded { .. } => {}
        }
    }
    notes.push(format!("hunt scored {} in {} shots", trip.score(), trip.shots_fired()));
}
