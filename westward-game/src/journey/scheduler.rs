//! Day/mile progression state machine.
//!
//! Each call to [`JourneyScheduler::advance`] runs until the scheduler must
//! wait on the presentation side, then reports what it is waiting for. The
//! caller performs the wait (without holding any state lock) and calls again.
//! A day ends in [`Advance::DayComplete`]; the next call starts the next day.
use std::time::Duration;

use crate::catalog::Catalog;
use crate::config::TrailConfig;
use crate::constants::{
    HUNGER_STATUS_ID, NOTE_CONTINUE_STARVE, NOTE_DEATH_FROM_ILLNESS, NOTE_DEATH_WITHOUT_CAUSE,
    NOTE_STARVE, SCREEN_INTRO, SCREEN_TRAVEL, STARVATION_ESCALATION_PERIOD,
};
use crate::events::{Consequence, fire_random_event};
use crate::inventory::{ItemType, daily_food_target};
use crate::journey::{Advance, JourneyEnd, RngBundle};
use crate::member::StatusApplied;
use crate::numbers::round_f64_to_i32;
use crate::party::PartyState;
use crate::presentation::Presenter;
use crate::sampler::gaussian;

/// Externally visible journey state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JourneyState {
    AwaitingInput,
    Traveling,
    LandmarkArrival,
    Ended(JourneyEnd),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    /// Start of a day: announce the trail if at the origin, then wait for idle.
    #[default]
    Begin,
    /// Idle reached; draw the day's mileage.
    Ready,
    Traveling {
        remaining: i32,
        travelled: i32,
    },
    /// A landmark was reached and the day stops short.
    Arrived {
        travelled: i32,
    },
    Provisioning {
        travelled: i32,
    },
    /// Let the last screens drain before the terminal screen.
    Finishing(JourneyEnd),
    Ended(JourneyEnd),
}

/// Drives a party along the trail one mile at a time.
#[derive(Debug, Clone, Default)]
pub struct JourneyScheduler {
    phase: Phase,
}

impl JourneyScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> JourneyState {
        match self.phase {
            Phase::Begin | Phase::Ready => JourneyState::AwaitingInput,
            Phase::Traveling { .. } | Phase::Provisioning { .. } => JourneyState::Traveling,
            Phase::Arrived { .. } => JourneyState::LandmarkArrival,
            Phase::Finishing(end) | Phase::Ended(end) => JourneyState::Ended(end),
        }
    }

    /// Run the journey forward until it needs to wait.
    pub fn advance<P: Presenter + ?Sized>(
        &mut self,
        party: &mut PartyState,
        catalog: &Catalog,
        config: &TrailConfig,
        rng: &mut RngBundle,
        presenter: &P,
    ) -> Advance {
        loop {
            match self.phase {
                Phase::Begin => {
                    if party.is_at_origin() {
                        presenter.enqueue(SCREEN_INTRO);
                    }
                    self.phase = Phase::Ready;
                    return Advance::AwaitIdle;
                }
                Phase::Ready => {
                    let budget = daily_budget(party, config, rng);
                    log::debug!("{} sets out for {budget} miles", party.save_name);
                    self.phase = Phase::Traveling {
                        remaining: budget,
                        travelled: 0,
                    };
                }
                Phase::Traveling {
                    remaining,
                    travelled,
                } => {
                    if remaining <= 0 {
                        self.phase = Phase::Provisioning { travelled };
                        continue;
                    }
                    if let Some(advance) =
                        self.step_mile(party, catalog, config, rng, presenter, remaining, travelled)
                    {
                        return advance;
                    }
                }
                Phase::Arrived { travelled } => {
                    self.phase = Phase::Provisioning { travelled };
                }
                Phase::Provisioning { travelled } => {
                    provision(party, catalog, config, rng, presenter);
                    if party.members.is_empty() {
                        self.phase = Phase::Finishing(JourneyEnd::Loss);
                        return Advance::AwaitDrained;
                    }
                    if travelled > 0 {
                        party.date.increment_day(rng.travel());
                        party.set_last_day_miles(travelled);
                        presenter.enqueue(SCREEN_TRAVEL);
                        party.set_can_sleep(true);
                        party.offer_minigame(rng.minigames());
                    }
                    presenter.set_awaiting_input(true);
                    self.phase = Phase::Begin;
                    return Advance::DayComplete;
                }
                Phase::Finishing(end) => {
                    presenter.enqueue(end.screen_id());
                    log::info!("{} journey ended in {end}", party.save_name);
                    self.phase = Phase::Ended(end);
                    return Advance::Ended(end);
                }
                Phase::Ended(end) => return Advance::Ended(end),
            }
        }
    }

    /// One mile of travel. Returns `None` when the loop should continue
    /// without waiting.
    #[allow(clippy::too_many_arguments)]
    fn step_mile<P: Presenter + ?Sized>(
        &mut self,
        party: &mut PartyState,
        catalog: &Catalog,
        config: &TrailConfig,
        rng: &mut RngBundle,
        presenter: &P,
        remaining: i32,
        mut travelled: i32,
    ) -> Option<Advance> {
        if !party.is_at_origin() {
            party.modify_mile(1);
            travelled += 1;
        }

        if party.landmarks().next_mile <= party.mile() {
            if let Some(index) = party.advance_landmark(catalog)
                && let Some(landmark) = catalog.landmark(index)
            {
                log::info!("{} reached {}", party.save_name, landmark.name);
                presenter.enqueue(&landmark.screen_id);
            }
            if party.mile() < party.total_miles() {
                self.phase = Phase::Arrived { travelled };
                return None;
            }
        }

        if party.mile() >= party.total_miles() {
            self.phase = Phase::Finishing(JourneyEnd::Victory);
            return Some(Advance::AwaitDrained);
        }

        if let Some(outcome) = fire_random_event(party, catalog, rng.events()) {
            log::debug!("event {} fired at mile {}", outcome.event_id, party.mile());
            presenter.enqueue(&outcome.screen_id);
            for consequence in outcome.consequences {
                presenter.enqueue_consequence(consequence);
            }
        }

        let interval = config.member_tick_interval.max(1);
        if remaining % interval == 0 {
            tick_members(party, config, rng, presenter);
        }

        if party.members.is_empty() {
            self.phase = Phase::Finishing(JourneyEnd::Loss);
            return Some(Advance::AwaitDrained);
        }

        self.phase = Phase::Traveling {
            remaining: remaining - 1,
            travelled,
        };
        Some(Advance::AwaitPace(pace_delay(party, config)))
    }
}

fn daily_budget(party: &PartyState, config: &TrailConfig, rng: &mut RngBundle) -> i32 {
    let mean = f64::from(config.base_daily_miles) * f64::from(party.pace.mileage_multiplier());
    let std_dev = f64::from(config.daily_mile_std_dev);
    round_f64_to_i32(gaussian(rng.travel(), mean, std_dev))
}

fn pace_delay(party: &PartyState, config: &TrailConfig) -> Duration {
    Duration::from_millis(config.mile_delay_ms).div_f64(f64::from(party.pace.mileage_multiplier()))
}

fn tick_members<P: Presenter + ?Sized>(
    party: &mut PartyState,
    config: &TrailConfig,
    rng: &mut RngBundle,
    presenter: &P,
) {
    let difficulty = party.difficulty();
    for member in &mut party.members {
        member.tick(difficulty, config.affliction_damage, rng.members());
    }
    for dead in party.remove_dead() {
        presenter.enqueue_consequence(Consequence::new(NOTE_DEATH_WITHOUT_CAUSE, [dead.name]));
    }
}

/// Eat for the day. Running short attaches hunger to everyone, or escalates
/// it on even calendar days; eating enough clears it.
fn provision<P: Presenter + ?Sized>(
    party: &mut PartyState,
    catalog: &Catalog,
    config: &TrailConfig,
    rng: &mut RngBundle,
    presenter: &P,
) {
    let Some(first) = party.members.first() else {
        return;
    };
    let starving = first.has_status(HUNGER_STATUS_ID);
    let target = daily_food_target(party.members.len(), party.pace.food_multiplier());
    let fed = party.inventory.remove_of_type(
        ItemType::Food,
        target,
        f64::from(config.food_std_dev),
        rng.provisions(),
    );
    if fed {
        if starving {
            for member in &mut party.members {
                member.remove_status(HUNGER_STATUS_ID);
            }
            log::debug!("{} has food again", party.save_name);
        }
        return;
    }

    let hunger = catalog.status(HUNGER_STATUS_ID).instantiate();
    if !starving {
        for member in &mut party.members {
            member.add_status(&hunger);
        }
        presenter.enqueue_consequence(Consequence::new(NOTE_STARVE, []));
    } else if party.date.day() % STARVATION_ESCALATION_PERIOD == 0 {
        let mut fatal = false;
        for member in &mut party.members {
            fatal |= member.add_status(&hunger) == StatusApplied::Fatal;
        }
        presenter.enqueue_consequence(Consequence::new(NOTE_CONTINUE_STARVE, []));
        if fatal {
            for dead in party.remove_dead() {
                presenter.enqueue_consequence(Consequence::new(
                    NOTE_DEATH_FROM_ILLNESS,
                    [dead.name, HUNGER_STATUS_ID.to_string()],
                ));
            }
        }
    }
}
