//! A live journey: the scheduler, its party and the operator's between-day actions.
use std::sync::Arc;

use rand::Rng;

use crate::camp::{self, TreatmentOutcome};
use crate::catalog::{Catalog, ScreenKind};
use crate::config::{Pace, TrailConfig};
use crate::crossing::{self, CrossingOutcome};
use crate::hunt::{Hunt, ShotOutcome};
use crate::journey::{Advance, JourneyScheduler, JourneyState, RngBundle};
use crate::party::{MiniGame, PartyState};
use crate::presentation::Presenter;
use crate::save::SaveData;
use crate::trade::{PurchaseOutcome, TradeResult, TradeSession};
use crate::GameAssets;

/// High-level session wrapper binding the scheduler to a live party.
#[derive(Debug, Clone)]
pub struct JourneySession {
    party: PartyState,
    scheduler: JourneyScheduler,
    rng: RngBundle,
    catalog: Arc<Catalog>,
    config: Arc<TrailConfig>,
}

impl JourneySession {
    /// Start (or resume) a journey from a save record.
    #[must_use]
    pub fn new(save: SaveData, assets: &GameAssets, seed: u64) -> Self {
        let party = PartyState::from_save(save, &assets.catalog, assets.config.total_miles);
        log::info!(
            "session {} started at mile {} with {} members",
            party.save_name,
            party.mile(),
            party.members.len()
        );
        Self {
            party,
            scheduler: JourneyScheduler::new(),
            rng: RngBundle::from_user_seed(seed),
            catalog: Arc::clone(&assets.catalog),
            config: Arc::clone(&assets.config),
        }
    }

    #[must_use]
    pub const fn party(&self) -> &PartyState {
        &self.party
    }

    pub const fn party_mut(&mut self) -> &mut PartyState {
        &mut self.party
    }

    #[must_use]
    pub const fn state(&self) -> JourneyState {
        self.scheduler.state()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    /// Run the scheduler until it needs to wait on `presenter`.
    pub fn advance<P: Presenter + ?Sized>(&mut self, presenter: &P) -> Advance {
        self.scheduler.advance(
            &mut self.party,
            &self.catalog,
            &self.config,
            &mut self.rng,
            presenter,
        )
    }

    #[must_use]
    pub fn build_save_data(&self) -> SaveData {
        self.party.build_save_data()
    }

    pub fn set_pace(&mut self, pace: Pace) {
        log::debug!("{} changes pace to {pace}", self.party.save_name);
        self.party.pace = pace;
    }

    /// Sleep through the night if the party has travelled since it last rested.
    pub fn rest(&mut self) -> bool {
        camp::rest(&mut self.party, self.rng.travel())
    }

    /// Have the party's healer treat one member.
    ///
    /// # Panics
    ///
    /// Panics if `patient` is out of bounds.
    pub fn treat(&mut self, patient: usize) -> TreatmentOutcome {
        camp::treat_member(&mut self.party, patient, self.rng.camp())
    }

    pub fn cross_river(&mut self, succeeded: bool) -> CrossingOutcome {
        crossing::cross_river(&mut self.party, &self.config, succeeded)
    }

    /// Buy from the shop screen `shop_screen_id`. `None` when that shop does
    /// not list `item_id`.
    pub fn purchase(&mut self, shop_screen_id: &str, item_id: &str, amount: u32) -> Option<PurchaseOutcome> {
        let screen = self.catalog.screens().find(shop_screen_id)?;
        let ScreenKind::Shop { listings } = &screen.kind else {
            return None;
        };
        let listing = listings.iter().find(|listing| listing.item_id == item_id)?;
        Some(listing.purchase(&mut self.party, &self.catalog, amount))
    }

    /// Meet the trader behind the trading screen `screen_id`.
    pub fn open_trade(&mut self, screen_id: &str) -> Option<TradeSession> {
        let screen = self.catalog.screens().find(screen_id)?;
        let ScreenKind::Trading { goods, .. } = &screen.kind else {
            return None;
        };
        TradeSession::open(goods, self.rng.trade())
    }

    /// Put an offer to an open trader, drawing from the session's trade stream.
    pub fn offer_trade(
        &mut self,
        trade: &mut TradeSession,
        negotiator: usize,
        offer: &[(&str, u32)],
    ) -> TradeResult {
        trade.offer(&mut self.party, &self.catalog, negotiator, offer, self.rng.trade())
    }

    /// Accept an offered hunt on a random hunting ground.
    ///
    /// `None` when no hunt is on offer or the catalog has no hunting grounds.
    pub fn start_hunt(&mut self) -> Option<Hunt> {
        if self.party.minigame() != MiniGame::Hunting {
            return None;
        }
        let grounds = self.catalog.hunting_grounds().all();
        if grounds.is_empty() {
            return None;
        }
        self.party.play_minigame();
        let rng = self.rng.minigames();
        let ground = grounds[rng.gen_range(0..grounds.len())].clone();
        let mut hunt = Hunt::new(ground);
        hunt.spawn(rng);
        Some(hunt)
    }

    pub fn shoot(&mut self, hunt: &mut Hunt, target: Option<usize>) -> ShotOutcome {
        let rng = self.rng.minigames();
        let outcome = hunt.shoot(&mut self.party, &self.catalog, target, rng);
        hunt.spawn(rng);
        outcome
    }
}
