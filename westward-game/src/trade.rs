//! Shops and trading posts.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Catalog;
use crate::constants::{
    FEMALE_TRADER_BONUS, NOTE_TRADE_PENALTY, TRADE_ATTEMPTS, TRADE_PENALTY_MEAN,
    TRADE_PENALTY_STD_DEV,
};
use crate::events::Consequence;
use crate::inventory::ItemType;
use crate::member::Gender;
use crate::numbers::u32_to_f32;
use crate::party::PartyState;
use crate::sampler::gaussian_or_exact;

/// One item a shop sells at a fixed unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopListing {
    pub item_id: String,
    pub item_type: ItemType,
    pub price: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PurchaseOutcome {
    Bought { spent: f32 },
    Unaffordable { cost: f32 },
}

impl ShopListing {
    /// Buy `amount` units. Nothing changes when the party cannot pay.
    ///
    /// # Panics
    ///
    /// Panics if the listing names an item missing from `catalog`.
    pub fn purchase(&self, party: &mut PartyState, catalog: &Catalog, amount: u32) -> PurchaseOutcome {
        let cost = self.price * u32_to_f32(amount);
        if cost > party.money() {
            log::debug!("{} cannot afford {amount} x {} ({cost:.2})", party.save_name, self.item_id);
            return PurchaseOutcome::Unaffordable { cost };
        }
        party.modify_money(-cost);
        party.inventory.add(catalog.item(&self.item_id).stack(amount));
        PurchaseOutcome::Bought { spent: cost }
    }
}

/// A good a trading post may put up for barter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeGood {
    pub id: String,
    pub chance: f32,
    pub barter_value: f32,
}

/// Pick a good by walking cumulative chances against one uniform draw.
///
/// Falls back to the last good when the chances sum below the draw.
pub fn pick_trade_good<'g, R: Rng + ?Sized>(goods: &'g [TradeGood], rng: &mut R) -> Option<&'g TradeGood> {
    let selection = rng.r#gen::<f32>();
    let mut accumulated = 0.0;
    for good in goods {
        accumulated += good.chance;
        if accumulated >= selection {
            return Some(good);
        }
    }
    goods.last()
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeResult {
    /// The trader took the offer and handed over one unit of the good.
    Accepted,
    /// The offer was refused; the trader will hear more offers.
    Refused { attempts_left: u8 },
    /// The last attempt failed and the trader took items on the way out.
    WalkedAway { items_lost: u32 },
    /// The offer named items the party does not hold; no attempt was used.
    InvalidOffer { item_id: String },
    /// The trader is gone.
    Closed,
}

impl TradeResult {
    #[must_use]
    pub fn consequence(&self) -> Option<Consequence> {
        match self {
            Self::WalkedAway { items_lost } => Some(Consequence::new(
                NOTE_TRADE_PENALTY,
                [items_lost.to_string()],
            )),
            _ => None,
        }
    }
}

/// Haggling with one trader over one good.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSession {
    good: TradeGood,
    attempts_left: u8,
}

impl TradeSession {
    /// Open a session at a post, or `None` when it has nothing to trade.
    pub fn open<R: Rng + ?Sized>(goods: &[TradeGood], rng: &mut R) -> Option<Self> {
        pick_trade_good(goods, rng).map(|good| Self {
            good: good.clone(),
            attempts_left: TRADE_ATTEMPTS,
        })
    }

    #[must_use]
    pub const fn good(&self) -> &TradeGood {
        &self.good
    }

    #[must_use]
    pub const fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    /// Success probability for an offer worth `offered_value`.
    #[must_use]
    pub fn success_chance(&self, party: &PartyState, negotiator: Gender, offered_value: f32) -> f32 {
        if self.good.barter_value <= 0.0 {
            return 1.0;
        }
        let mut multiplier = party.difficulty().trade_multiplier();
        if negotiator == Gender::Female {
            multiplier *= FEMALE_TRADER_BONUS;
        }
        multiplier * offered_value / self.good.barter_value
    }

    /// Offer `(item id, count)` pairs for the good, negotiated by `negotiator`
    /// (an index into the party's members).
    ///
    /// Lines naming the same item are summed before the offer is checked
    /// against held stock.
    ///
    /// # Panics
    ///
    /// Panics if `negotiator` is out of bounds or the good is missing from `catalog`.
    pub fn offer<R: Rng + ?Sized>(
        &mut self,
        party: &mut PartyState,
        catalog: &Catalog,
        negotiator: usize,
        offer: &[(&str, u32)],
        rng: &mut R,
    ) -> TradeResult {
        if self.attempts_left == 0 {
            return TradeResult::Closed;
        }
        let mut requested: BTreeMap<&str, u32> = BTreeMap::new();
        for &(id, count) in offer {
            let total = requested.entry(id).or_default();
            *total = total.saturating_add(count);
        }
        let mut offered_value = 0.0;
        for (&id, &count) in &requested {
            match party.inventory.find(id) {
                Some(stack) if stack.count >= count => {
                    offered_value += stack.barter_value * u32_to_f32(count);
                }
                _ => {
                    return TradeResult::InvalidOffer {
                        item_id: id.to_string(),
                    };
                }
            }
        }
        let gender = party.members[negotiator].gender;
        let chance = self.success_chance(party, gender, offered_value);
        if rng.r#gen::<f32>() <= chance {
            for (&id, &count) in &requested {
                if !party.inventory.remove(id, count) {
                    log::error!("{} lost track of {count} x {id} mid-trade", party.save_name);
                    return TradeResult::InvalidOffer {
                        item_id: id.to_string(),
                    };
                }
            }
            let mut received = catalog.item(&self.good.id).stack(1);
            received.barter_value = self.good.barter_value;
            party.inventory.add(received);
            self.attempts_left = TRADE_ATTEMPTS;
            log::info!("{} traded for {}", party.save_name, self.good.id);
            return TradeResult::Accepted;
        }
        self.attempts_left -= 1;
        if self.attempts_left > 0 {
            return TradeResult::Refused {
                attempts_left: self.attempts_left,
            };
        }
        let penalty = gaussian_or_exact(rng, TRADE_PENALTY_MEAN, TRADE_PENALTY_STD_DEV).max(0);
        let items_lost = party
            .inventory
            .remove_random_items(u32::try_from(penalty).unwrap_or(0), rng);
        log::info!("trader walked away from {} taking {items_lost} items", party.save_name);
        TradeResult::WalkedAway { items_lost }
    }
}
