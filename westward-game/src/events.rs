//! Random trail events: selection, constraint gating and effect application.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Catalog, CatalogRef};
use crate::constants::{
    NOTE_ADD_DAYS, NOTE_ADD_STATUS_ALL, NOTE_DEATH_FROM_ILLNESS, NOTE_DEATH_WITH_CAUSE,
    NOTE_DEATH_WITHOUT_CAUSE, NOTE_REMOVE_ALL_ITEM, NOTE_REMOVE_ALL_MONEY, NOTE_REMOVE_ITEM,
    NOTE_REMOVE_MILES, NOTE_REMOVE_MONEY, NOTE_REMOVE_RANDOM_ITEM, NOTE_WAGON_BROKE,
    NOTE_WAGON_FIXED,
};
use crate::inventory::ItemType;
use crate::member::StatusApplied;
use crate::party::PartyState;
use crate::rules::EventConstraint;
use crate::sampler::IntRange;

/// Mechanical effect of an event; closed so new kinds are checked at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEffect {
    AddDays {
        amount: IntRange,
    },
    RemoveMiles {
        amount: IntRange,
    },
    AddStatusMember {
        status: String,
    },
    AddStatusAll {
        status: String,
    },
    /// Remove units of one item, or random units when no item is named.
    RemoveItems {
        #[serde(default)]
        item: Option<String>,
        amount: IntRange,
    },
    RemoveMoney {
        amount: IntRange,
    },
    Kill {
        #[serde(default)]
        cause: Option<String>,
    },
    ShowScreen,
    /// Spend one wagon part or lose the whole party.
    BreakWagon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAction {
    #[serde(default)]
    pub constraints: Vec<EventConstraint>,
    pub effect: EventEffect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub id: String,
    pub screen_id: String,
    pub chance: f32,
    pub action: EventAction,
}

/// Deferred, human-readable description of an applied effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consequence {
    pub key: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Consequence {
    #[must_use]
    pub fn new(key: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            key: key.into(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Display for Consequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.key)
        } else {
            write!(f, "{} ({})", self.key, self.args.join(", "))
        }
    }
}

/// An event that passed its constraints and was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub event_id: String,
    pub screen_id: String,
    pub consequences: Vec<Consequence>,
}

/// Pick one event uniformly and keep it only if a fresh draw beats its chance.
pub fn select_random_event<'c, R: Rng + ?Sized>(
    catalog: &'c Catalog,
    rng: &mut R,
) -> Option<&'c EventDef> {
    let events = catalog.events().all();
    if events.is_empty() {
        return None;
    }
    let event = &events[rng.gen_range(0..events.len())];
    (rng.r#gen::<f32>() < event.chance).then_some(event)
}

/// Select and execute one random event.
pub fn fire_random_event<R: Rng + ?Sized>(
    party: &mut PartyState,
    catalog: &Catalog,
    rng: &mut R,
) -> Option<EventOutcome> {
    select_random_event(catalog, rng)?.execute(party, catalog, rng)
}

impl EventDef {
    /// Run the event against the party.
    ///
    /// Fails closed on an empty party. One random member provides context for
    /// member-scoped constraints; every constraint must hold or nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if the effect names a status or item missing from `catalog`;
    /// catalogs validate those references when built.
    pub fn execute<R: Rng + ?Sized>(
        &self,
        party: &mut PartyState,
        catalog: &Catalog,
        rng: &mut R,
    ) -> Option<EventOutcome> {
        let index = party.random_member_index(rng)?;
        let member = &party.members[index];
        for constraint in &self.action.constraints {
            let context = constraint.requires_member().then_some(member);
            if !constraint.evaluate(party, context) {
                log::debug!("event {} blocked by {constraint:?}", self.id);
                return None;
            }
        }
        let consequences = apply_effect(&self.action.effect, party, index, catalog, rng);
        log::debug!("event {} applied to {}", self.id, party.save_name);
        Some(EventOutcome {
            event_id: self.id.clone(),
            screen_id: self.screen_id.clone(),
            consequences,
        })
    }

    pub(crate) fn references(&self) -> Vec<CatalogRef<'_>> {
        let mut references = vec![CatalogRef::Screen(&self.screen_id)];
        match &self.action.effect {
            EventEffect::AddStatusMember { status } | EventEffect::AddStatusAll { status } => {
                references.push(CatalogRef::Status(status));
            }
            EventEffect::RemoveItems {
                item: Some(item), ..
            } => references.push(CatalogRef::Item(item)),
            EventEffect::AddDays { .. }
            | EventEffect::RemoveMiles { .. }
            | EventEffect::RemoveItems { item: None, .. }
            | EventEffect::RemoveMoney { .. }
            | EventEffect::Kill { .. }
            | EventEffect::ShowScreen
            | EventEffect::BreakWagon => {}
        }
        references.extend(
            self.action
                .constraints
                .iter()
                .filter_map(EventConstraint::references),
        );
        references
    }
}

fn non_negative_sample<R: Rng + ?Sized>(amount: &IntRange, rng: &mut R) -> u32 {
    u32::try_from(amount.sample(rng).max(0)).unwrap_or(0)
}

fn apply_effect<R: Rng + ?Sized>(
    effect: &EventEffect,
    party: &mut PartyState,
    index: usize,
    catalog: &Catalog,
    rng: &mut R,
) -> Vec<Consequence> {
    match effect {
        EventEffect::AddDays { amount } => {
            let days = non_negative_sample(amount, rng);
            party.date.add_days(days, rng);
            vec![Consequence::new(NOTE_ADD_DAYS, [days.to_string()])]
        }
        EventEffect::RemoveMiles { amount } => {
            let miles = amount.sample(rng);
            party.modify_mile(-miles);
            vec![Consequence::new(NOTE_REMOVE_MILES, [miles.to_string()])]
        }
        EventEffect::AddStatusMember { status } => {
            let affliction = catalog.status(status).instantiate();
            let member = &mut party.members[index];
            let name = member.name.clone();
            let applied = member.add_status(&affliction);
            if applied == StatusApplied::Fatal {
                party.remove_dead();
                vec![Consequence::new(
                    NOTE_DEATH_FROM_ILLNESS,
                    [name, status.clone()],
                )]
            } else {
                vec![Consequence::new(
                    affliction.obtained_key(),
                    [name, status.clone()],
                )]
            }
        }
        EventEffect::AddStatusAll { status } => {
            let affliction = catalog.status(status).instantiate();
            for member in &mut party.members {
                member.add_status(&affliction);
            }
            let mut consequences = vec![Consequence::new(NOTE_ADD_STATUS_ALL, [status.clone()])];
            consequences.extend(party.remove_dead().into_iter().map(|member| {
                Consequence::new(NOTE_DEATH_FROM_ILLNESS, [member.name, status.clone()])
            }));
            consequences
        }
        EventEffect::RemoveItems {
            item: Some(item),
            amount,
        } => {
            let requested = non_negative_sample(amount, rng);
            let held = party.inventory.item_count(item);
            if held >= requested {
                party.inventory.remove(item, requested);
                vec![Consequence::new(
                    NOTE_REMOVE_ITEM,
                    [requested.to_string(), item.clone()],
                )]
            } else {
                party.inventory.remove(item, held);
                vec![Consequence::new(NOTE_REMOVE_ALL_ITEM, [item.clone()])]
            }
        }
        EventEffect::RemoveItems { item: None, amount } => {
            let requested = non_negative_sample(amount, rng);
            let removed = party.inventory.remove_random_items(requested, rng);
            vec![Consequence::new(
                NOTE_REMOVE_RANDOM_ITEM,
                [removed.to_string()],
            )]
        }
        EventEffect::RemoveMoney { amount } => {
            let requested = crate::numbers::i32_to_f32(amount.sample(rng).max(0));
            let balance = party.money();
            if requested >= balance {
                party.modify_money(-balance);
                vec![Consequence::new(NOTE_REMOVE_ALL_MONEY, [])]
            } else {
                party.modify_money(-requested);
                vec![Consequence::new(
                    NOTE_REMOVE_MONEY,
                    [format!("{requested:.2}")],
                )]
            }
        }
        EventEffect::Kill { cause } => {
            let member = party.members.remove(index);
            log::info!("{} was killed by an event", member.name);
            match cause {
                Some(cause) => vec![Consequence::new(
                    NOTE_DEATH_WITH_CAUSE,
                    [member.name, cause.clone()],
                )],
                None => vec![Consequence::new(NOTE_DEATH_WITHOUT_CAUSE, [member.name])],
            }
        }
        EventEffect::ShowScreen => Vec::new(),
        EventEffect::BreakWagon => {
            if party
                .inventory
                .remove_of_type(ItemType::WagonParts, 1.0, 0.0, rng)
            {
                vec![Consequence::new(NOTE_WAGON_FIXED, [])]
            } else {
                log::info!("wagon broke with no spare parts; the party is lost");
                party.members.clear();
                vec![Consequence::new(NOTE_WAGON_BROKE, [])]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Argument, CompareOp, Literal, Subject};
    use crate::test_support::{fixture_catalog, fixture_party};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn event(effect: EventEffect, constraints: Vec<EventConstraint>) -> EventDef {
        EventDef {
            id: "test".to_string(),
            screen_id: "peril.generic".to_string(),
            chance: 1.0,
            action: EventAction {
                constraints,
                effect,
            },
        }
    }

    #[test]
    fn empty_party_fails_closed() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 1);
        party.members.clear();
        let outcome = event(EventEffect::ShowScreen, Vec::new()).execute(&mut party, &catalog, &mut rng);
        assert!(outcome.is_none());
    }

    #[test]
    fn failing_constraint_blocks_effect() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        let far = EventConstraint::new(
            Subject::Argument(Argument::CurrentMile),
            CompareOp::Greater,
            Literal::Int(100),
        );
        let kill = event(EventEffect::Kill { cause: None }, vec![far]);
        assert!(kill.execute(&mut party, &catalog, &mut rng).is_none());
        assert_eq!(party.members.len(), 2);
        party.modify_mile(150);
        let outcome = kill.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(party.members.len(), 1);
        assert_eq!(outcome.consequences[0].key, NOTE_DEATH_WITHOUT_CAUSE);
    }

    #[test]
    fn show_screen_has_no_consequence() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        let outcome = event(EventEffect::ShowScreen, Vec::new())
            .execute(&mut party, &catalog, &mut rng)
            .unwrap();
        assert_eq!(outcome.screen_id, "peril.generic");
        assert!(outcome.consequences.is_empty());
    }

    #[test]
    fn remove_money_clamps_to_balance() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        party.modify_money(40.0 - party.money());
        let theft = event(
            EventEffect::RemoveMoney {
                amount: IntRange::exact(25),
            },
            Vec::new(),
        );
        let outcome = theft.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_REMOVE_MONEY);
        assert!((party.money() - 15.0).abs() < f32::EPSILON);
        let outcome = theft.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_REMOVE_ALL_MONEY);
        assert!(party.money().abs() < f32::EPSILON);
    }

    #[test]
    fn remove_named_item_takes_what_is_there() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        let held = party.inventory.item_count("medicine");
        let spill = |amount| {
            event(
                EventEffect::RemoveItems {
                    item: Some("medicine".to_string()),
                    amount: IntRange::exact(amount),
                },
                Vec::new(),
            )
        };
        let outcome = spill(1).execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_REMOVE_ITEM);
        assert_eq!(party.inventory.item_count("medicine"), held - 1);
        let outcome = spill(1_000).execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_REMOVE_ALL_ITEM);
        assert_eq!(party.inventory.item_count("medicine"), 0);
    }

    #[test]
    fn remove_random_items_reports_units_taken() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        let before = party.inventory.total_units();
        let outcome = event(
            EventEffect::RemoveItems {
                item: None,
                amount: IntRange::exact(3),
            },
            Vec::new(),
        )
        .execute(&mut party, &catalog, &mut rng)
        .unwrap();
        assert_eq!(party.inventory.total_units(), before - 3);
        assert_eq!(outcome.consequences[0].args, vec!["3".to_string()]);
    }

    #[test]
    fn wagon_parts_avert_a_break() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 3);
        party.inventory.add(catalog.item("axle").stack(1));
        let snap = event(EventEffect::BreakWagon, Vec::new());
        let outcome = snap.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_WAGON_FIXED);
        assert_eq!(party.members.len(), 3);
        let outcome = snap.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences[0].key, NOTE_WAGON_BROKE);
        assert!(party.members.is_empty());
    }

    #[test]
    fn status_for_all_escalates_and_reports_deaths() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 2);
        let plague = event(
            EventEffect::AddStatusAll {
                status: "snakebite".to_string(),
            },
            Vec::new(),
        );
        let outcome = plague.execute(&mut party, &catalog, &mut rng).unwrap();
        assert_eq!(outcome.consequences.len(), 1);
        assert!(party.members.iter().all(|member| member.has_status("snakebite")));
        let outcome = plague.execute(&mut party, &catalog, &mut rng).unwrap();
        assert!(party.members.is_empty());
        assert_eq!(outcome.consequences.len(), 3);
        assert_eq!(outcome.consequences[1].key, NOTE_DEATH_FROM_ILLNESS);
    }

    #[test]
    fn status_for_member_uses_obtained_key() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 1);
        let outcome = event(
            EventEffect::AddStatusMember {
                status: "hunger".to_string(),
            },
            Vec::new(),
        )
        .execute(&mut party, &catalog, &mut rng)
        .unwrap();
        assert_eq!(outcome.consequences[0].key, catalog.status("hunger").obtained_key);
        assert!(party.members[0].has_status("hunger"));
    }

    #[test]
    fn delays_and_setbacks_move_calendar_and_mile() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut party = fixture_party(&catalog, 1);
        let start = party.date;
        event(
            EventEffect::AddDays {
                amount: IntRange::exact(2),
            },
            Vec::new(),
        )
        .execute(&mut party, &catalog, &mut rng)
        .unwrap();
        assert_eq!(party.date.day(), start.day() + 2);
        event(
            EventEffect::RemoveMiles {
                amount: IntRange::exact(12),
            },
            Vec::new(),
        )
        .execute(&mut party, &catalog, &mut rng)
        .unwrap();
        assert_eq!(party.mile(), -12);
    }

    #[test]
    fn zero_chance_events_never_fire() {
        let catalog = fixture_catalog();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            if let Some(event) = select_random_event(&catalog, &mut rng) {
                assert!(event.chance > 0.0);
            }
        }
    }

    #[test]
    fn parses_tagged_effects() {
        let def: EventDef = serde_json::from_str(
            r#"{
                "id": "thief",
                "screen_id": "peril.thief",
                "chance": 0.05,
                "action": {
                    "constraints": [{"argument": "money", "operator": ">", "value": 0}],
                    "effect": {"kind": "remove_money", "amount": {"min": 5, "max": 50}}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(def.action.constraints.len(), 1);
        assert!(matches!(def.action.effect, EventEffect::RemoveMoney { .. }));
    }
}
