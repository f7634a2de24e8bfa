//! Making camp: a night's rest and a healer's treatment.
use rand::Rng;
use rand::seq::SliceRandom;

use crate::constants::UNTREATED_HEALTH_SWING;
use crate::inventory::ItemType;
use crate::numbers::round_f32_to_i32;
use crate::party::PartyState;

/// Result of one treatment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreatmentOutcome {
    NoHealer,
    NoMedicine,
    /// Patient is at full health with nothing healable; no medicine used.
    NothingToTreat,
    HealthRestored { amount: i32 },
    HealthLost { amount: i32 },
    AfflictionEased { status: String },
    AfflictionWorsened { status: String },
    /// The failed treatment killed the patient, who has left the party.
    Died { name: String },
}

/// Rest for the night. Returns `false` when the party cannot sleep yet.
pub fn rest<R: Rng + ?Sized>(party: &mut PartyState, rng: &mut R) -> bool {
    let rested = party.sleep(rng);
    if rested {
        log::debug!("{} rested until {}", party.save_name, party.date);
    }
    rested
}

/// Have the party's healer treat the member at `patient`.
///
/// Success odds come from the difficulty. With no healable affliction the
/// patient gains or loses a fifth of max health; otherwise a random healable
/// affliction eases (detaching at level 1) or worsens, possibly fatally.
/// Every attempt spends one unit of medicine.
///
/// # Panics
///
/// Panics if `patient` is out of bounds.
pub fn treat_member<R: Rng + ?Sized>(
    party: &mut PartyState,
    patient: usize,
    rng: &mut R,
) -> TreatmentOutcome {
    if !party.has_healers() {
        return TreatmentOutcome::NoHealer;
    }
    if party.inventory.count_of_type(ItemType::Medicine) == 0 {
        return TreatmentOutcome::NoMedicine;
    }
    let heal_chance = party.difficulty().heal_chance();
    let member = &mut party.members[patient];
    if !member.is_hurt() && !member.has_healable_status() {
        return TreatmentOutcome::NothingToTreat;
    }
    let success = rng.r#gen::<f32>() < heal_chance;
    let healable: Vec<String> = member
        .statuses()
        .iter()
        .filter(|status| status.healable())
        .map(|status| status.id().to_string())
        .collect();
    let outcome = if let Some(status) = healable.choose(rng).cloned() {
        let Some(held) = member.status_mut(&status) else {
            return TreatmentOutcome::NothingToTreat;
        };
        if success {
            if !held.decrease_level() {
                member.remove_status(&status);
            }
            TreatmentOutcome::AfflictionEased { status }
        } else if held.increase_level() {
            member.modify_health(-member.health());
            TreatmentOutcome::Died {
                name: member.name.clone(),
            }
        } else {
            TreatmentOutcome::AfflictionWorsened { status }
        }
    } else {
        let amount = round_f32_to_i32(
            (crate::numbers::i32_to_f32(member.max_health()) * UNTREATED_HEALTH_SWING).trunc(),
        );
        if success {
            member.modify_health(amount);
            TreatmentOutcome::HealthRestored { amount }
        } else if member.modify_health(-amount) {
            TreatmentOutcome::Died {
                name: member.name.clone(),
            }
        } else {
            TreatmentOutcome::HealthLost { amount }
        }
    };
    party.inventory.remove_of_type(ItemType::Medicine, 1.0, 0.0, rng);
    party.remove_dead();
    log::debug!("treatment in {}: {outcome:?}", party.save_name);
    outcome
}
