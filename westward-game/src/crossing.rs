//! Fording a river at a crossing landmark.
use crate::config::TrailConfig;
use crate::party::{MiniGame, PartyState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingOutcome {
    /// No river crossing is on offer; nothing changed.
    NotOffered,
    Crossed { miles: i32 },
    SweptBack { miles: i32 },
}

/// Resolve a crossing whose skill result came from the operator.
///
/// Success carries the party forward and failure sets it back by the
/// configured distance. Either way the crossing is used up.
pub fn cross_river(party: &mut PartyState, config: &TrailConfig, succeeded: bool) -> CrossingOutcome {
    if party.minigame() != MiniGame::River {
        return CrossingOutcome::NotOffered;
    }
    party.play_minigame();
    let miles = config.river_crossing_miles;
    if succeeded {
        party.modify_mile(miles);
        log::info!("{} crossed the river", party.save_name);
        CrossingOutcome::Crossed { miles }
    } else {
        party.modify_mile(-miles);
        log::info!("{} was swept back {miles} miles", party.save_name);
        CrossingOutcome::SweptBack { miles }
    }
}
