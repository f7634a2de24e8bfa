//! Westward Game Engine
//!
//! Platform-agnostic core of the Westward trail simulation: party bookkeeping,
//! the event rule language and the journey scheduler that advances a party
//! mile by mile. Rendering and operator input live outside this crate; they
//! talk to the scheduler through [`presentation::Presenter`].

pub mod calendar;
pub mod camp;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod crossing;
pub mod events;
pub mod hunt;
pub mod inventory;
pub mod journey;
pub mod loot;
pub mod member;
pub mod numbers;
pub mod party;
pub mod presentation;
pub mod rules;
pub mod sampler;
pub mod save;
pub mod status;
pub mod trade;
pub mod weather;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

// Re-export commonly used types
pub use calendar::{CalendarDate, Month};
pub use camp::TreatmentOutcome;
pub use catalog::{Catalog, CatalogData, CatalogError, ScreenKind};
pub use config::{ConfigError, Difficulty, Pace, TrailConfig};
pub use crossing::CrossingOutcome;
pub use events::{Consequence, EventDef, EventEffect, EventOutcome};
pub use hunt::{Hunt, ShotOutcome};
pub use inventory::{Inventory, ItemStack, ItemType};
pub use journey::{
    Advance, JourneyEnd, JourneyScheduler, JourneySession, JourneyState, RngBundle, Stream,
    SessionError, SessionHost, TickStatus,
};
pub use member::{Gender, Member, Role};
pub use party::{MiniGame, PartyState};
pub use presentation::{HeadlessPresenter, Presenter, ScreenQueue, Wait};
pub use save::{SaveData, SaveDataBuilder, SaveError};
pub use trade::{PurchaseOutcome, TradeResult, TradeSession};

/// Asset names every loader must resolve.
pub const CONFIG_ASSET: &str = "config";
pub const ITEMS_ASSET: &str = "items";
pub const STATUSES_ASSET: &str = "statuses";
pub const ROLES_ASSET: &str = "roles";
pub const LANDMARKS_ASSET: &str = "landmarks";
pub const EVENTS_ASSET: &str = "events";
pub const SCREENS_ASSET: &str = "screens";
pub const HUNTING_ASSET: &str = "hunting";

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load one named JSON asset
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned;

    /// Load every catalog document
    ///
    /// # Errors
    ///
    /// Returns an error if any catalog asset cannot be loaded or parsed.
    fn load_catalog(&self) -> Result<CatalogData, Self::Error> {
        Ok(CatalogData {
            items: self.load_config(ITEMS_ASSET)?,
            statuses: self.load_config(STATUSES_ASSET)?,
            roles: self.load_config(ROLES_ASSET)?,
            landmarks: self.load_config(LANDMARKS_ASSET)?,
            events: self.load_config(EVENTS_ASSET)?,
            screens: self.load_config(SCREENS_ASSET)?,
            hunting_grounds: self.load_config(HUNTING_ASSET)?,
        })
    }
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a save record under its own save name
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, data: &SaveData) -> Result<(), Self::Error>;

    /// Load a save record
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    fn load(&self, save_name: &str) -> Result<Option<SaveData>, Self::Error>;

    /// Delete a save record; deleting a missing record is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    fn delete(&self, save_name: &str) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no bundled asset named `{0}`")]
    Unknown(String),
    #[error("asset `{name}` is malformed")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a named JSON document, tagging failures with the asset name.
///
/// # Errors
///
/// Returns [`AssetError::Malformed`] when the JSON does not match `T`.
pub fn parse_asset<T: DeserializeOwned>(name: &str, json: &str) -> Result<T, AssetError> {
    serde_json::from_str(json).map_err(|source| AssetError::Malformed {
        name: name.to_string(),
        source,
    })
}

/// Loader over the catalogs compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLoader;

impl StaticLoader {
    /// Raw text of a bundled asset.
    #[must_use]
    pub fn bundled(name: &str) -> Option<&'static str> {
        let json = match name {
            CONFIG_ASSET => include_str!("../assets/data/config.json"),
            ITEMS_ASSET => include_str!("../assets/data/items.json"),
            STATUSES_ASSET => include_str!("../assets/data/statuses.json"),
            ROLES_ASSET => include_str!("../assets/data/roles.json"),
            LANDMARKS_ASSET => include_str!("../assets/data/landmarks.json"),
            EVENTS_ASSET => include_str!("../assets/data/events.json"),
            SCREENS_ASSET => include_str!("../assets/data/screens.json"),
            HUNTING_ASSET => include_str!("../assets/data/hunting.json"),
            _ => return None,
        };
        Some(json)
    }
}

impl DataLoader for StaticLoader {
    type Error = AssetError;

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let json =
            Self::bundled(config_name).ok_or_else(|| AssetError::Unknown(config_name.to_string()))?;
        parse_asset(config_name, json)
    }
}

/// Validated catalogs and configuration shared by every session.
#[derive(Debug, Clone)]
pub struct GameAssets {
    pub catalog: Arc<Catalog>,
    pub config: Arc<TrailConfig>,
}

impl GameAssets {
    #[must_use]
    pub fn new(catalog: Catalog, config: TrailConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }

    /// Assets compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled document fails to parse or validate.
    pub fn bundled() -> anyhow::Result<Self> {
        load_assets(&StaticLoader)
    }
}

/// Load, build and validate catalogs and configuration from `loader`.
///
/// # Errors
///
/// Returns an error if any document cannot be loaded, a catalog fails
/// validation, or the configuration is out of range.
pub fn load_assets<L: DataLoader>(loader: &L) -> anyhow::Result<GameAssets> {
    let data = loader.load_catalog().context("loading catalog documents")?;
    let catalog = Catalog::from_data(data).context("validating catalogs")?;
    let config: TrailConfig = loader
        .load_config(CONFIG_ASSET)
        .context("loading trail configuration")?;
    config.validate().context("validating trail configuration")?;
    if let Some(beyond) = catalog
        .landmarks()
        .all()
        .iter()
        .find(|landmark| landmark.mile > config.total_miles)
    {
        log::warn!(
            "landmark {} at mile {} lies past the trail end ({})",
            beyond.name,
            beyond.mile,
            config.total_miles
        );
    }
    Ok(GameAssets::new(catalog, config))
}
