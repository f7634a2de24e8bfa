//! Immutable, load-once catalogs keyed by stable string ids.
//!
//! A [`Catalog`] is validated once when built: mandatory catalogs must be
//! non-empty, ids must be unique, the trail must start at a mile-0 landmark,
//! and every cross-reference (event screens, landmark screens, loot targets,
//! status ids named by effects) must resolve.
//! Lookups during play therefore treat a miss as a broken contract and panic.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::constants::{DEFAULT_STATUS_OBTAINED_KEY, HUNGER_STATUS_ID, REQUIRED_SCREENS};
use crate::events::EventDef;
use crate::hunt::HuntingGround;
use crate::inventory::{ItemStack, ItemType};
use crate::member::Role;
use crate::status::StatusEffect;
use crate::trade::{ShopListing, TradeGood};

/// Identifier-bearing catalog entry.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Reference from one catalog entry to another, checked at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRef<'a> {
    Item(&'a str),
    Status(&'a str),
    Screen(&'a str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    #[serde(default)]
    pub barter_value: f32,
    #[serde(default)]
    pub status_applied: Option<String>,
}

impl ItemDef {
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ItemType, barter_value: f32) -> Self {
        Self {
            id: id.into(),
            kind,
            barter_value,
            status_applied: None,
        }
    }

    /// A stack of `count` units carrying this item's catalog attributes.
    #[must_use]
    pub fn stack(&self, count: u32) -> ItemStack {
        ItemStack {
            id: self.id.clone(),
            count,
            kind: self.kind,
            barter_value: self.barter_value,
            status_applied: self.status_applied.clone(),
        }
    }
}

fn default_obtained_key() -> String {
    DEFAULT_STATUS_OBTAINED_KEY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDef {
    pub id: String,
    pub max_level: u8,
    #[serde(default)]
    pub healable: bool,
    #[serde(default)]
    pub base_chance: f32,
    #[serde(default = "default_obtained_key")]
    pub obtained_key: String,
}

impl StatusDef {
    /// A level-1 instance of this status.
    #[must_use]
    pub fn instantiate(&self) -> StatusEffect {
        StatusEffect::new(
            self.id.clone(),
            self.max_level,
            self.healable,
            self.base_chance,
        )
        .with_obtained_key(self.obtained_key.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub screen_id: String,
    #[serde(default)]
    pub shop_screen_id: Option<String>,
    #[serde(default)]
    pub sprite: String,
    pub mile: i32,
    #[serde(default)]
    pub has_river: bool,
}

impl Landmark {
    #[must_use]
    pub const fn has_shop(&self) -> bool {
        self.shop_screen_id.is_some()
    }
}

/// What a screen id renders as; built-in screens carry no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenKind {
    Builtin,
    Peril {
        image: String,
        text_key: String,
    },
    Landmark {
        image: String,
        text_key: String,
        #[serde(default)]
        learn_more_url: Option<String>,
    },
    Shop {
        listings: Vec<ShopListing>,
    },
    Trading {
        image: String,
        text_key: String,
        goods: Vec<TradeGood>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDef {
    pub id: String,
    #[serde(flatten)]
    pub kind: ScreenKind,
}

impl Keyed for ItemDef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for StatusDef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Role {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Landmark {
    fn key(&self) -> &str {
        &self.name
    }
}

impl Keyed for EventDef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for ScreenDef {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for HuntingGround {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Ordered entries with an id index.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Registry<T> {
    fn build(kind: &'static str, entries: Vec<T>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.key().to_string(), position).is_some() {
                return Err(CatalogError::DuplicateId {
                    kind,
                    id: entry.key().to_string(),
                });
            }
        }
        Ok(Self { entries, index })
    }

    #[must_use]
    pub fn all(&self) -> &[T] {
        &self.entries
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|position| &self.entries[*position])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw catalog documents as loaded from assets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub statuses: Vec<StatusDef>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub landmarks: Vec<Landmark>,
    #[serde(default)]
    pub events: Vec<EventDef>,
    #[serde(default)]
    pub screens: Vec<ScreenDef>,
    #[serde(default)]
    pub hunting_grounds: Vec<HuntingGround>,
}

/// Validated catalogs shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Registry<ItemDef>,
    statuses: Registry<StatusDef>,
    roles: Registry<Role>,
    landmarks: Registry<Landmark>,
    events: Registry<EventDef>,
    screens: Registry<ScreenDef>,
    hunting_grounds: Registry<HuntingGround>,
}

impl Catalog {
    /// Build and validate catalogs from loaded documents.
    ///
    /// Landmarks are sorted by ascending mile; the first one is the origin.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when a mandatory catalog is empty, an id is
    /// duplicated, no landmark sits at mile 0, or a cross-reference does not
    /// resolve.
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let CatalogData {
            items,
            statuses,
            roles,
            mut landmarks,
            events,
            screens,
            hunting_grounds,
        } = data;
        for (kind, empty) in [
            ("items", items.is_empty()),
            ("events", events.is_empty()),
            ("landmarks", landmarks.is_empty()),
            ("roles", roles.is_empty()),
        ] {
            if empty {
                return Err(CatalogError::EmptyCatalog { kind });
            }
        }
        landmarks.sort_by_key(|landmark| landmark.mile);
        if let Some(first) = landmarks.first()
            && first.mile != 0
        {
            return Err(CatalogError::NoOrigin {
                name: first.name.clone(),
                mile: first.mile,
            });
        }

        let catalog = Self {
            items: Registry::build("item", items)?,
            statuses: Registry::build("status", statuses)?,
            roles: Registry::build("role", roles)?,
            landmarks: Registry::build("landmark", landmarks)?,
            events: Registry::build("event", events)?,
            screens: Registry::build("screen", screens)?,
            hunting_grounds: Registry::build("hunting ground", hunting_grounds)?,
        };
        catalog.check_references()?;
        log::debug!(
            "catalog ready: {} items, {} statuses, {} landmarks, {} events",
            catalog.items.len(),
            catalog.statuses.len(),
            catalog.landmarks.len(),
            catalog.events.len()
        );
        Ok(catalog)
    }

    /// Parse a combined catalog document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the catalogs fail validation.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let data: CatalogData = serde_json::from_str(json)?;
        Ok(Self::from_data(data)?)
    }

    fn check_references(&self) -> Result<(), CatalogError> {
        for screen in REQUIRED_SCREENS {
            self.require(CatalogRef::Screen(screen), "built-in screens")?;
        }
        self.require(CatalogRef::Status(HUNGER_STATUS_ID), "starvation rules")?;
        for item in self.items.all() {
            if let Some(status) = &item.status_applied {
                self.require(CatalogRef::Status(status), &item.id)?;
            }
        }
        for landmark in self.landmarks.all() {
            self.require(CatalogRef::Screen(&landmark.screen_id), &landmark.name)?;
            if let Some(shop) = &landmark.shop_screen_id {
                self.require(CatalogRef::Screen(shop), &landmark.name)?;
            }
        }
        for event in self.events.all() {
            for reference in event.references() {
                self.require(reference, &event.id)?;
            }
        }
        for screen in self.screens.all() {
            match &screen.kind {
                ScreenKind::Shop { listings } => {
                    for listing in listings {
                        self.require(CatalogRef::Item(&listing.item_id), &screen.id)?;
                    }
                }
                ScreenKind::Trading { goods, .. } => {
                    for good in goods {
                        self.require(CatalogRef::Item(&good.id), &screen.id)?;
                    }
                }
                ScreenKind::Builtin | ScreenKind::Peril { .. } | ScreenKind::Landmark { .. } => {}
            }
        }
        for ground in self.hunting_grounds.all() {
            for quarry in &ground.animals {
                for reference in quarry.drop.references() {
                    self.require(reference, &ground.id)?;
                }
            }
        }
        Ok(())
    }

    fn require(&self, reference: CatalogRef<'_>, referenced_by: &str) -> Result<(), CatalogError> {
        let (kind, id, present) = match reference {
            CatalogRef::Item(id) => ("item", id, self.items.contains(id)),
            CatalogRef::Status(id) => ("status", id, self.statuses.contains(id)),
            CatalogRef::Screen(id) => ("screen", id, self.screens.contains(id)),
        };
        if present {
            Ok(())
        } else {
            Err(CatalogError::MissingReference {
                kind,
                id: id.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    #[must_use]
    pub const fn items(&self) -> &Registry<ItemDef> {
        &self.items
    }

    #[must_use]
    pub const fn statuses(&self) -> &Registry<StatusDef> {
        &self.statuses
    }

    #[must_use]
    pub const fn roles(&self) -> &Registry<Role> {
        &self.roles
    }

    /// Landmarks in ascending mile order.
    #[must_use]
    pub const fn landmarks(&self) -> &Registry<Landmark> {
        &self.landmarks
    }

    #[must_use]
    pub const fn events(&self) -> &Registry<EventDef> {
        &self.events
    }

    #[must_use]
    pub const fn screens(&self) -> &Registry<ScreenDef> {
        &self.screens
    }

    #[must_use]
    pub const fn hunting_grounds(&self) -> &Registry<HuntingGround> {
        &self.hunting_grounds
    }

    /// # Panics
    ///
    /// Panics if `id` is not in the item catalog.
    #[must_use]
    pub fn item(&self, id: &str) -> &ItemDef {
        self.items
            .find(id)
            .unwrap_or_else(|| panic!("unknown item id `{id}`"))
    }

    /// # Panics
    ///
    /// Panics if `id` is not in the status catalog.
    #[must_use]
    pub fn status(&self, id: &str) -> &StatusDef {
        self.statuses
            .find(id)
            .unwrap_or_else(|| panic!("unknown status id `{id}`"))
    }

    /// # Panics
    ///
    /// Panics if `id` is not in the screen catalog.
    #[must_use]
    pub fn screen(&self, id: &str) -> &ScreenDef {
        self.screens
            .find(id)
            .unwrap_or_else(|| panic!("unknown screen id `{id}`"))
    }

    /// Landmark at `index` in mile order, if any.
    #[must_use]
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.all().get(index)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{kind} catalog is empty")]
    EmptyCatalog { kind: &'static str },
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("the trail must start at mile 0, but the first landmark `{name}` is at mile {mile}")]
    NoOrigin { name: String, mile: i32 },
    #[error("{kind} `{id}` referenced by `{referenced_by}` does not exist")]
    MissingReference {
        kind: &'static str,
        id: String,
        referenced_by: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_catalog_json;
    use serde_json::{Value, json};

    fn build(document: Value) -> Result<Catalog, CatalogError> {
        Catalog::from_data(serde_json::from_value(document).unwrap())
    }

    fn missing(kind: &'static str, id: &str, referenced_by: &str) -> CatalogError {
        CatalogError::MissingReference {
            kind,
            id: id.to_string(),
            referenced_by: referenced_by.to_string(),
        }
    }

    #[test]
    fn fixture_document_is_valid() {
        let catalog = build(fixture_catalog_json()).unwrap();
        assert_eq!(catalog.items().len(), 5);
        assert_eq!(catalog.item("medicine").kind, ItemType::Medicine);
        assert!(catalog.items().find("gold").is_none());
        assert_eq!(catalog.landmark(1).map(|landmark| landmark.mile), Some(100));
        assert!(catalog.landmark(3).is_none());
    }

    #[test]
    fn mandatory_catalogs_must_not_be_empty() {
        for kind in ["items", "events", "landmarks", "roles"] {
            let mut document = fixture_catalog_json();
            document[kind] = json!([]);
            assert_eq!(build(document).unwrap_err(), CatalogError::EmptyCatalog { kind });
        }
        let mut document = fixture_catalog_json();
        document["hunting_grounds"] = json!([]);
        assert!(build(document).unwrap().hunting_grounds().is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut document = fixture_catalog_json();
        document["items"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "axle", "type": "wagonParts", "barter_value": 1.0}));
        assert_eq!(
            build(document).unwrap_err(),
            CatalogError::DuplicateId {
                kind: "item",
                id: "axle".to_string()
            }
        );

        let mut document = fixture_catalog_json();
        document["statuses"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "cholera", "max_level": 1}));
        assert!(matches!(
            build(document).unwrap_err(),
            CatalogError::DuplicateId { kind: "status", .. }
        ));
    }

    #[test]
    fn landmarks_are_sorted_by_mile() {
        let mut document = fixture_catalog_json();
        document["landmarks"].as_array_mut().unwrap().reverse();
        let catalog = build(document).unwrap();
        let miles: Vec<i32> = catalog.landmarks().all().iter().map(|landmark| landmark.mile).collect();
        assert_eq!(miles, vec![0, 100, 300]);
        assert_eq!(catalog.landmarks().find("Chimney Rock").unwrap().mile, 300);
    }

    #[test]
    fn trail_must_start_at_mile_zero() {
        let mut document = fixture_catalog_json();
        document["landmarks"][0]["mile"] = json!(20);
        assert_eq!(
            build(document).unwrap_err(),
            CatalogError::NoOrigin {
                name: "Independence".to_string(),
                mile: 20
            }
        );
    }

    #[test]
    fn dangling_item_references_are_rejected() {
        let mut document = fixture_catalog_json();
        document["screens"][9]["listings"][0]["item_id"] = json!("wheel");
        assert_eq!(build(document).unwrap_err(), missing("item", "wheel", "shop.fort"));

        let mut document = fixture_catalog_json();
        document["screens"][10]["goods"][0]["id"] = json!("furs");
        assert_eq!(build(document).unwrap_err(), missing("item", "furs", "trading.post"));
    }

    #[test]
    fn dangling_status_references_are_rejected() {
        let mut document = fixture_catalog_json();
        document["items"][2]["status_applied"] = json!("plague");
        assert_eq!(build(document).unwrap_err(), missing("status", "plague", "medicine"));

        let mut document = fixture_catalog_json();
        document["statuses"].as_array_mut().unwrap().remove(0);
        assert_eq!(
            build(document).unwrap_err(),
            missing("status", HUNGER_STATUS_ID, "starvation rules")
        );
    }

    #[test]
    fn dangling_event_references_are_rejected() {
        let mut document = fixture_catalog_json();
        document["events"][0]["screen_id"] = json!("peril.flood");
        assert_eq!(build(document).unwrap_err(), missing("screen", "peril.flood", "dust"));

        let mut document = fixture_catalog_json();
        document["events"][1]["action"]["effect"] = json!({"kind": "add_status_all", "status": "plague"});
        assert_eq!(build(document).unwrap_err(), missing("status", "plague", "never"));
    }

    #[test]
    fn dangling_screen_references_are_rejected() {
        let mut document = fixture_catalog_json();
        document["landmarks"][1]["shop_screen_id"] = json!("shop.missing");
        assert_eq!(
            build(document).unwrap_err(),
            missing("screen", "shop.missing", "Fort Kearny")
        );

        let mut document = fixture_catalog_json();
        document["screens"].as_array_mut().unwrap().remove(3);
        assert_eq!(
            build(document).unwrap_err(),
            missing("screen", "victory", "built-in screens")
        );
    }

    #[test]
    fn loot_targets_must_resolve() {
        let mut document = fixture_catalog_json();
        document["hunting_grounds"][0]["animals"][0]["drop"]["entries"][0]["id"] = json!("pelt");
        assert_eq!(build(document).unwrap_err(), missing("item", "pelt", "prairie"));
    }
}
