//! Shared fixtures for unit tests.
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::calendar::{CalendarDate, Month};
use crate::catalog::{Catalog, CatalogData};
use crate::config::{Difficulty, TrailConfig};
use crate::inventory::Inventory;
use crate::member::{Gender, Member};
use crate::party::PartyState;
use crate::save::SaveData;
use crate::{GameAssets, GameStorage};

const FIXTURE_NAMES: [(&str, Gender); 4] = [
    ("Ada B.", Gender::Female),
    ("Abe C.", Gender::Male),
    ("Eli D.", Gender::Male),
    ("Ruth E.", Gender::Female),
];

/// Small but complete catalog: three landmarks at miles 0, 100 and 300, the
/// second with a river and a shop.
pub fn fixture_catalog() -> Catalog {
    let data: CatalogData = serde_json::from_value(fixture_catalog_json()).unwrap();
    Catalog::from_data(data).unwrap()
}

/// The raw document behind [`fixture_catalog`], for tests that break it.
pub fn fixture_catalog_json() -> serde_json::Value {
    json!({
        "items": [
            {"id": "jerky", "type": "food", "barter_value": 1.0},
            {"id": "bullets", "type": "ammo", "barter_value": 0.1},
            {"id": "medicine", "type": "medicine", "barter_value": 15.0},
            {"id": "axle", "type": "wagonParts", "barter_value": 20.0},
            {"id": "clothes", "type": "clothes", "barter_value": 5.0}
        ],
        "statuses": [
            {"id": "hunger", "max_level": 5, "obtained_key": "notification.hunger"},
            {"id": "snakebite", "max_level": 2, "base_chance": 0.3},
            {"id": "cholera", "max_level": 4, "healable": true, "base_chance": 0.2}
        ],
        "roles": [
            {"id": "farmer"},
            {"id": "doctor", "bonus_points": 50, "can_heal": true}
        ],
        "landmarks": [
            {"name": "Independence", "screen_id": "landmark.independence", "mile": 0},
            {
                "name": "Fort Kearny",
                "screen_id": "landmark.kearny",
                "shop_screen_id": "shop.fort",
                "mile": 100,
                "has_river": true
            },
            {"name": "Chimney Rock", "screen_id": "landmark.chimney", "mile": 300}
        ],
        "events": [
            {
                "id": "dust",
                "screen_id": "peril.generic",
                "chance": 0.05,
                "action": {"effect": {"kind": "show_screen"}}
            },
            {
                "id": "never",
                "screen_id": "peril.generic",
                "chance": 0.0,
                "action": {"effect": {"kind": "break_wagon"}}
            }
        ],
        "screens": [
            {"id": "intro", "kind": "builtin"},
            {"id": "travel", "kind": "builtin"},
            {"id": "consequence", "kind": "builtin"},
            {"id": "victory", "kind": "builtin"},
            {"id": "loss", "kind": "builtin"},
            {"id": "peril.generic", "kind": "peril", "image": "dust.png", "text_key": "peril.dust"},
            {"id": "landmark.independence", "kind": "landmark", "image": "town.png", "text_key": "landmark.independence"},
            {"id": "landmark.kearny", "kind": "landmark", "image": "fort.png", "text_key": "landmark.kearny"},
            {"id": "landmark.chimney", "kind": "landmark", "image": "rock.png", "text_key": "landmark.chimney"},
            {
                "id": "shop.fort",
                "kind": "shop",
                "listings": [
                    {"item_id": "axle", "item_type": "wagonParts", "price": 10.0},
                    {"item_id": "jerky", "item_type": "food", "price": 0.5}
                ]
            },
            {
                "id": "trading.post",
                "kind": "trading",
                "image": "trader.png",
                "text_key": "trading.greeting",
                "goods": [{"id": "clothes", "chance": 1.0, "barter_value": 5.0}]
            }
        ],
        "hunting_grounds": [
            {
                "id": "prairie",
                "animals": [{
                    "id": "rabbit",
                    "health": 1,
                    "score": 5,
                    "max_count": 2,
                    "drop": {"entries": [
                        {"target": "item", "id": "jerky", "count": {"min": 2, "max": 2}, "always_drop": true}
                    ]}
                }]
            }
        ]
    })
}

/// Save at the trail head on April 1 with `members` healthy farmers.
pub fn fixture_save(members: usize, money: f32) -> SaveData {
    let catalog = fixture_catalog();
    let farmer = catalog.roles().find("farmer").unwrap().clone();
    let members = FIXTURE_NAMES
        .iter()
        .cycle()
        .take(members)
        .map(|(name, gender)| Member::new(*name, farmer.clone(), *gender))
        .collect();
    let inventory = Inventory::from_stacks([
        catalog.item("jerky").stack(20),
        catalog.item("bullets").stack(10),
        catalog.item("medicine").stack(3),
    ]);
    SaveData {
        save_name: "fixture".to_string(),
        members,
        inventory,
        money,
        mile: 0,
        difficulty: Difficulty::Easy,
        date: CalendarDate::new(Month::Apr, 1),
        next_landmark_index: 0,
        can_sleep: false,
        date_saved: String::new(),
    }
}

pub fn fixture_party(catalog: &Catalog, members: usize) -> PartyState {
    PartyState::from_save(
        fixture_save(members, 100.0),
        catalog,
        TrailConfig::default().total_miles,
    )
}

/// Fixture catalog with a short, unpaced trail.
pub fn fixture_assets() -> GameAssets {
    GameAssets::new(
        fixture_catalog(),
        TrailConfig {
            total_miles: 500,
            mile_delay_ms: 0,
            ..TrailConfig::default()
        },
    )
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    saves: Arc<Mutex<HashMap<String, SaveData>>>,
}

impl MemoryStorage {
    fn saves(&self) -> MutexGuard<'_, HashMap<String, SaveData>> {
        self.saves.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStorage for MemoryStorage {
    type Error = Infallible;

    fn save(&self, data: &SaveData) -> Result<(), Self::Error> {
        self.saves().insert(data.save_name.clone(), data.clone());
        Ok(())
    }

    fn load(&self, save_name: &str) -> Result<Option<SaveData>, Self::Error> {
        Ok(self.saves().get(save_name).cloned())
    }

    fn delete(&self, save_name: &str) -> Result<(), Self::Error> {
        self.saves().remove(save_name);
        Ok(())
    }
}
