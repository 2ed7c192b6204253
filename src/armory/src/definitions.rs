//! Definition records
//!
//! Typed views of the manifest's definition tables. Only the fields the
//! catalog uses are modelled; everything else in the payload is ignored.
//! Missing optional blocks decode to their defaults so a sparse record is
//! never a decode failure.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::manifest::TableName;

/// Numeric identifier of a definition (the manifest's `hash`).
///
/// Not stable across manifest versions.
pub type DefHash = u32;

/// A record type stored in one definition table
pub trait Definition: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    /// Table this record type is decoded from
    const TABLE: TableName;

    fn display(&self) -> &DisplayProperties;

    fn display_name(&self) -> &str {
        &self.display().name
    }
}

macro_rules! definition {
    ($ty:ty, $table:expr) => {
        impl Definition for $ty {
            const TABLE: TableName = $table;

            fn display(&self) -> &DisplayProperties {
                &self.display_properties
            }
        }
    };
}

// ============================================================================
// Shared blocks
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayProperties {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub has_icon: bool,
}

// ============================================================================
// Inventory items
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItemDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub flavor_text: String,
    pub item_type_display_name: String,
    pub inventory: Option<ItemInventoryBlock>,
    pub stats: Option<ItemStatBlock>,
    pub damage_type_hashes: Vec<DefHash>,
    pub item_category_hashes: Vec<DefHash>,
    pub season_hash: Option<DefHash>,
    pub sockets: Option<ItemSocketBlock>,
    pub redacted: bool,
}

impl InventoryItemDefinition {
    /// Slot category (bucket) this item is equipped into
    pub fn bucket_hash(&self) -> Option<DefHash> {
        self.inventory.as_ref().map(|i| i.bucket_type_hash)
    }

    /// Value stored under `stat` in the item's own stat block
    pub fn stat_value(&self, stat: DefHash) -> Option<i32> {
        self.stats
            .as_ref()
            .and_then(|block| block.stats.get(&stat))
            .map(|s| s.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemInventoryBlock {
    pub bucket_type_hash: DefHash,
    pub tier_type_hash: DefHash,
    pub tier_type_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStatBlock {
    /// stat hash -> value, keyed the same way the payload is
    pub stats: IndexMap<DefHash, ItemStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemStat {
    pub stat_hash: DefHash,
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemSocketBlock {
    pub socket_entries: Vec<SocketEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketEntry {
    pub socket_type_hash: DefHash,
    pub single_initial_item_hash: DefHash,
    pub reusable_plug_set_hash: Option<DefHash>,
    pub randomized_plug_set_hash: Option<DefHash>,
}

definition!(InventoryItemDefinition, TableName::InventoryItem);

// ============================================================================
// Enrichment tables
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryBucketDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub category: i32,
    pub bucket_order: i32,
}

definition!(InventoryBucketDefinition, TableName::InventoryBucket);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemTierTypeDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
}

definition!(ItemTierTypeDefinition, TableName::ItemTierType);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub stat_category: i32,
}

definition!(StatDefinition, TableName::Stat);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DamageTypeDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub enum_value: i32,
}

definition!(DamageTypeDefinition, TableName::DamageType);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemCategoryDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub short_title: String,
}

definition!(ItemCategoryDefinition, TableName::ItemCategory);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugSetDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub reusable_plug_items: Vec<PlugSetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugSetEntry {
    pub plug_item_hash: DefHash,
    pub currently_can_roll: bool,
}

definition!(PlugSetDefinition, TableName::PlugSet);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketTypeDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
    pub socket_category_hash: DefHash,
}

definition!(SocketTypeDefinition, TableName::SocketType);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketCategoryDefinition {
    pub hash: DefHash,
    pub display_properties: DisplayProperties,
}

definition!(SocketCategoryDefinition, TableName::SocketCategory);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_weapon_item() {
        let item: InventoryItemDefinition = serde_json::from_value(json!({
            "hash": 1363886209,
            "index": 4012,
            "displayProperties": {
                "name": "Gjallarhorn",
                "description": "",
                "icon": "/common/destiny2_content/icons/gjally.jpg",
                "hasIcon": true
            },
            "flavorText": "\"If there is beauty in destruction, why not also in its delivery?\"",
            "itemTypeDisplayName": "Rocket Launcher",
            "inventory": {
                "bucketTypeHash": 953998645,
                "tierTypeHash": 2759499571u32,
                "tierTypeName": "Exotic"
            },
            "stats": {
                "stats": {
                    "4284893193": { "statHash": 4284893193u32, "value": 15, "minimum": 0, "maximum": 0 }
                }
            },
            "damageTypeHashes": [1847026933],
            "itemCategoryHashes": [1, 4, 13],
            "seasonHash": 2809059425u32
        }))
        .unwrap();

        assert_eq!(item.display_name(), "Gjallarhorn");
        assert_eq!(item.bucket_hash(), Some(953998645));
        assert_eq!(item.stat_value(4284893193), Some(15));
        assert_eq!(item.stat_value(1), None);
        assert_eq!(item.season_hash, Some(2809059425));
        assert!(item.sockets.is_none());
    }

    #[test]
    fn test_sparse_item_decodes() {
        let item: InventoryItemDefinition =
            serde_json::from_value(json!({ "hash": 7, "redacted": true })).unwrap();

        assert_eq!(item.display_name(), "");
        assert_eq!(item.bucket_hash(), None);
        assert!(item.damage_type_hashes.is_empty());
    }

    #[test]
    fn test_table_binding() {
        assert_eq!(StatDefinition::TABLE, TableName::Stat);
        assert_eq!(InventoryBucketDefinition::TABLE, TableName::InventoryBucket);
        assert_eq!(SocketCategoryDefinition::TABLE, TableName::SocketCategory);
    }
}
