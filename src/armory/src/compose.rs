//! Weapon record composition
//!
//! Turns a raw item definition into a denormalized weapon record: identity
//! fields, a fixed ordered list of named stats, and whatever enrichment the
//! optional tables of the run allow.

use serde::{Deserialize, Serialize};

use crate::definitions::{DefHash, Definition, InventoryItemDefinition, StatDefinition};
use crate::error::{CatalogError, CatalogResult};
use crate::filter::WeaponSlot;
use crate::names::NameIndex;
use crate::tables::{DefinitionTable, LoadedTables};

/// Stats attached to every weapon record, in output order
pub const WEAPON_STATS: [&str; 11] = [
    "Impact",
    "Range",
    "Stability",
    "Handling",
    "Reload Speed",
    "Rounds Per Minute",
    "Magazine",
    "Aim Assistance",
    "Inventory Size",
    "Zoom",
    "Recoil",
];

// ============================================================================
// Output records
// ============================================================================

/// A named, described stat value of a weapon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub hash: DefHash,
    pub name: String,
    pub description: String,
    /// Value from the item's own stat block; `None` when the item has no
    /// value for this stat
    pub value: Option<i32>,
}

/// One socket of a weapon with the plugs that can roll in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketSummary {
    pub socket_type_hash: DefHash,
    pub category: Option<String>,
    pub plugs: Vec<String>,
}

/// Denormalized catalog entry for one weapon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRecord {
    pub hash: DefHash,
    pub name: String,
    pub description: String,
    pub flavor_text: String,
    pub icon: Option<String>,
    pub item_type_display_name: String,
    pub season_hash: Option<DefHash>,
    pub slot: WeaponSlot,
    pub bucket_hash: DefHash,
    pub tier_hash: DefHash,
    pub tier_name: Option<String>,
    pub damage_type_hashes: Vec<DefHash>,
    pub damage_types: Vec<String>,
    pub item_category_hashes: Vec<DefHash>,
    pub item_categories: Vec<String>,
    pub stats: Vec<StatEntry>,
    pub sockets: Vec<SocketSummary>,
}

impl WeaponRecord {
    pub fn stat(&self, name: &str) -> Option<&StatEntry> {
        self.stats.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Resolve `stat_names` for `item`, in the given order.
///
/// A name the stat index cannot resolve fails with `StatResolutionFailed`.
/// Values are copied from the item's stat block unchanged.
pub fn compose_stats<S: AsRef<str>>(
    item: &InventoryItemDefinition,
    stats: &DefinitionTable<StatDefinition>,
    stat_index: &NameIndex,
    stat_names: &[S],
) -> CatalogResult<Vec<StatEntry>> {
    stat_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let unresolved = || CatalogError::StatResolutionFailed {
                item: item.hash,
                stat: name.to_string(),
            };

            let hash = stat_index.get(name).map_err(|_| unresolved())?;
            let def = stats.get(hash).ok_or_else(unresolved)?;

            Ok(StatEntry {
                hash,
                name: def.display_properties.name.clone(),
                description: def.display_properties.description.clone(),
                value: item.stat_value(hash),
            })
        })
        .collect()
}

// ============================================================================
// Composer
// ============================================================================

/// Builds weapon records against the tables of a single run
pub struct Composer<'a> {
    tables: &'a LoadedTables,
    stat_index: &'a NameIndex,
    stat_names: &'a [String],
}

impl<'a> Composer<'a> {
    /// Fails with `VersionMismatch` if the stat index was built from
    /// another manifest version than the tables
    pub fn new(
        tables: &'a LoadedTables,
        stat_index: &'a NameIndex,
        stat_names: &'a [String],
    ) -> CatalogResult<Self> {
        stat_index.check_version(tables.stats.version())?;
        Ok(Self {
            tables,
            stat_index,
            stat_names,
        })
    }

    pub fn compose(
        &self,
        item: &InventoryItemDefinition,
        slot: WeaponSlot,
    ) -> CatalogResult<WeaponRecord> {
        let stats = compose_stats(item, &self.tables.stats, self.stat_index, self.stat_names)?;
        let inventory = item.inventory.clone().unwrap_or_default();

        Ok(WeaponRecord {
            hash: item.hash,
            name: item.display_properties.name.clone(),
            description: item.display_properties.description.clone(),
            flavor_text: item.flavor_text.clone(),
            icon: item.display_properties.icon.clone(),
            item_type_display_name: item.item_type_display_name.clone(),
            season_hash: item.season_hash,
            slot,
            bucket_hash: inventory.bucket_type_hash,
            tier_hash: inventory.tier_type_hash,
            tier_name: self.tier_name(item),
            damage_type_hashes: item.damage_type_hashes.clone(),
            damage_types: names_of(self.tables.damage_types.as_ref(), &item.damage_type_hashes),
            item_category_hashes: item.item_category_hashes.clone(),
            item_categories: names_of(
                self.tables.item_categories.as_ref(),
                &item.item_category_hashes,
            ),
            stats,
            sockets: self.sockets(item),
        })
    }

    fn tier_name(&self, item: &InventoryItemDefinition) -> Option<String> {
        let inventory = item.inventory.as_ref()?;
        self.tables
            .tiers
            .as_ref()
            .and_then(|tiers| tiers.name_of(inventory.tier_type_hash))
            .filter(|name| !name.is_empty())
            .or(Some(inventory.tier_type_name.as_str()).filter(|name| !name.is_empty()))
            .map(String::from)
    }

    /// Socket summaries; empty unless the socket type table was loaded
    fn sockets(&self, item: &InventoryItemDefinition) -> Vec<SocketSummary> {
        let (Some(socket_types), Some(block)) = (&self.tables.socket_types, &item.sockets) else {
            return Vec::new();
        };

        block
            .socket_entries
            .iter()
            .filter(|entry| entry.socket_type_hash != 0)
            .map(|entry| {
                let category = socket_types
                    .get(entry.socket_type_hash)
                    .and_then(|st| {
                        self.tables
                            .socket_categories
                            .as_ref()?
                            .name_of(st.socket_category_hash)
                    })
                    .map(String::from);

                SocketSummary {
                    socket_type_hash: entry.socket_type_hash,
                    category,
                    plugs: self.plug_names(entry),
                }
            })
            .collect()
    }

    fn plug_names(&self, entry: &crate::definitions::SocketEntry) -> Vec<String> {
        let plug_set = entry
            .reusable_plug_set_hash
            .or(entry.randomized_plug_set_hash)
            .and_then(|hash| self.tables.plug_sets.as_ref()?.get(hash));

        let hashes: Vec<DefHash> = match plug_set {
            Some(set) => set
                .reusable_plug_items
                .iter()
                .map(|p| p.plug_item_hash)
                .collect(),
            None if entry.single_initial_item_hash != 0 => vec![entry.single_initial_item_hash],
            None => Vec::new(),
        };

        let mut names = names_of(Some(&self.tables.items), &hashes);
        names.dedup();
        names
    }
}

/// Non-empty display names of `hashes` found in `table`, in input order
fn names_of<D: Definition>(table: Option<&DefinitionTable<D>>, hashes: &[DefHash]) -> Vec<String> {
    let Some(table) = table else {
        return Vec::new();
    };
    hashes
        .iter()
        .filter_map(|&hash| table.name_of(hash))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
