//! Weapon slot classification
//!
//! Weapons are the inventory items equipped into one of three buckets. The
//! bucket identifiers are resolved by name first; filtering itself never
//! looks at names.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definitions::{DefHash, InventoryBucketDefinition, InventoryItemDefinition};
use crate::error::CatalogResult;
use crate::names::NameIndex;
use crate::tables::DefinitionTable;

/// Equipment slot of a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponSlot {
    Kinetic,
    Energy,
    Power,
}

impl WeaponSlot {
    pub const ALL: [WeaponSlot; 3] = [WeaponSlot::Kinetic, WeaponSlot::Energy, WeaponSlot::Power];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kinetic => "kinetic",
            Self::Energy => "energy",
            Self::Power => "power",
        }
    }
}

impl fmt::Display for WeaponSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display names of the three weapon buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketNames {
    pub kinetic: String,
    pub energy: String,
    pub power: String,
}

impl Default for BucketNames {
    fn default() -> Self {
        Self {
            kinetic: "Kinetic Weapons".to_string(),
            energy: "Energy Weapons".to_string(),
            power: "Power Weapons".to_string(),
        }
    }
}

impl BucketNames {
    pub fn name(&self, slot: WeaponSlot) -> &str {
        match slot {
            WeaponSlot::Kinetic => &self.kinetic,
            WeaponSlot::Energy => &self.energy,
            WeaponSlot::Power => &self.power,
        }
    }
}

/// Bucket identifiers of the three weapon slots for one manifest version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeaponBuckets {
    pub kinetic: DefHash,
    pub energy: DefHash,
    pub power: DefHash,
    version: String,
}

impl WeaponBuckets {
    pub fn new(kinetic: DefHash, energy: DefHash, power: DefHash, version: impl Into<String>) -> Self {
        Self {
            kinetic,
            energy,
            power,
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn hash(&self, slot: WeaponSlot) -> DefHash {
        match slot {
            WeaponSlot::Kinetic => self.kinetic,
            WeaponSlot::Energy => self.energy,
            WeaponSlot::Power => self.power,
        }
    }

    /// Slot whose bucket is `bucket`, if any
    pub fn slot_of(&self, bucket: DefHash) -> Option<WeaponSlot> {
        WeaponSlot::ALL.into_iter().find(|&slot| self.hash(slot) == bucket)
    }
}

/// Resolve the three weapon buckets by display name.
///
/// A missing name aborts with `NameNotFound`.
pub fn resolve_weapon_buckets(
    buckets: &DefinitionTable<InventoryBucketDefinition>,
    names: &BucketNames,
) -> CatalogResult<WeaponBuckets> {
    let index = NameIndex::for_names(buckets, &[&names.kinetic, &names.energy, &names.power]);

    let resolved = WeaponBuckets::new(
        index.get(&names.kinetic)?,
        index.get(&names.energy)?,
        index.get(&names.power)?,
        index.version(),
    );

    tracing::debug!(
        kinetic = resolved.kinetic,
        energy = resolved.energy,
        power = resolved.power,
        "resolved weapon buckets"
    );
    Ok(resolved)
}

/// Items equipped into one of the weapon buckets, in source table order
pub fn filter_weapons<'a>(
    items: &'a DefinitionTable<InventoryItemDefinition>,
    buckets: &WeaponBuckets,
) -> IndexMap<DefHash, &'a InventoryItemDefinition> {
    items
        .iter()
        .filter(|(_, item)| {
            item.bucket_hash()
                .is_some_and(|bucket| buckets.slot_of(bucket).is_some())
        })
        .collect()
}
