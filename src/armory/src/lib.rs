//! # armory
//!
//! Destiny 2 manifest resolution engine.
//!
//! This library provides functionality to:
//! - Fetch the versioned content manifest from Bungie.net
//! - Load and decode definition tables (items, buckets, stats, ...)
//! - Resolve display names to the version-scoped identifiers the tables use
//! - Filter inventory items down to the three weapon slots
//! - Compose denormalized weapon records with named stat values
//!
//! ## Example
//!
//! ```no_run
//! use armory::{BungieClient, ClientConfig, ResolverConfig};
//!
//! # async fn run() -> Result<(), armory::CatalogError> {
//! let client = BungieClient::new(ClientConfig::new("my-api-key"));
//! let catalog = armory::resolve_weapon_catalog(&client, &ResolverConfig::default()).await?;
//!
//! for weapon in catalog.weapons.values() {
//!     println!("{} ({})", weapon.name, weapon.slot);
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod client;
pub mod compose;
pub mod definitions;
pub mod error;
pub mod filter;
pub mod manifest;
pub mod names;
pub mod tables;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used items
#[doc(inline)]
pub use catalog::{
    build_catalog, resolve, resolve_weapon_catalog, Enrichment, Resolution, ResolverConfig,
    WeaponCatalog,
};
#[doc(inline)]
pub use client::{BungieClient, ClientConfig, ContentClient, DEFAULT_BASE_URL};
#[doc(inline)]
pub use compose::{compose_stats, Composer, SocketSummary, StatEntry, WeaponRecord, WEAPON_STATS};
#[doc(inline)]
pub use definitions::{DefHash, Definition};
#[doc(inline)]
pub use error::{CatalogError, CatalogResult, RemoteError};
#[doc(inline)]
pub use filter::{filter_weapons, resolve_weapon_buckets, BucketNames, WeaponBuckets, WeaponSlot};
#[doc(inline)]
pub use manifest::{fetch_manifest, Manifest, TableName};
#[doc(inline)]
pub use names::{resolve_by_name, NameIndex};
#[doc(inline)]
pub use tables::{load_table_set, load_tables, DefinitionTable, LoadedTables, TableSet, TableSlice};
