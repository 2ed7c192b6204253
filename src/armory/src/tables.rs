//! Definition table loading
//!
//! Tables are fetched concurrently from the paths the manifest lists and
//! decoded into insertion-ordered identifier -> record maps. Every table
//! carries the manifest version it came from.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::try_join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::client::{get_with_timeout, ContentClient};
use crate::definitions::*;
use crate::error::{CatalogError, CatalogResult};
use crate::manifest::{Manifest, TableName};

// ============================================================================
// Definition table
// ============================================================================

/// Identifier -> record map for one definition table
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionTable<D> {
    version: String,
    entries: IndexMap<DefHash, D>,
}

impl<D: Serialize> Serialize for DefinitionTable<D> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<D: Definition> DefinitionTable<D> {
    pub fn new(version: impl Into<String>, entries: IndexMap<DefHash, D>) -> Self {
        Self {
            version: version.into(),
            entries,
        }
    }

    /// Decode a raw table payload (a JSON object keyed by decimal identifiers)
    pub fn decode(version: impl Into<String>, raw: Value) -> CatalogResult<Self> {
        let entries: IndexMap<DefHash, D> =
            serde_json::from_value(raw).map_err(|e| CatalogError::TableDecodeFailed {
                table: D::TABLE,
                reason: e.to_string(),
            })?;
        Ok(Self::new(version, entries))
    }

    pub fn table_name(&self) -> TableName {
        D::TABLE
    }

    /// Manifest version the identifiers belong to
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, hash: DefHash) -> Option<&D> {
        self.entries.get(&hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefHash, &D)> {
        self.entries.iter().map(|(hash, def)| (*hash, def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display name of `hash`, if the table has it
    pub fn name_of(&self, hash: DefHash) -> Option<&str> {
        self.get(hash).map(|d| d.display_name())
    }
}

// ============================================================================
// Table slice
// ============================================================================

/// Raw payloads of a set of tables from one manifest version
#[derive(Debug, Clone, Default)]
pub struct TableSlice {
    version: String,
    tables: BTreeMap<TableName, Value>,
}

impl TableSlice {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn contains(&self, table: TableName) -> bool {
        self.tables.contains_key(&table)
    }

    pub fn table_names(&self) -> impl Iterator<Item = TableName> + '_ {
        self.tables.keys().copied()
    }

    /// Decode the payload of `D::TABLE`.
    ///
    /// A table that was never loaded is `UnknownTable`.
    pub fn decode<D: Definition>(&self) -> CatalogResult<DefinitionTable<D>> {
        let raw = self
            .tables
            .get(&D::TABLE)
            .ok_or(CatalogError::UnknownTable(D::TABLE))?;
        DefinitionTable::decode(self.version.clone(), raw.clone())
    }

    /// Decode and remove the payload of `D::TABLE`
    fn take<D: Definition>(&mut self) -> CatalogResult<DefinitionTable<D>> {
        let raw = self
            .tables
            .remove(&D::TABLE)
            .ok_or(CatalogError::UnknownTable(D::TABLE))?;
        DefinitionTable::decode(self.version.clone(), raw)
    }
}

async fn fetch_table<C: ContentClient>(
    client: &C,
    manifest: &Manifest,
    table: TableName,
    locale: &str,
    timeout: Duration,
) -> CatalogResult<(TableName, Value)> {
    let path = manifest.table_path(locale, table)?;
    let started = std::time::Instant::now();

    let raw = get_with_timeout(client, path, timeout)
        .await
        .map_err(|e| CatalogError::from_table_fetch(table, e))?;

    if !raw.is_object() {
        return Err(CatalogError::TableDecodeFailed {
            table,
            reason: "payload is not an object".into(),
        });
    }

    tracing::debug!(
        %table,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "fetched table"
    );
    Ok((table, raw))
}

/// Fetch every table in `names` for `locale`.
///
/// All fetches run concurrently and the first failure aborts the rest.
pub async fn load_tables<C: ContentClient>(
    client: &C,
    manifest: &Manifest,
    names: &[TableName],
    locale: &str,
    timeout: Duration,
) -> CatalogResult<TableSlice> {
    let fetches = names
        .iter()
        .map(|&table| fetch_table(client, manifest, table, locale, timeout));
    let tables = try_join_all(fetches).await?;

    Ok(TableSlice {
        version: manifest.version.clone(),
        tables: tables.into_iter().collect(),
    })
}

// ============================================================================
// Table sets
// ============================================================================

/// Tables to load for one run, split by whether the run can proceed without them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSet {
    pub required: Vec<TableName>,
    pub optional: Vec<TableName>,
}

impl TableSet {
    /// Items, buckets and stats: the minimum a catalog can be built from
    pub fn core() -> Self {
        Self {
            required: vec![
                TableName::InventoryItem,
                TableName::InventoryBucket,
                TableName::Stat,
            ],
            optional: Vec::new(),
        }
    }

    /// Core tables plus every enrichment table
    pub fn full() -> Self {
        let mut set = Self::core();
        set.optional = TableName::ALL
            .into_iter()
            .filter(|t| !set.required.contains(t))
            .collect();
        set
    }
}

/// Load a table set.
///
/// Required tables abort the run on any failure. Optional tables that are
/// missing, unreachable or undecodable are logged and left out.
pub async fn load_table_set<C: ContentClient>(
    client: &C,
    manifest: &Manifest,
    set: &TableSet,
    locale: &str,
    timeout: Duration,
) -> CatalogResult<LoadedTables> {
    let required = load_tables(client, manifest, &set.required, locale, timeout);
    let optional = try_join_all(set.optional.iter().map(|&table| async move {
        match fetch_table(client, manifest, table, locale, timeout).await {
            Ok(loaded) => Ok::<_, CatalogError>(Some(loaded)),
            Err(e) => {
                tracing::warn!(%table, error = %e, "optional table unavailable");
                Ok(None)
            }
        }
    }));

    let (mut slice, optional) = futures::try_join!(required, optional)?;
    slice.tables.extend(optional.into_iter().flatten());

    LoadedTables::from_slice(slice)
}

// ============================================================================
// Loaded tables
// ============================================================================

/// Typed tables of one resolution run
#[derive(Debug, Clone)]
pub struct LoadedTables {
    pub items: DefinitionTable<InventoryItemDefinition>,
    pub buckets: DefinitionTable<InventoryBucketDefinition>,
    pub stats: DefinitionTable<StatDefinition>,
    pub tiers: Option<DefinitionTable<ItemTierTypeDefinition>>,
    pub damage_types: Option<DefinitionTable<DamageTypeDefinition>>,
    pub item_categories: Option<DefinitionTable<ItemCategoryDefinition>>,
    pub plug_sets: Option<DefinitionTable<PlugSetDefinition>>,
    pub socket_types: Option<DefinitionTable<SocketTypeDefinition>>,
    pub socket_categories: Option<DefinitionTable<SocketCategoryDefinition>>,
}

impl LoadedTables {
    /// Decode a slice; items, buckets and stats must be present
    pub fn from_slice(mut slice: TableSlice) -> CatalogResult<Self> {
        let items = slice.take::<InventoryItemDefinition>()?;
        let buckets = slice.take::<InventoryBucketDefinition>()?;
        let stats = slice.take::<StatDefinition>()?;

        Ok(Self {
            items,
            buckets,
            stats,
            tiers: take_optional(&mut slice),
            damage_types: take_optional(&mut slice),
            item_categories: take_optional(&mut slice),
            plug_sets: take_optional(&mut slice),
            socket_types: take_optional(&mut slice),
            socket_categories: take_optional(&mut slice),
        })
    }

    pub fn version(&self) -> &str {
        self.items.version()
    }

    /// Every loaded table as plain JSON, for debug dumps.
    ///
    /// A table that fails to serialize is logged and left out.
    pub fn dump(&self) -> Vec<(TableName, Value)> {
        let mut out: Vec<(TableName, Value)> = [
            dump_table(&self.items),
            dump_table(&self.buckets),
            dump_table(&self.stats),
        ]
        .into_iter()
        .flatten()
        .collect();
        out.extend(self.tiers.as_ref().and_then(dump_table));
        out.extend(self.damage_types.as_ref().and_then(dump_table));
        out.extend(self.item_categories.as_ref().and_then(dump_table));
        out.extend(self.plug_sets.as_ref().and_then(dump_table));
        out.extend(self.socket_types.as_ref().and_then(dump_table));
        out.extend(self.socket_categories.as_ref().and_then(dump_table));
        out
    }
}

fn take_optional<D: Definition>(slice: &mut TableSlice) -> Option<DefinitionTable<D>> {
    if !slice.contains(D::TABLE) {
        return None;
    }
    match slice.take() {
        Ok(table) => Some(table),
        Err(e) => {
            tracing::warn!(table = %D::TABLE, error = %e, "dropping undecodable optional table");
            None
        }
    }
}

fn dump_table<D: Definition>(table: &DefinitionTable<D>) -> Option<(TableName, Value)> {
    match serde_json::to_value(table) {
        Ok(value) => Some((D::TABLE, value)),
        Err(e) => {
            tracing::warn!(table = %D::TABLE, error = %e, "skipping table in dump");
            None
        }
    }
}
