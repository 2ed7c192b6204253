//! Display name -> identifier resolution
//!
//! The manifest exposes no stable identifiers for concepts like "the kinetic
//! weapon slot" or "the Impact stat", so every run re-derives them from
//! display names. Matching is exact; if several records share a name the
//! first one in table order wins.

use std::collections::HashMap;

use crate::definitions::{DefHash, Definition};
use crate::error::{CatalogError, CatalogResult};
use crate::manifest::TableName;
use crate::tables::DefinitionTable;

/// Find the identifier of the first record in `table` named `name`
pub fn resolve_by_name<D: Definition>(
    table: &DefinitionTable<D>,
    name: &str,
) -> CatalogResult<DefHash> {
    table
        .iter()
        .find(|(_, def)| def.display_name() == name)
        .map(|(hash, _)| hash)
        .ok_or_else(|| CatalogError::NameNotFound {
            table: D::TABLE,
            name: name.to_string(),
        })
}

/// Resolved identifiers for a fixed vocabulary of names in one table.
///
/// Only the queried names are indexed. Built from a single pass over the
/// table and valid only for the manifest version it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIndex {
    table: TableName,
    version: String,
    resolved: HashMap<String, DefHash>,
    missing: Vec<String>,
}

impl NameIndex {
    pub fn for_names<D, S>(table: &DefinitionTable<D>, names: &[S]) -> Self
    where
        D: Definition,
        S: AsRef<str>,
    {
        let mut resolved: HashMap<String, DefHash> = HashMap::with_capacity(names.len());
        let wanted = |name: &str| names.iter().any(|n| n.as_ref() == name);

        for (hash, def) in table.iter() {
            if resolved.len() == names.len() {
                break;
            }
            let name = def.display_name();
            if wanted(name) && !resolved.contains_key(name) {
                resolved.insert(name.to_string(), hash);
            }
        }

        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !resolved.contains_key(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }

        if !missing.is_empty() {
            tracing::debug!(table = %D::TABLE, ?missing, "names not present in table");
        }

        Self {
            table: D::TABLE,
            version: table.version().to_string(),
            resolved,
            missing,
        }
    }

    /// Identifier for `name`; `NameNotFound` if it was queried but absent
    /// or never queried at all
    pub fn get(&self, name: &str) -> CatalogResult<DefHash> {
        self.resolved
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::NameNotFound {
                table: self.table,
                name: name.to_string(),
            })
    }

    /// Queried names with no matching record, in query order
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Refuse to apply this index to data from another manifest version
    pub fn check_version(&self, version: &str) -> CatalogResult<()> {
        if self.version == version {
            Ok(())
        } else {
            Err(CatalogError::VersionMismatch {
                index: self.version.clone(),
                table: version.to_string(),
            })
        }
    }
}
