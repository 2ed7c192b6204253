//! Debug dumps
//!
//! Writes the tables and catalog of a resolution run to a directory, one
//! file per table plus one per weapon slot. Nothing reads these back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use armory::{TableName, WeaponCatalog, WeaponSlot};
use serde::Serialize;
use serde_json::Value;

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Write every table and the catalog into `dir`, returning the files written
pub fn write_resolution(
    dir: &Path,
    tables: &[(TableName, Value)],
    catalog: &WeaponCatalog,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create debug directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(tables.len() + 4);

    for (table, value) in tables {
        let path = dir.join(format!("{table}.json"));
        write_json(&path, value)?;
        written.push(path);
    }

    let path = dir.join("weapons.json");
    write_json(&path, catalog)?;
    written.push(path);

    for slot in WeaponSlot::ALL {
        let path = dir.join(format!("weapons-{slot}.json"));
        write_json(&path, &catalog.slot_catalog(slot))?;
        written.push(path);
    }

    Ok(written)
}
