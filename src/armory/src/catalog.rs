//! Weapon catalog resolution
//!
//! One run: fetch the manifest, load the configured tables, resolve the
//! weapon buckets and stat vocabulary by name, filter and compose. Nothing
//! is kept between runs, so concurrent runs never share state.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::client::ContentClient;
use crate::compose::{Composer, WeaponRecord, WEAPON_STATS};
use crate::definitions::DefHash;
use crate::error::{CatalogError, CatalogResult};
use crate::filter::{filter_weapons, resolve_weapon_buckets, BucketNames, WeaponSlot};
use crate::manifest::{fetch_manifest, Manifest};
use crate::names::NameIndex;
use crate::tables::{load_table_set, LoadedTables, TableSet};

// ============================================================================
// Configuration
// ============================================================================

/// Which tables a run loads beyond the mandatory ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enrichment {
    /// Items, buckets and stats only
    Core,
    /// Also tiers, damage types, item categories and sockets
    #[default]
    Full,
}

impl Enrichment {
    pub fn table_set(self) -> TableSet {
        match self {
            Self::Core => TableSet::core(),
            Self::Full => TableSet::full(),
        }
    }
}

/// Settings for a resolution run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub locale: String,
    /// Upper bound for each remote call, in seconds
    pub fetch_timeout_secs: u64,
    pub enrichment: Enrichment,
    pub buckets: BucketNames,
    /// Stat names attached to each record, in output order
    pub stats: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            fetch_timeout_secs: 30,
            enrichment: Enrichment::Full,
            buckets: BucketNames::default(),
            stats: WEAPON_STATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ResolverConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Weapons of one manifest version, keyed by item identifier in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponCatalog {
    pub version: String,
    pub weapons: IndexMap<DefHash, WeaponRecord>,
}

impl WeaponCatalog {
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn get(&self, hash: DefHash) -> Option<&WeaponRecord> {
        self.weapons.get(&hash)
    }

    pub fn by_slot(&self, slot: WeaponSlot) -> impl Iterator<Item = &WeaponRecord> {
        self.weapons.values().filter(move |w| w.slot == slot)
    }

    /// Subset of the catalog in one slot, keeping order
    pub fn slot_catalog(&self, slot: WeaponSlot) -> WeaponCatalog {
        WeaponCatalog {
            version: self.version.clone(),
            weapons: self
                .weapons
                .iter()
                .filter(|(_, w)| w.slot == slot)
                .map(|(hash, w)| (*hash, w.clone()))
                .collect(),
        }
    }
}

/// Everything a run produced, for callers that also dump intermediates
#[derive(Debug, Clone)]
pub struct Resolution {
    pub manifest: Manifest,
    pub tables: LoadedTables,
    pub catalog: WeaponCatalog,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Build the weapon catalog from already-loaded tables.
///
/// Bucket names must all resolve. A stat name missing from the stat table
/// aborts the whole build with `StatResolutionFailed`, naming the first
/// weapon in table order.
pub fn build_catalog(tables: &LoadedTables, config: &ResolverConfig) -> CatalogResult<WeaponCatalog> {
    let buckets = resolve_weapon_buckets(&tables.buckets, &config.buckets)?;
    if buckets.version() != tables.items.version() {
        return Err(CatalogError::VersionMismatch {
            index: buckets.version().to_string(),
            table: tables.items.version().to_string(),
        });
    }

    let stat_index = NameIndex::for_names(&tables.stats, &config.stats);
    let composer = Composer::new(tables, &stat_index, &config.stats)?;

    let mut weapons = IndexMap::new();
    for (hash, item) in filter_weapons(&tables.items, &buckets) {
        let Some(slot) = item.bucket_hash().and_then(|b| buckets.slot_of(b)) else {
            continue;
        };
        weapons.insert(hash, composer.compose(item, slot)?);
    }

    Ok(WeaponCatalog {
        version: tables.version().to_string(),
        weapons,
    })
}

/// Run the full pipeline, keeping the intermediate manifest and tables
pub async fn resolve<C: ContentClient>(
    client: &C,
    config: &ResolverConfig,
) -> CatalogResult<Resolution> {
    let started = Instant::now();
    let timeout = config.fetch_timeout();

    let manifest = fetch_manifest(client, timeout).await?;
    let tables = load_table_set(
        client,
        &manifest,
        &config.enrichment.table_set(),
        &config.locale,
        timeout,
    )
    .await?;

    tracing::debug!(
        version = %manifest.version,
        items = tables.items.len(),
        buckets = tables.buckets.len(),
        stats = tables.stats.len(),
        "tables loaded"
    );

    let catalog = build_catalog(&tables, config)?;

    tracing::info!(
        version = %catalog.version,
        weapons = catalog.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "resolved weapon catalog"
    );

    Ok(Resolution {
        manifest,
        tables,
        catalog,
    })
}

/// Run the full pipeline and return only the catalog
pub async fn resolve_weapon_catalog<C: ContentClient>(
    client: &C,
    config: &ResolverConfig,
) -> CatalogResult<WeaponCatalog> {
    resolve(client, config).await.map(|r| r.catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::TableName;
    use crate::mock::{ManifestFixture, SAMPLE_POWER_BUCKET};
    use serde_json::{json, Value};

    fn config() -> ResolverConfig {
        ResolverConfig::default()
    }

    #[tokio::test]
    async fn test_resolve_sample_catalog() {
        let client = ManifestFixture::sample("v1").into_client();

        let catalog = resolve_weapon_catalog(&client, &config()).await.unwrap();

        assert_eq!(catalog.version, "v1");
        let order: Vec<DefHash> = catalog.weapons.keys().copied().collect();
        assert_eq!(order, vec![3325744914, 2591746970, 1363886209, 2188764214]);
        assert!(catalog.get(1399243961).is_none(), "helmet is not a weapon");

        let gjally = catalog.get(1363886209).unwrap();
        assert_eq!(gjally.slot, WeaponSlot::Power);
        assert_eq!(gjally.bucket_hash, SAMPLE_POWER_BUCKET);
        assert_eq!(gjally.tier_name.as_deref(), Some("Legendary"));
        assert_eq!(catalog.by_slot(WeaponSlot::Power).count(), 2);
        assert_eq!(catalog.slot_catalog(WeaponSlot::Energy).len(), 1);
    }

    #[tokio::test]
    async fn test_one_weapon_per_bucket_plus_non_weapon() {
        let client = ManifestFixture::sample("v1")
            .replace(
                TableName::InventoryItem,
                Some(json!({
                    "1": { "hash": 1, "inventory": { "bucketTypeHash": 1498876634 } },
                    "2": { "hash": 2, "inventory": { "bucketTypeHash": 2465295065u32 } },
                    "3": { "hash": 3, "inventory": { "bucketTypeHash": 953998645 } },
                    "4": { "hash": 4, "inventory": { "bucketTypeHash": 3448274439u32 } }
                })),
            )
            .into_client();

        let catalog = resolve_weapon_catalog(&client, &config()).await.unwrap();
        let kept: Vec<DefHash> = catalog.weapons.keys().copied().collect();
        assert_eq!(kept, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_catalog_follows_wire_order() {
        // Keys are in neither numeric nor lexical order
        let items: Value = serde_json::from_str(
            r#"{
                "900": { "hash": 900, "inventory": { "bucketTypeHash": 1498876634 } },
                "20": { "hash": 20, "inventory": { "bucketTypeHash": 2465295065 } },
                "5": { "hash": 5, "inventory": { "bucketTypeHash": 3448274439 } },
                "3000": { "hash": 3000, "inventory": { "bucketTypeHash": 953998645 } },
                "100": { "hash": 100, "inventory": { "bucketTypeHash": 1498876634 } }
            }"#,
        )
        .unwrap();
        let client = ManifestFixture::sample("v1")
            .replace(TableName::InventoryItem, Some(items))
            .into_client();

        let catalog = resolve_weapon_catalog(&client, &config()).await.unwrap();
        let order: Vec<DefHash> = catalog.weapons.keys().copied().collect();
        assert_eq!(order, vec![900, 20, 3000, 100]);
    }

    #[tokio::test]
    async fn test_duplicate_bucket_name_first_in_wire_order_wins() {
        let buckets: Value = serde_json::from_str(
            r#"{
                "900": { "hash": 900, "displayProperties": { "name": "Kinetic Weapons" } },
                "12": { "hash": 12, "displayProperties": { "name": "Kinetic Weapons" } },
                "2465295065": { "hash": 2465295065, "displayProperties": { "name": "Energy Weapons" } },
                "953998645": { "hash": 953998645, "displayProperties": { "name": "Power Weapons" } }
            }"#,
        )
        .unwrap();
        let items: Value = serde_json::from_str(
            r#"{
                "1": { "hash": 1, "inventory": { "bucketTypeHash": 12 } },
                "2": { "hash": 2, "inventory": { "bucketTypeHash": 900 } }
            }"#,
        )
        .unwrap();
        let client = ManifestFixture::sample("v1")
            .replace(TableName::InventoryBucket, Some(buckets))
            .replace(TableName::InventoryItem, Some(items))
            .into_client();

        let catalog = resolve_weapon_catalog(&client, &config()).await.unwrap();
        let kept: Vec<DefHash> = catalog.weapons.keys().copied().collect();
        assert_eq!(kept, vec![2]);
        assert_eq!(catalog.get(2).unwrap().bucket_hash, 900);
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let client = ManifestFixture::sample("v1").into_client();

        let first = resolve_weapon_catalog(&client, &config()).await.unwrap();
        let second = resolve_weapon_catalog(&client, &config()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_nothing() {
        let client = ManifestFixture::sample("v1").into_client();
        let config = config();

        let (a, b) = tokio::join!(
            resolve_weapon_catalog(&client, &config),
            resolve_weapon_catalog(&client, &config)
        );
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_missing_kinetic_bucket_aborts() {
        let client = ManifestFixture::sample("v1")
            .replace(
                TableName::InventoryBucket,
                Some(ManifestFixture::sample_buckets_without(&["Kinetic Weapons"])),
            )
            .into_client();

        let err = resolve_weapon_catalog(&client, &config()).await.unwrap_err();
        assert_eq!(
            err,
            CatalogError::NameNotFound {
                table: TableName::InventoryBucket,
                name: "Kinetic Weapons".into()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_bucket_table_aborts() {
        let client = ManifestFixture::sample("v1")
            .replace(TableName::InventoryBucket, None)
            .into_client();

        let err = resolve_weapon_catalog(&client, &config()).await.unwrap_err();
        assert_eq!(err, CatalogError::UnknownTable(TableName::InventoryBucket));
    }

    #[tokio::test]
    async fn test_missing_zoom_stat_fails_whole_run() {
        let client = ManifestFixture::sample("v1")
            .replace(
                TableName::Stat,
                Some(ManifestFixture::sample_stats_without(&["Zoom"])),
            )
            .into_client();

        let expected = CatalogError::StatResolutionFailed {
            item: 3325744914,
            stat: "Zoom".into(),
        };
        for _ in 0..3 {
            let err = resolve_weapon_catalog(&client, &config()).await.unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[tokio::test]
    async fn test_stat_values_match_item_stat_block() {
        let client = ManifestFixture::sample("v1").into_client();
        let resolution = resolve(&client, &config()).await.unwrap();

        for (hash, record) in &resolution.catalog.weapons {
            let item = resolution.tables.items.get(*hash).unwrap();
            assert_eq!(record.stats.len(), 11);
            for entry in &record.stats {
                assert_eq!(entry.value, item.stat_value(entry.hash));
            }
        }

        let inaugural = resolution.catalog.get(3325744914).unwrap();
        assert_eq!(inaugural.stat("Rounds Per Minute").unwrap().value, Some(600));
        assert_eq!(inaugural.stat("Stability").unwrap().value, None);
    }

    #[tokio::test]
    async fn test_core_enrichment_skips_optional_tables() {
        let fixture = ManifestFixture::sample("v1");
        let tier_path = fixture.table_path(TableName::ItemTierType);
        let client = fixture.into_client();
        let config = ResolverConfig {
            enrichment: Enrichment::Core,
            ..config()
        };

        let resolution = resolve(&client, &config).await.unwrap();
        assert_eq!(client.hits(&tier_path), 0);
        assert!(resolution.tables.tiers.is_none());
        // Falls back to the tier name carried on the item
        let record = resolution.catalog.get(1363886209).unwrap();
        assert_eq!(record.tier_name.as_deref(), Some("Legendary"));
    }

    #[tokio::test]
    async fn test_custom_stat_list() {
        let client = ManifestFixture::sample("v1").into_client();
        let config = ResolverConfig {
            stats: vec!["Recoil".into(), "Impact".into()],
            ..config()
        };

        let catalog = resolve_weapon_catalog(&client, &config).await.unwrap();
        let names: Vec<&str> = catalog.get(2188764214).unwrap().stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Recoil", "Impact"]);
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: ResolverConfig =
            serde_json::from_value(json!({ "locale": "de", "enrichment": "core" })).unwrap();

        assert_eq!(config.locale, "de");
        assert_eq!(config.enrichment, Enrichment::Core);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.stats.len(), 11);
        assert_eq!(config.buckets.kinetic, "Kinetic Weapons");
    }
}
