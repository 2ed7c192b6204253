//! In-memory content client
//!
//! Serves canned JSON documents by path for tests. Paths not registered
//! answer with HTTP 404. `ManifestFixture` lays out a manifest and its
//! table payloads the way the live service does.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::client::ContentClient;
use crate::error::RemoteError;
use crate::manifest::{TableName, MANIFEST_PATH};

#[derive(Debug, Clone)]
enum Canned {
    Json(Value),
    Fail(RemoteError),
    Hang,
}

/// A content client backed by a path -> document map
#[derive(Debug, Default)]
pub struct StaticClient {
    routes: HashMap<String, Canned>,
    hits: Mutex<HashMap<String, usize>>,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `path`
    pub fn with(mut self, path: impl Into<String>, body: Value) -> Self {
        self.routes.insert(path.into(), Canned::Json(body));
        self
    }

    /// Fail every request to `path` with `err`
    pub fn failing(mut self, path: impl Into<String>, err: RemoteError) -> Self {
        self.routes.insert(path.into(), Canned::Fail(err));
        self
    }

    /// Never answer requests to `path`
    pub fn hanging(mut self, path: impl Into<String>) -> Self {
        self.routes.insert(path.into(), Canned::Hang);
        self
    }

    /// Number of requests made for `path` so far
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .map(|hits| hits.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl ContentClient for StaticClient {
    async fn get_json(&self, path: &str) -> Result<Value, RemoteError> {
        if let Ok(mut hits) = self.hits.lock() {
            *hits.entry(path.to_string()).or_default() += 1;
        }

        match self.routes.get(path).cloned() {
            Some(Canned::Json(body)) => Ok(body),
            Some(Canned::Fail(err)) => Err(err),
            Some(Canned::Hang) => futures::future::pending().await,
            None => Err(RemoteError::Status {
                code: 404,
                message: "Not Found".into(),
            }),
        }
    }
}

/// Builds a [`StaticClient`] serving a manifest and its tables
#[derive(Debug, Clone)]
pub struct ManifestFixture {
    version: String,
    locale: String,
    tables: Vec<(TableName, Value)>,
}

impl ManifestFixture {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            locale: "en".to_string(),
            tables: Vec::new(),
        }
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Serve `body` as the payload of `table`
    pub fn table(mut self, table: TableName, body: Value) -> Self {
        self.tables.push((table, body));
        self
    }

    /// Path the manifest lists for `table`
    pub fn table_path(&self, table: TableName) -> String {
        format!(
            "/common/destiny2_content/json/{}/{}-{}.json",
            self.locale, table, self.version
        )
    }

    /// Manifest response envelope listing every registered table
    pub fn manifest_body(&self) -> Value {
        let paths: serde_json::Map<String, Value> = self
            .tables
            .iter()
            .map(|(table, _)| (table.to_string(), Value::String(self.table_path(*table))))
            .collect();
        let mut locales = serde_json::Map::new();
        locales.insert(self.locale.clone(), Value::Object(paths));

        json!({
            "Response": {
                "version": self.version,
                "jsonWorldComponentContentPaths": locales
            },
            "ErrorCode": 1,
            "ThrottleSeconds": 0,
            "ErrorStatus": "Success",
            "Message": "Ok",
            "MessageData": {}
        })
    }

    pub fn into_client(self) -> StaticClient {
        let client = StaticClient::new().with(MANIFEST_PATH, self.manifest_body());
        self.tables.iter().fold(client, |client, (table, body)| {
            client.with(self.table_path(*table), body.clone())
        })
    }
}

/// Stat hashes used by [`ManifestFixture::sample`], in display order
pub const SAMPLE_STATS: [(u32, &str); 11] = [
    (4043523819, "Impact"),
    (1240592695, "Range"),
    (155624089, "Stability"),
    (943549884, "Handling"),
    (4188031367, "Reload Speed"),
    (4284893193, "Rounds Per Minute"),
    (3871231066, "Magazine"),
    (1345609583, "Aim Assistance"),
    (1931675084, "Inventory Size"),
    (3555269338, "Zoom"),
    (2715839340, "Recoil"),
];

pub const SAMPLE_KINETIC_BUCKET: u32 = 1498876634;
pub const SAMPLE_ENERGY_BUCKET: u32 = 2465295065;
pub const SAMPLE_POWER_BUCKET: u32 = 953998645;
pub const SAMPLE_HELMET_BUCKET: u32 = 3448274439;

fn sample_item(hash: u32, name: &str, bucket: u32, stats: &[(u32, i32)]) -> (String, Value) {
    let stats: serde_json::Map<String, Value> = stats
        .iter()
        .map(|(stat, value)| {
            (
                stat.to_string(),
                json!({ "statHash": stat, "value": value, "minimum": 0, "maximum": 100 }),
            )
        })
        .collect();

    (
        hash.to_string(),
        json!({
            "hash": hash,
            "displayProperties": { "name": name, "description": "", "hasIcon": false },
            "itemTypeDisplayName": "Weapon",
            "inventory": {
                "bucketTypeHash": bucket,
                "tierTypeHash": 4008398120u32,
                "tierTypeName": "Legendary"
            },
            "stats": { "stats": stats },
            "damageTypeHashes": [3373582085u32],
            "itemCategoryHashes": [1],
            "seasonHash": 2809059425u32
        }),
    )
}

fn named_table(entries: &[(u32, &str)]) -> Value {
    let map: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(hash, name)| {
            (
                hash.to_string(),
                json!({
                    "hash": hash,
                    "displayProperties": { "name": name, "description": format!("{name}."), "hasIcon": false }
                }),
            )
        })
        .collect();
    Value::Object(map)
}

impl ManifestFixture {
    /// A small but complete manifest: one weapon per weapon bucket, one
    /// helmet, the eleven weapon stats and a tier table
    pub fn sample(version: impl Into<String>) -> Self {
        let items: serde_json::Map<String, Value> = [
            sample_item(
                3325744914,
                "Inaugural Address",
                SAMPLE_KINETIC_BUCKET,
                &[(4043523819, 29), (3555269338, 18), (4284893193, 600)],
            ),
            sample_item(
                2591746970,
                "Leviathan's Breath",
                SAMPLE_POWER_BUCKET,
                &[(4043523819, 100)],
            ),
            sample_item(1399243961, "Reckless Oracle", SAMPLE_HELMET_BUCKET, &[]),
            sample_item(
                1363886209,
                "Gjallarhorn",
                SAMPLE_POWER_BUCKET,
                &[(4043523819, 90), (1240592695, 60)],
            ),
            sample_item(
                2188764214,
                "Dead Man's Tale",
                SAMPLE_ENERGY_BUCKET,
                &[(2715839340, 75)],
            ),
        ]
        .into_iter()
        .collect();

        Self::new(version)
            .table(TableName::InventoryItem, Value::Object(items))
            .table(
                TableName::InventoryBucket,
                named_table(&[
                    (SAMPLE_HELMET_BUCKET, "Helmet"),
                    (SAMPLE_KINETIC_BUCKET, "Kinetic Weapons"),
                    (SAMPLE_ENERGY_BUCKET, "Energy Weapons"),
                    (SAMPLE_POWER_BUCKET, "Power Weapons"),
                ]),
            )
            .table(TableName::Stat, named_table(&SAMPLE_STATS))
            .table(
                TableName::ItemTierType,
                named_table(&[(4008398120, "Legendary"), (2759499571, "Exotic")]),
            )
    }

    /// Replace the payload of `table`, or drop it when `body` is `None`
    pub fn replace(mut self, table: TableName, body: Option<Value>) -> Self {
        self.tables.retain(|(t, _)| *t != table);
        if let Some(body) = body {
            self.tables.push((table, body));
        }
        self
    }

    /// Stat table without the named stats
    pub fn sample_stats_without(names: &[&str]) -> Value {
        let kept: Vec<(u32, &str)> = SAMPLE_STATS
            .into_iter()
            .filter(|(_, name)| !names.contains(name))
            .collect();
        named_table(&kept)
    }

    /// Bucket table without the named buckets
    pub fn sample_buckets_without(names: &[&str]) -> Value {
        let all = [
            (SAMPLE_HELMET_BUCKET, "Helmet"),
            (SAMPLE_KINETIC_BUCKET, "Kinetic Weapons"),
            (SAMPLE_ENERGY_BUCKET, "Energy Weapons"),
            (SAMPLE_POWER_BUCKET, "Power Weapons"),
        ];
        let kept: Vec<(u32, &str)> = all
            .into_iter()
            .filter(|(_, name)| !names.contains(name))
            .collect();
        named_table(&kept)
    }
}
