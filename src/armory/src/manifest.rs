//! Manifest retrieval
//!
//! The manifest is a version string plus, per locale, the location of every
//! definition table's JSON payload. Table identifiers are only meaningful
//! within the manifest version that produced them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{get_with_timeout, ContentClient};
use crate::error::{CatalogError, CatalogResult, RemoteError};

/// Manifest endpoint, relative to the service root
pub const MANIFEST_PATH: &str = "/Platform/Destiny2/Manifest/";

/// Bungie platform `ErrorCode` for success
const PLATFORM_SUCCESS: i64 = 1;

// ============================================================================
// Table names
// ============================================================================

/// Definition tables the engine knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableName {
    InventoryItem,
    InventoryBucket,
    ItemTierType,
    Stat,
    DamageType,
    ItemCategory,
    PlugSet,
    SocketType,
    SocketCategory,
}

impl TableName {
    pub const ALL: [TableName; 9] = [
        TableName::InventoryItem,
        TableName::InventoryBucket,
        TableName::ItemTierType,
        TableName::Stat,
        TableName::DamageType,
        TableName::ItemCategory,
        TableName::PlugSet,
        TableName::SocketType,
        TableName::SocketCategory,
    ];

    /// Name of the table as it appears in the manifest
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InventoryItem => "DestinyInventoryItemDefinition",
            Self::InventoryBucket => "DestinyInventoryBucketDefinition",
            Self::ItemTierType => "DestinyItemTierTypeDefinition",
            Self::Stat => "DestinyStatDefinition",
            Self::DamageType => "DestinyDamageTypeDefinition",
            Self::ItemCategory => "DestinyItemCategoryDefinition",
            Self::PlugSet => "DestinyPlugSetDefinition",
            Self::SocketType => "DestinySocketTypeDefinition",
            Self::SocketCategory => "DestinySocketCategoryDefinition",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown table name: {s}"))
    }
}

// ============================================================================
// Manifest
// ============================================================================

/// Version descriptor and table locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    /// locale -> table name -> payload path
    pub json_world_component_content_paths: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    /// Payload path for `table` in `locale`
    pub fn table_path(&self, locale: &str, table: TableName) -> CatalogResult<&str> {
        let tables = self
            .json_world_component_content_paths
            .get(locale)
            .ok_or_else(|| {
                CatalogError::MalformedManifest(format!("no content paths for locale {locale:?}"))
            })?;

        tables
            .get(table.as_str())
            .map(String::as_str)
            .ok_or(CatalogError::UnknownTable(table))
    }

    /// Locales the manifest carries content for
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.json_world_component_content_paths
            .keys()
            .map(String::as_str)
    }
}

/// Platform response envelope wrapping every `/Platform` payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope {
    response: Option<Value>,
    error_code: i64,
    #[serde(default)]
    error_status: String,
    #[serde(default)]
    message: String,
}

/// Fetch the current manifest.
///
/// Transport failures, timeouts and platform-level errors are
/// `RemoteUnavailable`; anything that doesn't decode is `MalformedManifest`.
/// No retries.
pub async fn fetch_manifest<C: ContentClient>(
    client: &C,
    timeout: Duration,
) -> CatalogResult<Manifest> {
    let body = get_with_timeout(client, MANIFEST_PATH, timeout)
        .await
        .map_err(|e| match e {
            RemoteError::Body(reason) => CatalogError::MalformedManifest(reason),
            other => CatalogError::RemoteUnavailable(other.to_string()),
        })?;

    let manifest = decode_manifest(body)?;
    tracing::info!(version = %manifest.version, "fetched manifest");
    Ok(manifest)
}

fn decode_manifest(body: Value) -> CatalogResult<Manifest> {
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| CatalogError::MalformedManifest(format!("bad envelope: {e}")))?;

    if envelope.error_code != PLATFORM_SUCCESS {
        let err = RemoteError::Api {
            code: envelope.error_code,
            status: envelope.error_status,
            message: envelope.message,
        };
        return Err(CatalogError::RemoteUnavailable(err.to_string()));
    }

    let response = envelope
        .response
        .ok_or_else(|| CatalogError::MalformedManifest("missing Response".into()))?;

    serde_json::from_value(response).map_err(|e| CatalogError::MalformedManifest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::StaticClient;
    use serde_json::json;

    fn envelope(response: Value) -> Value {
        json!({
            "Response": response,
            "ErrorCode": 1,
            "ThrottleSeconds": 0,
            "ErrorStatus": "Success",
            "Message": "Ok",
            "MessageData": {}
        })
    }

    #[test]
    fn test_table_name_round_trip() {
        for table in TableName::ALL {
            assert_eq!(table.as_str().parse::<TableName>(), Ok(table));
        }
        assert!("DestinyRaceDefinition".parse::<TableName>().is_err());
    }

    #[tokio::test]
    async fn test_fetch_manifest() {
        let client = StaticClient::new().with(
            MANIFEST_PATH,
            envelope(json!({
                "version": "123.45",
                "mobileWorldContentPaths": { "en": "/m.sqlite" },
                "jsonWorldComponentContentPaths": {
                    "en": { "DestinyStatDefinition": "/json/en/DestinyStatDefinition-1.json" }
                }
            })),
        );

        let manifest = fetch_manifest(&client, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(manifest.version, "123.45");
        assert_eq!(
            manifest.table_path("en", TableName::Stat).unwrap(),
            "/json/en/DestinyStatDefinition-1.json"
        );
        assert_eq!(
            manifest.table_path("en", TableName::InventoryItem),
            Err(CatalogError::UnknownTable(TableName::InventoryItem))
        );
        assert_eq!(
            manifest.table_path("de", TableName::Stat).unwrap_err().kind(),
            "malformed_manifest"
        );
    }

    #[tokio::test]
    async fn test_fetch_manifest_platform_error() {
        let client = StaticClient::new().with(
            MANIFEST_PATH,
            json!({
                "ErrorCode": 5,
                "ErrorStatus": "SystemDisabled",
                "Message": "This system is temporarily disabled for maintenance."
            }),
        );

        let err = fetch_manifest(&client, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "remote_unavailable");
        assert!(err.to_string().contains("SystemDisabled"));
    }

    #[tokio::test]
    async fn test_fetch_manifest_bad_shape() {
        let client = StaticClient::new().with(MANIFEST_PATH, envelope(json!({ "version": 7 })));

        let err = fetch_manifest(&client, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_manifest");
    }

    #[tokio::test]
    async fn test_fetch_manifest_transport_failure() {
        let client = StaticClient::new().failing(
            MANIFEST_PATH,
            RemoteError::Transport("connection refused".into()),
        );

        let err = fetch_manifest(&client, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::RemoteUnavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_manifest_times_out() {
        let client = StaticClient::new().hanging(MANIFEST_PATH);

        let err = fetch_manifest(&client, Duration::from_secs(30))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::RemoteUnavailable("request timed out".into())
        );
    }
}
