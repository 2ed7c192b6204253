//! Error types for catalog resolution
//!
//! `RemoteError` is what a [`ContentClient`](crate::client::ContentClient)
//! reports. `CatalogError` is what the engine reports to its caller; every
//! remote failure is folded into one of its kinds depending on which step
//! was running.

use crate::manifest::TableName;

/// Failure reported by a content client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("invalid response body: {0}")]
    Body(String),

    #[error("API error {code} ({status}): {message}")]
    Api {
        code: i64,
        status: String,
        message: String,
    },
}

/// Error type for catalog resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("content service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("table {0} is not listed in the manifest")]
    UnknownTable(TableName),

    #[error("failed to fetch {table}: {reason}")]
    TableFetchFailed { table: TableName, reason: String },

    #[error("failed to decode {table}: {reason}")]
    TableDecodeFailed { table: TableName, reason: String },

    #[error("no {table} record named {name:?}")]
    NameNotFound { table: TableName, name: String },

    #[error("weapon {item} could not resolve stat {stat:?}")]
    StatResolutionFailed { item: u32, stat: String },

    #[error("name index built for manifest {index} applied to manifest {table}")]
    VersionMismatch { index: String, table: String },

    #[error("catalog not ready: {0}")]
    NotReady(String),
}

impl CatalogError {
    /// Stable machine-readable kind, used in structured error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RemoteUnavailable(_) => "remote_unavailable",
            Self::MalformedManifest(_) => "malformed_manifest",
            Self::UnknownTable(_) => "unknown_table",
            Self::TableFetchFailed { .. } => "table_fetch_failed",
            Self::TableDecodeFailed { .. } => "table_decode_failed",
            Self::NameNotFound { .. } => "name_not_found",
            Self::StatResolutionFailed { .. } => "stat_resolution_failed",
            Self::VersionMismatch { .. } => "version_mismatch",
            Self::NotReady(_) => "not_ready",
        }
    }

    /// Map a client failure during a table fetch.
    ///
    /// Timeouts always surface as `RemoteUnavailable`.
    pub(crate) fn from_table_fetch(table: TableName, err: RemoteError) -> Self {
        match err {
            RemoteError::Timeout => Self::RemoteUnavailable(format!("{table}: {err}")),
            RemoteError::Body(reason) => Self::TableDecodeFailed { table, reason },
            other => Self::TableFetchFailed {
                table,
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
