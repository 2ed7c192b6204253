//! Remote content client
//!
//! The engine only ever asks for JSON documents by path. `BungieClient` is
//! the production implementation; tests use [`crate::mock::StaticClient`].

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::RemoteError;

/// Default content service root
pub const DEFAULT_BASE_URL: &str = "https://www.bungie.net";

/// Header carrying the application API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Trait for fetching JSON documents from the content service
pub trait ContentClient: Send + Sync {
    /// Fetch and parse the JSON document at `path` (relative to the service root)
    fn get_json(&self, path: &str) -> impl Future<Output = Result<Value, RemoteError>> + Send;
}

/// Run a client request bounded by `timeout`.
///
/// The request future is dropped when the deadline passes.
pub(crate) async fn get_with_timeout<C: ContentClient>(
    client: &C,
    path: &str,
    timeout: Duration,
) -> Result<Value, RemoteError> {
    match tokio::time::timeout(timeout, client.get_json(path)).await {
        Ok(result) => result,
        Err(_) => Err(RemoteError::Timeout),
    }
}

/// Connection settings for [`BungieClient`]
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Per-request timeout of the underlying agent
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Authenticated client for the Bungie.net content service.
///
/// Construct once at startup and share; the underlying agent pools
/// connections.
#[derive(Clone)]
pub struct BungieClient {
    agent: ureq::Agent,
    config: ClientConfig,
}

impl BungieClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for BungieClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BungieClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish_non_exhaustive()
    }
}

impl ContentClient for BungieClient {
    async fn get_json(&self, path: &str) -> Result<Value, RemoteError> {
        let agent = self.agent.clone();
        let url = self.url_for(path);
        let api_key = self.config.api_key.clone();

        tracing::debug!(%url, "fetching");
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url, &api_key))
            .await
            .map_err(|e| RemoteError::Transport(format!("fetch task failed: {e}")))?
    }
}

fn fetch_blocking(agent: &ureq::Agent, url: &str, api_key: &str) -> Result<Value, RemoteError> {
    let response = match agent.get(url).set(API_KEY_HEADER, api_key).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            return Err(RemoteError::Status {
                code,
                message: resp.status_text().to_string(),
            });
        }
        Err(ureq::Error::Transport(t)) => return Err(RemoteError::Transport(t.to_string())),
    };

    response
        .into_json::<Value>()
        .map_err(|e| RemoteError::Body(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_paths() {
        let client = BungieClient::new(ClientConfig {
            base_url: "https://example.test/".into(),
            api_key: "key".into(),
            timeout: Duration::from_secs(1),
        });

        assert_eq!(
            client.url_for("/Platform/Destiny2/Manifest/"),
            "https://example.test/Platform/Destiny2/Manifest/"
        );
        assert_eq!(
            client.url_for("common/destiny2_content/json/en/a.json"),
            "https://example.test/common/destiny2_content/json/en/a.json"
        );
        assert_eq!(
            client.url_for("https://cdn.example.test/a.json"),
            "https://cdn.example.test/a.json"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = BungieClient::new(ClientConfig::new("secret-key"));
        let printed = format!("{client:?}");
        assert!(printed.contains("www.bungie.net"));
        assert!(!printed.contains("secret-key"));
    }
}
