//! Armory API Server
//!
//! Serves the Destiny 2 weapon catalog resolved from the Bungie.net content
//! manifest.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use armory::{BungieClient, DEFAULT_BASE_URL};
use armory_server::{config, router, AppState};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI
// =============================================================================

#[derive(Parser)]
#[command(name = "armory-server")]
#[command(about = "Weapon catalog API server for the Destiny 2 content manifest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Bind address
        #[arg(short, long, env = "BIND", default_value = "0.0.0.0")]
        bind: String,

        /// Bungie.net API key
        #[arg(long, env = "BUNGIE_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Bungie.net base URL
        #[arg(long, env = "BUNGIE_BASE_URL", default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Resolver settings (TOML)
        #[arg(short, long, env = "ARMORY_CONFIG")]
        config: Option<PathBuf>,

        /// Write tables and catalogs resolved by /weapons into this directory
        #[arg(long, env = "ARMORY_DEBUG_DIR")]
        debug_dir: Option<PathBuf>,

        /// Development mode; dumps to debug/ unless --debug-dir is given
        #[arg(long, env = "ARMORY_DEV")]
        dev: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            bind,
            api_key,
            base_url,
            config: config_path,
            debug_dir,
            dev,
        } => {
            // Initialize tracing
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                        "armory=info,armory_server=info,tower_http=debug".into()
                    }),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let resolver = config::load_resolver_config(config_path.as_deref())?;
            let debug_dir = config::debug_dir(debug_dir, dev);
            if let Some(dir) = &debug_dir {
                tracing::info!("Debug dumps go to {}", dir.display());
            }

            let client = BungieClient::new(config::client_config(&resolver, api_key, base_url));
            tracing::info!("Using content service at {}", client.config().base_url);

            let state = Arc::new(
                AppState::new(Arc::new(client), resolver).with_debug_dir(debug_dir),
            );

            // Resolve the snapshot in the background so startup never blocks on it
            let background = state.clone();
            tokio::spawn(async move {
                if background.refresh_snapshot().await.is_ok() {
                    tracing::info!("Weapon snapshot ready");
                }
            });

            let app = router(state);

            let bind_addr = format!("{}:{}", bind, port);
            tracing::info!("Starting server on {}", bind_addr);
            tracing::info!("OpenAPI spec available at /openapi.json");
            tracing::info!("Interactive docs at /scalar");

            let listener = tokio::net::TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("Failed to bind {}", bind_addr))?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
