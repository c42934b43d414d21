mod cli;
mod server;

use std::sync::Arc;

use clap::Parser;
use eyre::{eyre, WrapErr};

use abel_core::ledger::{AssetLedger, HttpLedgerClient};
use abel_core::registry::SnapshotFile;
use abel_core::{Principal, Registry};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let api_token = match &args.api_token {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            use rand::Rng;
            let bytes: [u8; 16] = rand::thread_rng().r#gen();
            hex_encode(bytes)
        }
    };

    let ledger = HttpLedgerClient::new(
        &args.ledger_url,
        args.ledger_token.as_deref(),
        args.ledger_rps,
        args.ledger_concurrency,
    )
    .context("configure asset ledger client")?;

    // Lookups fail per request while the node is down, so an unreachable
    // node at startup is not fatal.
    match ledger.check_health().await {
        Ok(()) => tracing::info!(url = %args.ledger_url, "connected to asset ledger"),
        Err(err) => tracing::warn!(
            url = %args.ledger_url,
            error = %err,
            "asset ledger is unreachable; labeling assets will fail until it is up"
        ),
    }
    let ledger: Arc<dyn AssetLedger> = Arc::new(ledger);

    let snapshot = args.state_file.as_ref().map(SnapshotFile::new);
    let registry = load_registry(snapshot.as_ref(), args.admin.as_deref())?;
    if snapshot.is_none() {
        tracing::warn!("no --state-file given; registry changes are lost on exit");
    }
    tracing::info!(
        admin = %registry.admin(),
        labels = registry.list_labels().count(),
        "registry ready"
    );

    let state = server::AppState {
        registry: Arc::new(tokio::sync::RwLock::new(registry)),
        ledger,
        snapshot,
        api_token: api_token.clone(),
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = format!("http://{}:{}", args.bind, args.port);
    let router = server::build_router(state, &origin)?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0 and is accessible from the network");
    }

    println!();
    println!("  Abel is running:");
    println!("    API:       http://{bind_addr}/api/v1");
    if args.api_token.is_none() {
        println!("    Token:     {api_token}");
    }
    println!();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

/// Restore the persisted registry, or start a fresh one administered by
/// `admin`.
fn load_registry(snapshot: Option<&SnapshotFile>, admin: Option<&str>) -> eyre::Result<Registry> {
    if let Some(file) = snapshot {
        let restored = file
            .load()
            .with_context(|| format!("load registry snapshot {}", file.path().display()))?;
        if let Some(registry) = restored {
            tracing::info!(path = %file.path().display(), "loaded persisted registry");
            if admin.is_some_and(|admin| admin.trim() != registry.admin().as_str()) {
                tracing::warn!("--admin differs from the persisted admin and is ignored");
            }
            return Ok(registry);
        }
    }

    let admin = admin
        .and_then(Principal::parse)
        .ok_or_else(|| eyre!("--admin (or ABEL_ADMIN) is required to initialize a new registry"))?;
    let registry = Registry::new(admin);
    if let Some(file) = snapshot {
        file.save(&registry)
            .with_context(|| format!("write initial snapshot {}", file.path().display()))?;
    }
    Ok(registry)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

/// Tiny hex-encoding helper to avoid adding a `hex` crate dependency.
fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}
