use std::path::PathBuf;

use clap::Parser;

/// Abel: asset labeling registry with admin-managed labels and delegated operators.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090")]
    pub port: u16,

    /// Initial admin principal. Required when no snapshot exists yet; ignored
    /// once the registry has been persisted.
    #[arg(long, env = "ABEL_ADMIN")]
    pub admin: Option<String>,

    /// JSON snapshot file for persistence.
    /// If omitted, the registry is in-memory only.
    #[arg(long, env = "ABEL_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Base URL of the algod-compatible node used for asset lookups.
    #[arg(long, default_value = "http://127.0.0.1:4001", env = "ABEL_LEDGER_URL")]
    pub ledger_url: String,

    /// API token sent to the ledger node as `X-Algo-API-Token`.
    #[arg(long, env = "ABEL_LEDGER_TOKEN")]
    pub ledger_token: Option<String>,

    /// Maximum ledger requests per second (unlimited if omitted).
    #[arg(long)]
    pub ledger_rps: Option<u32>,

    /// Maximum concurrent ledger lookups per batch.
    #[arg(long, default_value = "8")]
    pub ledger_concurrency: usize,

    /// API token clients must send as `X-API-Token`.
    /// A random token is generated for the session if omitted.
    #[arg(long, env = "ABEL_API_TOKEN")]
    pub api_token: Option<String>,
}
