use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_HTTP_PORT: u16 = 17000;
pub const DEFAULT_RPC_PORT: u16 = 17001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Albums live in process memory and are lost on exit.
    Memory,
    /// Albums are persisted in a SQLite database file.
    Sqlite,
}

/// Runtime configuration. Every flag can also be set through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address both listeners bind to
    #[arg(long, env = "ALBUMSTORE_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port of the JSON HTTP API. Use 0 for an ephemeral port.
    #[arg(long, env = "ALBUMSTORE_HTTP_PORT", default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// Port of the RPC endpoint. Use 0 for an ephemeral port.
    #[arg(long, env = "ALBUMSTORE_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Which album store backs both endpoints
    #[arg(long, env = "ALBUMSTORE_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// SQLite database file, created when missing
    #[arg(long, env = "ALBUMSTORE_DATABASE_PATH", default_value = "albums.db")]
    pub database_path: PathBuf,

    /// Start with an empty store instead of the seed catalog
    #[arg(long, env = "ALBUMSTORE_NO_SEED")]
    pub no_seed: bool,

    /// Seconds the HTTP server gets to drain requests on shutdown
    #[arg(long, env = "ALBUMSTORE_SHUTDOWN_GRACE_SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Largest RPC frame accepted, in bytes
    #[arg(long, env = "ALBUMSTORE_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Name reported by the health check
    #[arg(long, env = "ALBUMSTORE_SERVICE_NAME", default_value = "albumstore")]
    pub service_name: String,
}

impl Config {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            rpc_port: DEFAULT_RPC_PORT,
            store: StoreKind::Sqlite,
            database_path: PathBuf::from("albums.db"),
            no_seed: false,
            shutdown_grace_secs: 5,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            service_name: "albumstore".to_string(),
        }
    }
}
