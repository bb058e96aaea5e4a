//! Server configuration from flags and environment.

use clap::Parser;
use newsdesk_core::{default_log_level, init_console_logging, init_logging};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default HTTP bind address.
pub const BIND_ADDRESS_DEFAULT: &str = "127.0.0.1:8080";

/// Default database file, relative to the working directory.
pub const DB_PATH_DEFAULT: &str = "newsdesk.sqlite3";

/// newsdesk - news article store over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "newsdesk")]
#[command(about = "Persistent news article store with a JSON HTTP API")]
#[command(version)]
pub struct ServerConfig {
    /// HTTP bind address
    #[arg(long, env = "NEWSDESK_BIND", default_value = BIND_ADDRESS_DEFAULT)]
    pub bind: SocketAddr,

    /// SQLite database file; created with its parent directories if missing
    #[arg(long, env = "NEWSDESK_DB_PATH", default_value = DB_PATH_DEFAULT)]
    pub db_path: PathBuf,

    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "NEWSDESK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr when unset
    #[arg(long, env = "NEWSDESK_LOG_DIR")]
    pub log_dir: Option<String>,
}

impl ServerConfig {
    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts process logging according to this configuration.
    pub fn init_logging(&self) -> Result<(), String> {
        let level = self.effective_log_level();
        match self.log_dir.as_deref() {
            Some(dir) => init_logging(level, dir),
            None => init_console_logging(level),
        }
    }
}
