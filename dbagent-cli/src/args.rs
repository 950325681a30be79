//! Command-line arguments
//!
//! Every flag is optional and overrides the matching environment variable.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dbagent_server::config::parse_list;
use dbagent_server::GatewayConfig;

#[derive(Parser, Debug)]
#[command(
    name = "dbagent",
    author,
    version,
    about = "HTTP gateway that forwards JSON requests to a MySQL database",
    long_about = "Serves /api/query for parameterized SQL, /api/procedure for stored \
                  procedure calls, and fixed user/address routes. Settings come from the \
                  environment (PORT, DB_HOST, DB_PORT, DB_USER, DB_PASSWORD, DB_NAME, ...) \
                  and can be overridden with the flags below."
)]
pub struct Cli {
    /// Port to listen on [env: PORT]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bind address [env: BIND_ADDR]
    #[arg(short, long)]
    pub bind: Option<IpAddr>,

    /// MySQL host [env: DB_HOST]
    #[arg(long)]
    pub db_host: Option<String>,

    /// MySQL port [env: DB_PORT]
    #[arg(long)]
    pub db_port: Option<u16>,

    /// MySQL user [env: DB_USER]
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database name [env: DB_NAME]
    #[arg(long)]
    pub db_name: Option<String>,

    /// Maximum pooled connections [env: DB_CONNECTION_LIMIT]
    #[arg(long)]
    pub connection_limit: Option<u32>,

    /// Seconds to keep retrying a refused connect [env: DB_CONNECT_TIMEOUT_SECS]
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    /// Per-statement timeout in seconds, 0 to disable [env: QUERY_TIMEOUT_SECS]
    #[arg(long)]
    pub query_timeout: Option<u64>,

    /// Comma-separated procedures allowed on /api/procedure [env: PROCEDURE_ALLOWLIST]
    #[arg(long)]
    pub allow_procedures: Option<String>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Apply flag overrides on top of an environment-derived config
    pub fn apply(&self, mut config: GatewayConfig) -> GatewayConfig {
        let ip = self.bind.unwrap_or(config.bind_addr.ip());
        let port = self.port.unwrap_or(config.bind_addr.port());
        config.bind_addr = SocketAddr::new(ip, port);

        if let Some(host) = &self.db_host {
            config.database.host = host.clone();
        }
        if let Some(port) = self.db_port {
            config.database.port = port;
        }
        if let Some(user) = &self.db_user {
            config.database.user = user.clone();
        }
        if let Some(name) = &self.db_name {
            config.database.database = name.clone();
        }
        if let Some(limit) = self.connection_limit.filter(|l| *l > 0) {
            config.database.connection_limit = limit;
        }
        if let Some(secs) = self.connect_timeout.filter(|s| *s > 0) {
            config.database.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.query_timeout {
            config.query_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = &self.allow_procedures {
            config.procedure_allowlist = Some(parse_list(raw));
        }

        config
    }
}
