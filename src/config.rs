//! Configuration handling for the admin server.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables.

use crate::models::{DEFAULT_SELECT_CEILING, MAX_EXPORT_CEILING, RowLimitPolicy};
use clap::Parser;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MYSQLDUMP_BIN: &str = "mysqldump";

/// Configuration for the admin server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-admin-server",
    about = "HTTP backend for a browser-based MySQL admin tool",
    version,
    author
)]
pub struct Config {
    /// HTTP host to bind to
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "ADMIN_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "ADMIN_HTTP_PORT")]
    pub http_port: u16,

    /// Row ceiling for interactive ad-hoc SELECT statements
    #[arg(
        long,
        default_value_t = DEFAULT_SELECT_CEILING,
        env = "ADMIN_SELECT_ROW_LIMIT"
    )]
    pub select_row_limit: u64,

    /// Maximum row ceiling for CSV exports (caller-supplied values are
    /// clamped to this)
    #[arg(
        long,
        default_value_t = MAX_EXPORT_CEILING,
        env = "ADMIN_EXPORT_ROW_LIMIT"
    )]
    pub export_row_limit: u64,

    /// Path to the mysqldump binary for the fast export path
    #[arg(
        long,
        default_value = DEFAULT_MYSQLDUMP_BIN,
        env = "ADMIN_MYSQLDUMP_BIN"
    )]
    pub mysqldump_bin: String,

    /// Disable the mysqldump fast path even when the binary is present
    #[arg(long, env = "ADMIN_DISABLE_MYSQLDUMP")]
    pub disable_mysqldump: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "ADMIN_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "ADMIN_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            select_row_limit: DEFAULT_SELECT_CEILING,
            export_row_limit: MAX_EXPORT_CEILING,
            mysqldump_bin: DEFAULT_MYSQLDUMP_BIN.to_string(),
            disable_mysqldump: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Row-limit policy from the configured ceilings.
    pub fn row_limit_policy(&self) -> RowLimitPolicy {
        RowLimitPolicy {
            max_select_rows: self.select_row_limit,
            max_export_rows: self.export_row_limit,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.select_row_limit, 100);
        assert_eq!(config.export_row_limit, 5000);
        assert_eq!(config.mysqldump_bin, "mysqldump");
        assert!(!config.disable_mysqldump);
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_row_limit_policy_from_config() {
        let config = Config {
            select_row_limit: 50,
            export_row_limit: 1000,
            ..Config::default()
        };
        let policy = config.row_limit_policy();
        assert_eq!(policy.max_select_rows, 50);
        assert_eq!(policy.max_export_rows, 1000);
    }
}
