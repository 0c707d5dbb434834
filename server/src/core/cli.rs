use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::AnalyticsBackend;
use super::constants::{
    ENV_ANALYTICS_BACKEND, ENV_CLICKHOUSE_DATABASE, ENV_CLICKHOUSE_PASSWORD, ENV_CLICKHOUSE_URL,
    ENV_CLICKHOUSE_USER, ENV_CONFIG, ENV_DUCKDB_PATH, ENV_HOST, ENV_PORT, ENV_POSTGRES_URL,
    ENV_QUERY_MAX_LIMIT,
};

#[derive(Parser)]
#[command(name = "tracelens")]
#[command(version, about = "Analytical queries over LLM traces", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Largest page size a caller may request
    #[arg(long, global = true, env = ENV_QUERY_MAX_LIMIT)]
    pub query_max_limit: Option<i64>,

    // Database options
    /// Analytics database backend (duckdb, postgres or clickhouse)
    #[arg(long, global = true, env = ENV_ANALYTICS_BACKEND, value_parser = parse_analytics_backend)]
    pub analytics_backend: Option<AnalyticsBackend>,

    /// DuckDB database file (in-memory when unset)
    #[arg(long, global = true, env = ENV_DUCKDB_PATH)]
    pub duckdb_path: Option<PathBuf>,

    /// PostgreSQL connection URL (when using postgres backend)
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    /// ClickHouse HTTP URL (when using clickhouse backend)
    #[arg(long, global = true, env = ENV_CLICKHOUSE_URL)]
    pub clickhouse_url: Option<String>,

    /// ClickHouse database
    #[arg(long, global = true, env = ENV_CLICKHOUSE_DATABASE)]
    pub clickhouse_database: Option<String>,

    /// ClickHouse user
    #[arg(long, global = true, env = ENV_CLICKHOUSE_USER)]
    pub clickhouse_user: Option<String>,

    /// ClickHouse password
    #[arg(long, global = true, env = ENV_CLICKHOUSE_PASSWORD, hide_env_values = true)]
    pub clickhouse_password: Option<String>,
}

/// Parse analytics backend from CLI/env string
fn parse_analytics_backend(s: &str) -> Result<AnalyticsBackend, String> {
    match s.to_lowercase().as_str() {
        "duckdb" => Ok(AnalyticsBackend::Duckdb),
        "postgres" | "postgresql" => Ok(AnalyticsBackend::Postgres),
        "clickhouse" => Ok(AnalyticsBackend::Clickhouse),
        _ => Err(format!(
            "Invalid analytics backend '{}'. Valid options: duckdb, postgres, clickhouse",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Print the SQL and parameters a query compiles to, without running it
    Explain {
        /// Query description (JSON file, `-` for stdin)
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Project the query is scoped to
        #[arg(long, default_value = "default")]
        project: String,

        /// Target dialect, defaults to the configured analytics backend
        #[arg(long, value_parser = parse_analytics_backend)]
        dialect: Option<AnalyticsBackend>,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub query_max_limit: Option<i64>,
    pub analytics_backend: Option<AnalyticsBackend>,
    pub duckdb_path: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub clickhouse_url: Option<String>,
    pub clickhouse_database: Option<String>,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}

impl Cli {
    /// Split parsed arguments into config values and the command
    fn into_parts(self) -> (CliConfig, Option<Commands>) {
        let config = CliConfig {
            host: self.host,
            port: self.port,
            config: self.config,
            query_max_limit: self.query_max_limit,
            analytics_backend: self.analytics_backend,
            duckdb_path: self.duckdb_path,
            postgres_url: self.postgres_url,
            clickhouse_url: self.clickhouse_url,
            clickhouse_database: self.clickhouse_database,
            clickhouse_user: self.clickhouse_user,
            clickhouse_password: self.clickhouse_password,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    Cli::parse().into_parts()
}
