use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::sql::Backend;
use crate::domain::query::QueryLimits;
use crate::utils::file::{expand_path, read_json_file};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CLICKHOUSE_DEFAULT_DATABASE, CLICKHOUSE_DEFAULT_TIMEOUT_SECS,
    CLICKHOUSE_DEFAULT_URL, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_PORT,
    POSTGRES_DEFAULT_MAX_CONNECTIONS, POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS, QUERY_MAX_BUCKETS,
    QUERY_MAX_LIMIT,
};

// =============================================================================
// Analytics Backend Enum (DuckDB, PostgreSQL or ClickHouse)
// =============================================================================

/// Store the query service runs against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsBackend {
    #[default]
    Duckdb,
    #[serde(alias = "postgresql")]
    Postgres,
    Clickhouse,
}

impl AnalyticsBackend {
    /// SQL backend the compiler targets
    pub fn backend(&self) -> Backend {
        match self {
            AnalyticsBackend::Duckdb => Backend::Duckdb,
            AnalyticsBackend::Postgres => Backend::Postgres,
            AnalyticsBackend::Clickhouse => Backend::Clickhouse,
        }
    }
}

impl fmt::Display for AnalyticsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.backend().name())
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// DuckDB configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DuckdbFileConfig {
    /// Database file, in-memory when unset
    pub path: Option<String>,
}

/// PostgreSQL configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostgresFileConfig {
    /// PostgreSQL connection URL (or use TRACELENS_POSTGRES_URL env var)
    pub url: Option<String>,
    /// Maximum number of connections in the pool (default: 20)
    pub max_connections: Option<u32>,
    /// Statement timeout in seconds (default: 60)
    pub statement_timeout_secs: Option<u64>,
}

/// ClickHouse configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ClickhouseFileConfig {
    /// ClickHouse HTTP URL (or use TRACELENS_CLICKHOUSE_URL env var)
    pub url: Option<String>,
    /// Database name (default: "tracelens")
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Query timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Database configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    /// Analytics backend: duckdb (default), postgres or clickhouse
    pub analytics: Option<AnalyticsBackend>,
    pub duckdb: Option<DuckdbFileConfig>,
    pub postgres: Option<PostgresFileConfig>,
    pub clickhouse: Option<ClickhouseFileConfig>,
}

/// Query builder section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    /// Largest page size a caller may request
    pub max_limit: Option<i64>,
    /// Largest number of time buckets in one query
    pub max_buckets: Option<usize>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `current` with `other` when set
fn merge_opt<T: fmt::Debug>(current: &mut Option<T>, other: Option<T>, key: &str) {
    if other.is_some() {
        tracing::trace!(key, value = ?other, "Merging config value");
        *current = other;
    }
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let config: Self = read_json_file(path)?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            merge_opt(&mut current.host, server.host, "server.host");
            merge_opt(&mut current.port, server.port, "server.port");
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            merge_opt(&mut current.analytics, database.analytics, "database.analytics");

            if let Some(duckdb) = database.duckdb {
                let current = current.duckdb.get_or_insert_with(DuckdbFileConfig::default);
                merge_opt(&mut current.path, duckdb.path, "database.duckdb.path");
            }

            if let Some(pg) = database.postgres {
                let current = current
                    .postgres
                    .get_or_insert_with(PostgresFileConfig::default);
                merge_opt(&mut current.url, pg.url, "database.postgres.url");
                merge_opt(
                    &mut current.max_connections,
                    pg.max_connections,
                    "database.postgres.max_connections",
                );
                merge_opt(
                    &mut current.statement_timeout_secs,
                    pg.statement_timeout_secs,
                    "database.postgres.statement_timeout_secs",
                );
            }

            if let Some(ch) = database.clickhouse {
                let current = current
                    .clickhouse
                    .get_or_insert_with(ClickhouseFileConfig::default);
                merge_opt(&mut current.url, ch.url, "database.clickhouse.url");
                merge_opt(&mut current.database, ch.database, "database.clickhouse.database");
                merge_opt(&mut current.user, ch.user, "database.clickhouse.user");
                merge_opt(&mut current.password, ch.password, "database.clickhouse.password");
                merge_opt(
                    &mut current.timeout_secs,
                    ch.timeout_secs,
                    "database.clickhouse.timeout_secs",
                );
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            merge_opt(&mut current.max_limit, query.max_limit, "query.max_limit");
            merge_opt(&mut current.max_buckets, query.max_buckets, "query.max_buckets");
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// DuckDB configuration (final/runtime)
#[derive(Debug, Clone, Default)]
pub struct DuckdbConfig {
    /// Database file, `None` for an in-memory database
    pub path: Option<PathBuf>,
}

/// PostgreSQL configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Statement timeout in seconds
    pub statement_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: POSTGRES_DEFAULT_MAX_CONNECTIONS,
            statement_timeout_secs: POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS,
        }
    }
}

/// ClickHouse configuration (final/runtime)
#[derive(Debug, Clone)]
pub struct ClickhouseConfig {
    /// ClickHouse HTTP URL
    pub url: String,
    /// Database name
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Query timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ClickhouseConfig {
    fn default() -> Self {
        Self {
            url: CLICKHOUSE_DEFAULT_URL.to_string(),
            database: CLICKHOUSE_DEFAULT_DATABASE.to_string(),
            user: None,
            password: None,
            timeout_secs: CLICKHOUSE_DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Database configuration (final/runtime)
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Analytics backend: duckdb (default), postgres or clickhouse
    pub analytics: AnalyticsBackend,
    pub duckdb: DuckdbConfig,
    /// Only populated if analytics = postgres
    pub postgres: Option<PostgresConfig>,
    /// Only populated if analytics = clickhouse
    pub clickhouse: Option<ClickhouseConfig>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryLimits,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.tracelens/tracelens.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.tracelens/tracelens.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer defaults, merged file config and CLI/env overrides
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let analytics = cli
            .analytics_backend
            .or(file_database.analytics)
            .unwrap_or_default();

        let file_duckdb = file_database.duckdb.unwrap_or_default();
        let duckdb = DuckdbConfig {
            path: cli
                .duckdb_path
                .clone()
                .or_else(|| file_duckdb.path.map(PathBuf::from))
                .map(|p| expand_path(&p.to_string_lossy())),
        };

        // PostgreSQL config (only populated if using postgres backend)
        let postgres = if analytics == AnalyticsBackend::Postgres {
            let file_pg = file_database.postgres.unwrap_or_default();
            let defaults = PostgresConfig::default();
            Some(PostgresConfig {
                url: cli.postgres_url.clone().or(file_pg.url).unwrap_or_default(),
                max_connections: file_pg.max_connections.unwrap_or(defaults.max_connections),
                statement_timeout_secs: file_pg
                    .statement_timeout_secs
                    .unwrap_or(defaults.statement_timeout_secs),
            })
        } else {
            None
        };

        // ClickHouse config (only populated if using clickhouse backend)
        let clickhouse = if analytics == AnalyticsBackend::Clickhouse {
            let file_ch = file_database.clickhouse.unwrap_or_default();
            let defaults = ClickhouseConfig::default();
            Some(ClickhouseConfig {
                url: cli
                    .clickhouse_url
                    .clone()
                    .or(file_ch.url)
                    .unwrap_or(defaults.url),
                database: cli
                    .clickhouse_database
                    .clone()
                    .or(file_ch.database)
                    .unwrap_or(defaults.database),
                user: cli.clickhouse_user.clone().or(file_ch.user),
                password: cli.clickhouse_password.clone().or(file_ch.password),
                timeout_secs: file_ch.timeout_secs.unwrap_or(defaults.timeout_secs),
            })
        } else {
            None
        };

        let query = QueryLimits {
            max_limit: cli
                .query_max_limit
                .or(file_query.max_limit)
                .unwrap_or(QUERY_MAX_LIMIT),
            max_buckets: file_query.max_buckets.unwrap_or(QUERY_MAX_BUCKETS),
        };

        let mut config = Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                analytics,
                duckdb,
                postgres,
                clickhouse,
            },
            query,
        };

        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            analytics_backend = %config.database.analytics,
            duckdb_path = ?config.database.duckdb.path,
            query_max_limit = config.query.max_limit,
            query_max_buckets = config.query.max_buckets,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration, clamping limits above the hard ceilings
    fn validate(&mut self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }

        // Port 0 would cause bind failure
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }

        if self.query.max_limit < 1 {
            anyhow::bail!("Configuration error: query.max_limit must be at least 1");
        }
        if self.query.max_limit > QUERY_MAX_LIMIT {
            tracing::warn!(
                configured = self.query.max_limit,
                max = QUERY_MAX_LIMIT,
                "query.max_limit exceeds the hard ceiling, clamping"
            );
            self.query.max_limit = QUERY_MAX_LIMIT;
        }

        if self.query.max_buckets == 0 {
            anyhow::bail!("Configuration error: query.max_buckets must be at least 1");
        }
        if self.query.max_buckets > QUERY_MAX_BUCKETS {
            tracing::warn!(
                configured = self.query.max_buckets,
                max = QUERY_MAX_BUCKETS,
                "query.max_buckets exceeds the hard ceiling, clamping"
            );
            self.query.max_buckets = QUERY_MAX_BUCKETS;
        }

        // PostgreSQL URL required when using Postgres backend
        if self.database.analytics == AnalyticsBackend::Postgres
            && self
                .database
                .postgres
                .as_ref()
                .is_none_or(|pg| pg.url.is_empty())
        {
            anyhow::bail!(
                "Configuration error: database.postgres.url is required when database.analytics is 'postgres'. \
                 Set via TRACELENS_POSTGRES_URL env var or database.postgres.url in config file."
            );
        }

        // ClickHouse URL required when using ClickHouse backend
        if self.database.analytics == AnalyticsBackend::Clickhouse
            && self
                .database
                .clickhouse
                .as_ref()
                .is_none_or(|ch| ch.url.is_empty())
        {
            anyhow::bail!(
                "Configuration error: database.clickhouse.url is required when database.analytics is 'clickhouse'. \
                 Set via TRACELENS_CLICKHOUSE_URL env var or database.clickhouse.url in config file."
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.tracelens/tracelens.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
