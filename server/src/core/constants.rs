// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Tracelens";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "tracelens";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".tracelens";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "tracelens.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TRACELENS_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "TRACELENS_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "TRACELENS_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TRACELENS_LOG";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default body limit for API requests (1MB)
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for analytics backend (duckdb, postgres, clickhouse)
pub const ENV_ANALYTICS_BACKEND: &str = "TRACELENS_ANALYTICS_BACKEND";

/// Environment variable for DuckDB database file
pub const ENV_DUCKDB_PATH: &str = "TRACELENS_DUCKDB_PATH";

/// Environment variable for PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "TRACELENS_POSTGRES_URL";

/// Environment variable for ClickHouse HTTP URL
pub const ENV_CLICKHOUSE_URL: &str = "TRACELENS_CLICKHOUSE_URL";

/// Environment variable for ClickHouse database
pub const ENV_CLICKHOUSE_DATABASE: &str = "TRACELENS_CLICKHOUSE_DATABASE";

/// Environment variable for ClickHouse user
pub const ENV_CLICKHOUSE_USER: &str = "TRACELENS_CLICKHOUSE_USER";

/// Environment variable for ClickHouse password
pub const ENV_CLICKHOUSE_PASSWORD: &str = "TRACELENS_CLICKHOUSE_PASSWORD";

// =============================================================================
// DuckDB Settings
// =============================================================================

/// Query timeout for DuckDB operations (prevents runaway queries)
pub const DUCKDB_QUERY_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// PostgreSQL Settings
// =============================================================================

/// Default max connections in the pool
pub const POSTGRES_DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Connections kept warm
pub const POSTGRES_DEFAULT_MIN_CONNECTIONS: u32 = 2;

/// Timeout waiting for a pooled connection
pub const POSTGRES_DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Server-side statement timeout
pub const POSTGRES_DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// ClickHouse Settings
// =============================================================================

/// Default ClickHouse HTTP endpoint
pub const CLICKHOUSE_DEFAULT_URL: &str = "http://localhost:8123";

/// Default ClickHouse database
pub const CLICKHOUSE_DEFAULT_DATABASE: &str = "tracelens";

/// Query timeout for ClickHouse
pub const CLICKHOUSE_DEFAULT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Query Builder
// =============================================================================

/// Environment variable for the configurable page size ceiling
pub const ENV_QUERY_MAX_LIMIT: &str = "TRACELENS_QUERY_MAX_LIMIT";

/// Rows per page when the caller sets no limit
pub const QUERY_DEFAULT_LIMIT: i64 = 100;

/// Hard ceiling for `limit`, configuration cannot exceed it
pub const QUERY_MAX_LIMIT: i64 = 10_000;

/// Maximum number of time buckets in one query
pub const QUERY_MAX_BUCKETS: usize = 1000;

/// Output column name of the time dimension
pub const TIME_DIMENSION_ALIAS: &str = "time_dimension";

/// Inner column name of the truncated timestamp in zero-filled queries
pub const TIME_BUCKET_ALIAS: &str = "time_bucket";

// =============================================================================
// Shutdown
// =============================================================================

/// Upper bound for closing store connections on shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
