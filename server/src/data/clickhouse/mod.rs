//! ClickHouse analytics service
//!
//! Runs analytical queries over the HTTP interface. The clickhouse crate's
//! `Client` pools connections via HTTP keep-alive, so one client is shared by
//! all requests.

mod executor;

use clickhouse::Client;

use crate::core::config::ClickhouseConfig;
use crate::core::constants::CLICKHOUSE_DEFAULT_TIMEOUT_SECS;
use crate::data::error::DataError;

/// ClickHouse analytics service
pub struct ClickhouseService {
    client: Client,
    timeout_secs: u64,
}

impl ClickhouseService {
    /// Initialize the analytics service with ClickHouse connection
    ///
    /// Server settings applied to every query:
    /// - `join_use_nulls` so unmatched LEFT JOIN rows read as NULL
    /// - 64-bit integers as JSON numbers
    /// - ISO 8601 timestamps
    /// - `max_execution_time` mirroring the client-side timeout
    pub async fn init(config: &ClickhouseConfig) -> Result<Self, DataError> {
        if config.url.is_empty() {
            return Err(DataError::Config("ClickHouse URL is required".into()));
        }

        let timeout_secs = if config.timeout_secs > 0 {
            config.timeout_secs
        } else {
            CLICKHOUSE_DEFAULT_TIMEOUT_SECS
        };

        let mut client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_compression(clickhouse::Compression::Lz4);

        if let Some(ref user) = config.user {
            client = client.with_user(user);
        }
        if let Some(ref password) = config.password {
            client = client.with_password(password);
        }

        client = client
            .with_option("join_use_nulls", "1")
            .with_option("output_format_json_quote_64bit_integers", "0")
            .with_option("date_time_output_format", "iso")
            .with_option("max_execution_time", timeout_secs.to_string());

        tracing::debug!(
            url = %config.url,
            database = %config.database,
            timeout_secs,
            "ClickhouseService initialized"
        );

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Get the ClickHouse client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Close the connection gracefully (no-op for ClickHouse HTTP client)
    pub async fn close(&self) {
        tracing::debug!("ClickHouse connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_requires_url() {
        let config = ClickhouseConfig {
            url: String::new(),
            ..Default::default()
        };
        let err = ClickhouseService::init(&config).await.err().unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }

    #[tokio::test]
    async fn test_init_applies_default_timeout() {
        let config = ClickhouseConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        let service = ClickhouseService::init(&config).await.unwrap();
        assert_eq!(service.timeout_secs, CLICKHOUSE_DEFAULT_TIMEOUT_SECS);
    }
}
