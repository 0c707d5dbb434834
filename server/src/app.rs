//! Core application

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::{AnalyticsBackend, AppConfig, DatabaseConfig};
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::AnalyticsService;
use crate::domain::query::{QueryRequest, QueryService, SchemaRegistry, compile_request};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub analytics: Arc<AnalyticsService>,
    pub query: QueryService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Explain {
                file,
                project,
                dialect,
            }) => {
                let config = AppConfig::load(&cli_config)?;
                let output = explain(&config, &read_source(&file)?, &project, dialect)?;
                println!("{}", output);
                Ok(())
            }
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_server(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        Self::from_config(config).await
    }

    /// Build the app from an already-merged configuration
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let analytics = Arc::new(
            AnalyticsService::init(&config.database)
                .await
                .context("Failed to initialize analytics database")?,
        );

        let registry = Arc::new(SchemaRegistry::builtin());
        let query = QueryService::new(registry, analytics.executor(), config.query);
        let shutdown = ShutdownService::new(analytics.clone());

        tracing::debug!(backend = %analytics.backend(), "Analytics initialized");

        Ok(Self {
            shutdown,
            config,
            analytics,
            query,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            app.analytics.backend(),
            &store_label(&app.config.database),
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}

/// Short, credential-free description of the configured store
fn store_label(config: &DatabaseConfig) -> String {
    match config.analytics {
        AnalyticsBackend::Duckdb => config
            .duckdb
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-memory".to_string()),
        AnalyticsBackend::Postgres => config
            .postgres
            .as_ref()
            .map(|pg| format!("pool of {}", pg.max_connections))
            .unwrap_or_default(),
        AnalyticsBackend::Clickhouse => config
            .clickhouse
            .as_ref()
            .map(|ch| ch.database.clone())
            .unwrap_or_default(),
    }
}

/// Read a query description from a file, or stdin for `-`
fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Compile a query description and render it as pretty JSON
fn explain(
    config: &AppConfig,
    source: &str,
    project: &str,
    dialect: Option<AnalyticsBackend>,
) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(source).context("Query description is not valid JSON")?;
    let request = QueryRequest::from_value(value)?;
    let backend = dialect.unwrap_or(config.database.analytics).backend();

    let registry = SchemaRegistry::builtin();
    let compiled = compile_request(&registry, config.query, backend, project, &request)?;
    Ok(serde_json::to_string_pretty(&compiled)?)
}
