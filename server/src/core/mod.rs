//! Core application infrastructure

pub(crate) mod banner;
pub mod cli;
pub mod config;
pub mod constants;
pub mod shutdown;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AnalyticsBackend, AppConfig, DatabaseConfig, ServerConfig};
pub use shutdown::ShutdownService;

// Re-export service enum from data layer
pub use crate::data::AnalyticsService;
