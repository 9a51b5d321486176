//! Persistence core for the versioned sample aggregate.
//! This crate is the single source of truth for its consistency rules.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{AppConfig, ConfigError};
pub use db::{Database, DbError};
pub use error::{ErrorResponse, SampleError, SampleResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::page::{Page, PageRequest, Seek, SeekRequest};
pub use model::sample::{Sample, SampleId, SampleRequest, Translation};
pub use repo::sample_repo::{SampleRepository, SqliteSampleRepository};
pub use service::sample_service::SampleService;
pub use validation::{validate, Validate};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
