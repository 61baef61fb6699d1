//! Configuration module for the chime runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging, prefixes, operators, storage and the pipeline.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, PROFILE_ENV};
pub use schema::{
    CacheMode, ChimeConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    OperatorConfig, PipelineConfig, PrefixConfig, SpanEventConfig, StorageBackend, StorageConfig,
};
pub use validation::validate_config;
