//! Infrastructure layer module
//!
//! Cross-cutting concerns that sit outside the domain:
//! - Configuration management (figment: YAML + env overrides)
//! - Logging infrastructure (tracing)

pub mod config;
pub mod logging;
