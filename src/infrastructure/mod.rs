//! Infrastructure - everything around the matching core
//!
//! This module contains:
//! - Configuration management
//! - Logging
//! - Cycle metrics

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{ArbConfig, Config, ConfigError, LoggingConfig, VenueConfig};
pub use metrics::{MetricsCollector, MetricsSnapshot};
