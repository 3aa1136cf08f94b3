//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! application. All types derive Serde traits for deserialization from config
//! files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, limits).
    pub listener: ListenerConfig,

    /// Application identity and environment.
    pub app: AppSection,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Middleware applied to every route.
    pub middleware: MiddlewareConfig,

    /// Autowiring behavior.
    pub container: ContainerConfig,

    /// Container bindings keyed by abstract identifier.
    pub bindings: BTreeMap<String, BindingConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent requests (backpressure).
    pub max_connections: usize,

    /// Maximum request body size in bytes.
    pub body_limit: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
            body_limit: 2 * 1024 * 1024,
        }
    }
}

/// Application section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,

    /// `production` disables pretty-printed JSON.
    pub environment: String,
}

impl AppSection {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "request-dispatch".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Global middleware, by registered alias, in execution order.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub global: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContainerConfig {
    /// Fail on constructor parameters the container cannot produce instead
    /// of skipping them.
    pub strict_autowiring: bool,
}

/// One configured binding.
///
/// ```toml
/// [bindings.db]
/// object = "app::Database"
/// once = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    /// Registered type the binding builds.
    pub object: String,

    /// Optional alias for the same binding.
    #[serde(default)]
    pub prop: Option<String>,

    /// Singleton when true.
    #[serde(default)]
    pub once: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
