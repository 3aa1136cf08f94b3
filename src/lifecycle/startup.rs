//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the container from configuration (policy, bindings)
//! - Register middleware aliases and routes
//! - Produce an immutable [`Application`] shared by the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Ordered: types, bindings, middleware aliases, global middleware, routes
//! - Nothing is global; the application context is passed explicitly

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::container::{AutowirePolicy, Container, ContainerError, Injectable};
use crate::error::RouteError;
use crate::middleware::Middleware;
use crate::routing::Router;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("container setup failed: {0}")]
    Container(#[from] ContainerError),

    #[error("route setup failed: {0}")]
    Route(#[from] RouteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("metrics setup failed: {0}")]
    Metrics(String),
}

type RouteSetup = Box<dyn FnOnce(&mut Router) -> Result<(), RouteError>>;
type AliasSetup = Box<dyn FnOnce(&mut Router)>;

/// The assembled application: configuration, container and route table.
#[derive(Debug, Clone)]
pub struct Application {
    config: Arc<AppConfig>,
    container: Arc<Container>,
    router: Arc<Router>,
}

impl Application {
    pub fn builder(config: AppConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }
}

/// Collects registrations and applies them in startup order.
pub struct ApplicationBuilder {
    config: AppConfig,
    container: Arc<Container>,
    aliases: Vec<AliasSetup>,
    routes: Vec<RouteSetup>,
}

impl ApplicationBuilder {
    pub fn new(config: AppConfig) -> Self {
        let policy = AutowirePolicy::from_strict(config.container.strict_autowiring);
        Self {
            config,
            container: Arc::new(Container::with_policy(policy)),
            aliases: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// The container, for explicit bindings.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Make `T` constructible by configured bindings under its type key.
    pub fn register_type<T: Injectable>(self) -> Self {
        self.container.register::<T>();
        self
    }

    /// Make `T` constructible by configured bindings under `name`.
    pub fn register_type_as<T: Injectable>(self, name: &str) -> Self {
        self.container.register_as::<T>(name);
        self
    }

    /// Register the middleware alias `name`.
    pub fn middleware<M>(mut self, name: &str) -> Self
    where
        M: Middleware + Injectable,
    {
        let name = name.to_string();
        self.aliases.push(Box::new(move |router: &mut Router| {
            router.register_middleware::<M>(name);
        }));
        self
    }

    /// Add routes. Runs after bindings and middleware aliases are in place.
    pub fn routes<F>(mut self, setup: F) -> Self
    where
        F: FnOnce(&mut Router) -> Result<(), RouteError> + 'static,
    {
        self.routes.push(Box::new(setup));
        self
    }

    pub fn build(self) -> Result<Application, StartupError> {
        let Self {
            config,
            container,
            aliases,
            routes,
        } = self;

        container.load_bindings(&config.bindings)?;

        let mut router =
            Router::new(Arc::clone(&container)).with_pretty_json(!config.app.is_production());
        for alias in aliases {
            alias(&mut router);
        }
        router.set_global_middleware(&config.middleware.global)?;
        for setup in routes {
            setup(&mut router)?;
        }

        tracing::info!(
            app = %config.app.name,
            environment = %config.app.environment,
            bindings = container.len(),
            routes = router.routes().len(),
            global_middleware = router.global_middleware().len(),
            "Application assembled"
        );

        Ok(Application {
            config: Arc::new(config),
            container,
            router: Arc::new(router),
        })
    }
}
