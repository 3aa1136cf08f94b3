//! Request dispatch core.
//!
//! Routes HTTP requests to handler closures or controller methods, runs
//! middleware ahead of them and autowires their dependencies from a typed
//! container.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                    REQUEST DISPATCH                       │
//!                 │                                                           │
//!  Client Request │  ┌─────────┐    ┌──────────┐    ┌───────────────────┐    │
//!  ───────────────┼─▶│  http   │───▶│ request  │───▶│  routing::Router  │    │
//!                 │  │ server  │    │normalize │    │  find + 404/405   │    │
//!                 │  └─────────┘    └──────────┘    └─────────┬─────────┘    │
//!                 │                                           │              │
//!                 │                                           ▼              │
//!                 │                                 ┌───────────────────┐    │
//!                 │                                 │    middleware     │    │
//!                 │                                 │ global→route→ctrl │    │
//!                 │                                 └─────────┬─────────┘    │
//!                 │                                           ▼              │
//!  Client Response│  ┌─────────┐    ┌──────────┐    ┌───────────────────┐    │
//!  ◀──────────────┼──│response │◀───│  output  │◀───│ action + autowire │    │
//!                 │  │ render  │    │ (JSON…)  │    │    (container)    │    │
//!                 │  └─────────┘    └──────────┘    └───────────────────┘    │
//!                 │                                                           │
//!                 │  Cross-cutting: config · lifecycle · observability        │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod container;
pub mod http;
pub mod middleware;
pub mod routing;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub mod demo;

pub use config::AppConfig;
pub use container::{Container, ContainerError, Injectable};
pub use error::{DispatchError, RouteError};
pub use http::{HttpServer, Method, Output, Request, Response};
pub use lifecycle::{Application, Shutdown};
pub use middleware::{Flow, Middleware};
pub use routing::{Action, Controller, Router};
