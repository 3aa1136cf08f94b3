//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     registry.rs: alias → factory (autowired through the container)
//!     config `middleware.global` + route `.middleware([...])` → instances
//!
//! Per request (after a route matched):
//!     chain.rs: global ++ route ++ controller (allow-list filtered)
//!     → execute in order
//!     → Flow::Continue: next middleware, then the handler
//!     → Flow::Respond(output): stop, output becomes the response
//! ```
//!
//! # Design Decisions
//! - Chains are rebuilt per request and never cached
//! - Global middleware always runs, whatever the controller declares
//! - Short-circuiting is a value (`Flow::Respond`), not an error

pub mod chain;
pub mod registry;

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::http::{Output, Request};

pub use chain::{ControllerMiddleware, MiddlewareChain, Scope};
pub use registry::MiddlewareRegistry;

/// Outcome of running one middleware.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Hand the request to the next middleware or the handler.
    Continue,
    /// Stop; the output is the response.
    Respond(Output),
}

impl Flow {
    pub fn respond(output: impl Into<Output>) -> Self {
        Flow::Respond(output.into())
    }
}

/// Pre-handler logic that may let a request through or answer it.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn execute(&self, request: &Request) -> Result<Flow, DispatchError>;
}
