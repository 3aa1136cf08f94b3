//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     router.get/post/... or attributes.rs (declared routes)
//!     → route.rs (compile path via matcher.rs)
//!     → appended to the table; order = priority
//!
//! Per request:
//!     Request (method, base uri)
//!     → router.rs: exact method+path lookup, then any-method lookup
//!     → 405 / HEAD empty body / 404, or the matched Route + captures
//!     → middleware chain
//!     → action.rs: handler closure or controller method, args autowired
//!     → Output (JSON serialized here)
//! ```
//!
//! # Design Decisions
//! - Routes are immutable once serving; captures are returned, never stored
//! - Regex paths, case-insensitive and anchored, with a literal fast path
//! - First match wins (registration order)

pub mod action;
pub mod attributes;
pub mod matcher;
pub mod route;
pub mod router;

pub use action::{Action, Controller, ControllerAction, Handler, HandlerFuture};
pub use attributes::{Routable, RouteAttribute};
pub use matcher::PathPattern;
pub use route::{Route, RouteMatch};
pub use router::{RouteBuilder, Router};
