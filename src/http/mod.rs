//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, timeout, limits)
//!     → request.rs (normalize method, path, query, body)
//!     → routing::Router::resolve
//!     → output.rs (what the handler produced)
//!     → response.rs (status + headers + output → transport response)
//! ```

pub mod method;
pub mod output;
pub mod request;
pub mod response;
pub mod server;

pub use method::Method;
pub use output::Output;
pub use request::{InputSource, Request, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
