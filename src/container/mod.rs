//! Dependency container subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     register::<T>()            → type registry (constructible types)
//!     bind / bind_singleton       → binding table (abstract id → factory)
//!     load_bindings(config)       → binding table (config-declared)
//!
//! Per request:
//!     handler parameters
//!     → autowire.rs (walk declared parameters)
//!     → container.rs (binding lookup, direct construction, recursion)
//!     → Args (ordered, named instances)
//! ```
//!
//! # Design Decisions
//! - Bindings are built lazily; a singleton factory runs at most once
//! - Types declare their constructor parameters through [`Injectable`] instead of
//!   being reflected at runtime
//! - Container is populated at startup and shared read-only afterwards
//! - Scalar parameters are skipped or rejected according to [`AutowirePolicy`]

pub mod autowire;
pub mod binding;
#[allow(clippy::module_inception)]
pub mod container;

pub use autowire::{
    key_of, Args, AutowirePolicy, Injectable, ParamKind, Parameter, TypeDescriptor,
};
pub use binding::{Binding, Instance, Lifetime};
pub use container::{Container, ContainerError};
