//! Binding table entries.
//!
//! # Responsibilities
//! - Hold the factory registered for an abstract identifier
//! - Cache the instance of singleton bindings
//!
//! # Design Decisions
//! - Factories are invoked on first resolution, never at bind time
//! - Singleton initialization is race-free: concurrent first resolutions
//!   block on the same cell and observe one instance

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::container::{Container, ContainerError};

/// A type-erased, shareable service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erased factory producing an instance from the container.
pub(crate) type Factory = Arc<dyn Fn(&Container) -> Result<Instance, ContainerError> + Send + Sync>;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per container, created on first resolution.
    Singleton,
    /// A fresh instance on every resolution.
    Transient,
}

impl Lifetime {
    /// Map the config-level `once` flag onto a lifetime.
    pub fn from_once(once: bool) -> Self {
        if once {
            Lifetime::Singleton
        } else {
            Lifetime::Transient
        }
    }
}

/// A registered factory plus its cached singleton instance.
pub struct Binding {
    factory: Factory,
    lifetime: Lifetime,
    cached: OnceCell<Instance>,
}

impl Binding {
    pub(crate) fn new(factory: Factory, lifetime: Lifetime) -> Self {
        Self {
            factory,
            lifetime,
            cached: OnceCell::new(),
        }
    }

    /// A singleton binding whose instance already exists.
    pub(crate) fn prebuilt(instance: Instance) -> Self {
        let factory_instance = Arc::clone(&instance);
        Self {
            factory: Arc::new(move |_: &Container| Ok(Arc::clone(&factory_instance))),
            lifetime: Lifetime::Singleton,
            cached: OnceCell::with_value(instance),
        }
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns true once a singleton instance has been produced.
    pub fn is_cached(&self) -> bool {
        self.cached.get().is_some()
    }

    /// Produce the instance for this binding.
    pub(crate) fn instance(&self, container: &Container) -> Result<Instance, ContainerError> {
        match self.lifetime {
            Lifetime::Singleton => self
                .cached
                .get_or_try_init(|| (self.factory)(container))
                .map(Arc::clone),
            Lifetime::Transient => (self.factory)(container),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("lifetime", &self.lifetime)
            .field("cached", &self.is_cached())
            .finish_non_exhaustive()
    }
}
