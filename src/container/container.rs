//! The dependency container.
//!
//! # Responsibilities
//! - Map abstract identifiers (and aliases) to bindings
//! - Resolve identifiers to instances, constructing zero-argument types directly
//! - Keep a registry of constructible types for config-driven bindings
//! - Detect resolution cycles
//!
//! # Design Decisions
//! - `DashMap` tables; a map guard is never held while a factory runs, so
//!   factories may resolve or bind re-entrantly
//! - Cycle detection uses a per-thread resolution stack (resolution is synchronous)

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use super::autowire::{AutowirePolicy, Injectable, TypeDescriptor};
use super::binding::{Binding, Factory, Instance, Lifetime};
use crate::config::BindingConfig;

/// Errors raised while resolving dependencies.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unresolved dependency: {0}")]
    UnresolvedDependency(String),

    #[error("circular dependency: {chain}")]
    CircularDependency { chain: String },

    #[error("dependency {id} is not a {expected}")]
    TypeMismatch { id: String, expected: &'static str },

    #[error("factory for {id} failed: {message}")]
    Factory { id: String, message: String },
}

/// What a resolution stack entry is doing with its identifier.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Looking up a binding or registered type.
    Resolve,
    /// Autowiring and constructing a type descriptor.
    Build,
}

thread_local! {
    static RESOLVING: RefCell<Vec<(Step, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an identifier as being resolved or built on this thread until dropped.
///
/// A binding whose factory builds the type it is bound under re-enters the same
/// key in a different step, which is not a cycle.
pub(crate) struct ResolutionGuard;

impl ResolutionGuard {
    pub(crate) fn enter(id: &str) -> Result<Self, ContainerError> {
        Self::push(Step::Resolve, id)
    }

    pub(crate) fn enter_build(key: &str) -> Result<Self, ContainerError> {
        Self::push(Step::Build, key)
    }

    fn push(step: Step, id: &str) -> Result<Self, ContainerError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(s, entry)| *s == step && entry == id) {
                let mut chain: Vec<&str> = Vec::with_capacity(stack.len() + 1);
                for (_, entry) in stack.iter() {
                    if chain.last() != Some(&entry.as_str()) {
                        chain.push(entry);
                    }
                }
                chain.push(id);
                return Err(ContainerError::CircularDependency {
                    chain: chain.join(" -> "),
                });
            }
            stack.push((step, id.to_string()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

pub(crate) fn downcast<T: Any + Send + Sync>(
    id: &str,
    instance: Instance,
) -> Result<Arc<T>, ContainerError> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            id: id.to_string(),
            expected: type_name::<T>(),
        })
}

/// Binding table, alias table and type registry.
#[derive(Debug, Default)]
pub struct Container {
    bindings: DashMap<String, Arc<Binding>>,
    aliases: DashMap<String, String>,
    types: DashMap<String, TypeDescriptor>,
    policy: AutowirePolicy,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AutowirePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> AutowirePolicy {
        self.policy
    }

    /// Register a transient binding.
    pub fn bind<T, F>(&self, abstract_id: impl Into<String>, factory: F) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.bind_with(abstract_id, None, Lifetime::Transient, factory)
    }

    /// Register a singleton binding.
    pub fn bind_singleton<T, F>(&self, abstract_id: impl Into<String>, factory: F) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.bind_with(abstract_id, None, Lifetime::Singleton, factory)
    }

    /// Register a binding with an optional alias. Re-binding replaces the
    /// previous binding and drops its cached instance.
    pub fn bind_with<T, F>(
        &self,
        abstract_id: impl Into<String>,
        alias: Option<&str>,
        lifetime: Lifetime,
        factory: F,
    ) -> &Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |container: &Container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        });
        self.insert(abstract_id.into(), alias, Binding::new(factory, lifetime))
    }

    /// Bind `abstract_id` to the autowired construction of `T`.
    pub fn bind_type<T: Injectable>(
        &self,
        abstract_id: impl Into<String>,
        alias: Option<&str>,
        lifetime: Lifetime,
    ) -> &Self {
        self.bind_descriptor(abstract_id.into(), alias, lifetime, TypeDescriptor::of::<T>())
    }

    fn bind_descriptor(
        &self,
        abstract_id: String,
        alias: Option<&str>,
        lifetime: Lifetime,
        descriptor: TypeDescriptor,
    ) -> &Self {
        let factory: Factory =
            Arc::new(move |container: &Container| container.build_descriptor(&descriptor));
        self.insert(abstract_id, alias, Binding::new(factory, lifetime))
    }

    /// Register an already-built singleton.
    pub fn instance<T: Any + Send + Sync>(
        &self,
        abstract_id: impl Into<String>,
        value: T,
    ) -> &Self {
        self.insert(
            abstract_id.into(),
            None,
            Binding::prebuilt(Arc::new(value) as Instance),
        )
    }

    /// Make `alias` resolve to `abstract_id`.
    pub fn alias(&self, alias: impl Into<String>, abstract_id: impl Into<String>) -> &Self {
        self.aliases.insert(alias.into(), abstract_id.into());
        self
    }

    fn insert(&self, id: String, alias: Option<&str>, binding: Binding) -> &Self {
        tracing::debug!(
            id = %id,
            lifetime = ?binding.lifetime(),
            alias = ?alias,
            "Binding registered"
        );
        if let Some(alias) = alias {
            self.alias(alias, id.clone());
        }
        self.bindings.insert(id, Arc::new(binding));
        self
    }

    /// Record a constructible type under its type key.
    pub fn register<T: Injectable>(&self) -> &Self {
        self.types
            .insert(T::type_key().to_string(), TypeDescriptor::of::<T>());
        self
    }

    /// Record a constructible type under its type key and a short name.
    pub fn register_as<T: Injectable>(&self, name: impl Into<String>) -> &Self {
        self.types.insert(name.into(), TypeDescriptor::of::<T>());
        self.register::<T>()
    }

    /// Registered descriptor for a type key or short name.
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        self.types.get(name).map(|entry| *entry.value())
    }

    fn canonical(&self, id: &str) -> String {
        self.aliases
            .get(id)
            .map(|target| target.value().clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// True if a binding (directly or through an alias) exists.
    pub fn is_bound(&self, id: &str) -> bool {
        self.bindings.contains_key(&self.canonical(id))
    }

    /// Resolve an identifier to an instance.
    ///
    /// Bound identifiers use their binding. Unbound identifiers naming a
    /// registered type without required constructor parameters are built
    /// directly. Anything else is an [`ContainerError::UnresolvedDependency`].
    pub fn resolve(&self, id: &str) -> Result<Instance, ContainerError> {
        let id = self.canonical(id);
        let _guard = ResolutionGuard::enter(&id)?;

        let binding = self.bindings.get(&id).map(|entry| Arc::clone(entry.value()));
        if let Some(binding) = binding {
            tracing::trace!(id = %id, "Resolving from binding");
            return binding.instance(self);
        }

        match self.descriptor(&id) {
            Some(descriptor) if descriptor.required_parameters() == 0 => {
                tracing::trace!(id = %id, "Constructing unbound type");
                descriptor.construct(&mut Default::default())
            }
            _ => Err(ContainerError::UnresolvedDependency(id)),
        }
    }

    /// Typed [`resolve`](Self::resolve).
    pub fn get<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.resolve(id)?;
        downcast(id, instance)
    }

    /// Use the binding for `T` if there is one, otherwise autowire it.
    pub fn make<T: Injectable>(&self) -> Result<Arc<T>, ContainerError> {
        if self.is_bound(T::type_key()) {
            self.get(T::type_key())
        } else {
            self.build::<T>()
        }
    }

    /// Returns whether `id` resolves. Only an unresolved dependency counts as
    /// "absent"; every other failure is returned.
    pub fn has(&self, id: &str) -> Result<bool, ContainerError> {
        match self.resolve(id) {
            Ok(_) => Ok(true),
            Err(ContainerError::UnresolvedDependency(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Delete a binding and every alias pointing at it.
    pub fn remove(&self, id: &str) -> Result<(), ContainerError> {
        let id = self.canonical(id);
        self.bindings
            .remove(&id)
            .ok_or_else(|| ContainerError::UnresolvedDependency(id.clone()))?;
        self.aliases.retain(|_, target| *target != id);
        tracing::debug!(id = %id, "Binding removed");
        Ok(())
    }

    /// Bulk-load bindings declared in configuration. Each `object` must name a
    /// registered type.
    pub fn load_bindings(
        &self,
        bindings: &BTreeMap<String, BindingConfig>,
    ) -> Result<(), ContainerError> {
        for (abstract_id, binding) in bindings {
            let descriptor = self
                .descriptor(&binding.object)
                .ok_or_else(|| ContainerError::UnresolvedDependency(binding.object.clone()))?;
            self.bind_descriptor(
                abstract_id.clone(),
                binding.prop.as_deref(),
                Lifetime::from_once(binding.once),
                descriptor,
            );
        }
        Ok(())
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
