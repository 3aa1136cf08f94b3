//! Named middleware aliases.
//!
//! Routes and configuration refer to middleware by name; the registry turns a
//! name into an instance by autowiring the middleware type through the
//! container.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::Middleware;
use crate::container::{Container, ContainerError, Injectable};

type MiddlewareFactory =
    Arc<dyn Fn(&Container) -> Result<Arc<dyn Middleware>, ContainerError> + Send + Sync>;

/// Alias table for middleware.
#[derive(Default, Clone)]
pub struct MiddlewareRegistry {
    factories: HashMap<String, MiddlewareFactory>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `M` under `name`; instances are produced with
    /// [`Container::make`].
    pub fn register<M>(&mut self, name: impl Into<String>) -> &mut Self
    where
        M: Middleware + Injectable,
    {
        self.register_with(name, |container: &Container| {
            container.make::<M>().map(|m| m as Arc<dyn Middleware>)
        })
    }

    /// Register a custom factory under `name`.
    pub fn register_with<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Container) -> Result<Arc<dyn Middleware>, ContainerError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Instantiate the middleware registered as `name`.
    pub fn make(
        &self,
        name: &str,
        container: &Container,
    ) -> Result<Arc<dyn Middleware>, ContainerError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ContainerError::UnresolvedDependency(name.to_string()))?;
        factory(container)
    }
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareRegistry")
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Args, Parameter};
    use crate::error::DispatchError;
    use crate::http::Request;
    use crate::middleware::Flow;
    use async_trait::async_trait;

    struct Token(&'static str);

    impl Injectable for Token {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Token("secret"))
        }
    }

    struct RequireToken {
        token: Arc<Token>,
    }

    impl Injectable for RequireToken {
        fn parameters() -> Vec<Parameter> {
            vec![Parameter::service::<Token>("token")]
        }

        fn construct(args: &mut Args) -> Result<Self, ContainerError> {
            Ok(RequireToken {
                token: args.get("token")?,
            })
        }
    }

    #[async_trait]
    impl Middleware for RequireToken {
        async fn execute(&self, request: &Request) -> Result<Flow, DispatchError> {
            if request.header("authorization") == Some(self.token.0) {
                Ok(Flow::Continue)
            } else {
                Err(DispatchError::http(401, "unauthorized"))
            }
        }
    }

    #[test]
    fn test_make_autowires_registered_middleware() {
        let container = Container::new();
        let mut registry = MiddlewareRegistry::new();
        registry.register::<RequireToken>("auth");

        assert!(registry.contains("auth"));
        let middleware = registry.make("auth", &container).unwrap();
        assert!(middleware.name().ends_with("RequireToken"));
    }

    #[test]
    fn test_unknown_name_is_unresolved() {
        let container = Container::new();
        let registry = MiddlewareRegistry::new();
        let err = registry.make("auth", &container).err().unwrap();
        assert!(matches!(err, ContainerError::UnresolvedDependency(ref n) if n == "auth"));
    }
}
