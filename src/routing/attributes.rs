//! Declarative route attributes.
//!
//! A controller (or a standalone handler) declares `{method, path, name}`
//! attributes; [`Router::auto_register`](super::Router::auto_register) turns each
//! attribute into one route.

use crate::http::Method;

/// One routing declaration attached to a controller action or handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAttribute {
    method: Method,
    path: String,
    name: Option<String>,
    action: Option<String>,
}

impl RouteAttribute {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            name: None,
            action: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Controller action the attribute is attached to.
    pub fn on(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }
}

/// A controller that declares its own routes.
pub trait Routable {
    fn route_attributes() -> Vec<RouteAttribute>;
}
