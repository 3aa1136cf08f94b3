//! A single routable endpoint.

use std::fmt;
use std::sync::Arc;

use super::action::Action;
use super::matcher::PathPattern;
use crate::error::RouteError;
use crate::http::Method;
use crate::middleware::Middleware;

/// Captures produced by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: Vec<Option<String>>,
}

impl RouteMatch {
    /// Captured groups in order; `None` for groups that did not participate.
    pub fn params(&self) -> &[Option<String>] {
        &self.params
    }

    pub fn into_params(self) -> Vec<Option<String>> {
        self.params
    }
}

/// One `method + path → action` registration.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    action: Action,
    name: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    pub fn new(method: Method, path: &str, action: Action) -> Result<Self, RouteError> {
        let pattern = PathPattern::compile(path).map_err(|source| RouteError::InvalidPattern {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            method,
            pattern,
            action,
            name: None,
            middleware: Vec::new(),
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    pub fn push_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Test `candidate` against the route path.
    pub fn matches(&self, candidate: &str) -> Option<RouteMatch> {
        self.pattern
            .matches(candidate)
            .map(|params| RouteMatch { params })
    }

    /// Concrete path with `args` substituted into the capture groups.
    pub fn url(&self, args: &[&str]) -> Result<String, RouteError> {
        self.pattern
            .substitute(args)
            .map_err(|index| RouteError::MissingParameter {
                path: self.path().to_string(),
                index,
            })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path())
            .field("action", &self.action)
            .field("name", &self.name)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
