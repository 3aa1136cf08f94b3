//! Route actions: handler closures and controller methods.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::container::{Args, Container, ContainerError, Injectable, Parameter};
use crate::error::DispatchError;
use crate::http::Output;
use crate::middleware::ControllerMiddleware;

/// Future returned by a handler.
pub type HandlerFuture = BoxFuture<'static, Result<Output, DispatchError>>;

type HandlerFn = Arc<dyn Fn(Args) -> HandlerFuture + Send + Sync>;

/// A closure action with its declared parameters.
#[derive(Clone)]
pub struct Handler {
    parameters: Vec<Parameter>,
    func: HandlerFn,
}

impl Handler {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Output, DispatchError>> + Send + 'static,
    {
        Self {
            parameters: Vec::new(),
            func: Arc::new(move |args| -> HandlerFuture { Box::pin(func(args)) }),
        }
    }

    /// Declare the parameters the container should resolve for each call.
    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn call(&self, args: Args) -> HandlerFuture {
        (self.func)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A type whose methods serve routes.
///
/// Controllers are built through the container for every dispatch, so their
/// constructor dependencies are autowired.
#[async_trait]
pub trait Controller: Injectable {
    /// Middleware declared by the controller, optionally limited to some actions.
    fn middleware(&self) -> Vec<ControllerMiddleware> {
        Vec::new()
    }

    /// Parameters of `action`, or `None` if the controller has no such action.
    fn action_parameters(action: &str) -> Option<Vec<Parameter>>;

    /// Invoke `action` with autowired arguments followed by path captures.
    async fn call(self: Arc<Self>, action: String, args: Args) -> Result<Output, DispatchError>;
}

/// Object-safe view of a built controller.
#[async_trait]
pub(crate) trait DynController: Send + Sync {
    fn middleware(&self) -> Vec<ControllerMiddleware>;

    async fn invoke(self: Arc<Self>, action: String, args: Args) -> Result<Output, DispatchError>;
}

#[async_trait]
impl<C: Controller> DynController for C {
    fn middleware(&self) -> Vec<ControllerMiddleware> {
        Controller::middleware(self)
    }

    async fn invoke(self: Arc<Self>, action: String, args: Args) -> Result<Output, DispatchError> {
        Controller::call(self, action, args).await
    }
}

type Instantiate = fn(&Container) -> Result<Arc<dyn DynController>, ContainerError>;

fn instantiate<C: Controller>(
    container: &Container,
) -> Result<Arc<dyn DynController>, ContainerError> {
    container.make::<C>().map(|c| c as Arc<dyn DynController>)
}

/// A `(controller type, action name)` pair.
#[derive(Clone)]
pub struct ControllerAction {
    controller: &'static str,
    action: String,
    instantiate: Instantiate,
    parameters: fn(&str) -> Option<Vec<Parameter>>,
}

impl ControllerAction {
    pub fn new<C: Controller>(action: impl Into<String>) -> Self {
        Self {
            controller: C::type_key(),
            action: action.into(),
            instantiate: instantiate::<C>,
            parameters: C::action_parameters,
        }
    }

    pub fn controller(&self) -> &'static str {
        self.controller
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// Declared parameters of the action; `None` if the action does not exist.
    pub fn parameters(&self) -> Option<Vec<Parameter>> {
        (self.parameters)(&self.action)
    }

    pub(crate) fn instantiate(
        &self,
        container: &Container,
    ) -> Result<Arc<dyn DynController>, ContainerError> {
        (self.instantiate)(container)
    }
}

impl fmt::Debug for ControllerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// What a route runs.
#[derive(Clone)]
pub enum Action {
    Handler(Handler),
    Controller(ControllerAction),
}

impl Action {
    /// A closure action without declared parameters.
    pub fn handler<F, Fut>(func: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Output, DispatchError>> + Send + 'static,
    {
        Action::Handler(Handler::new(func))
    }

    pub fn controller<C: Controller>(action: impl Into<String>) -> Self {
        Action::Controller(ControllerAction::new::<C>(action))
    }

    /// Short description for route listings.
    pub fn describe(&self) -> String {
        match self {
            Action::Handler(_) => "closure".to_string(),
            Action::Controller(c) => format!("{c:?}"),
        }
    }
}

impl From<Handler> for Action {
    fn from(handler: Handler) -> Self {
        Action::Handler(handler)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Handler(h) => h.fmt(f),
            Action::Controller(c) => c.fmt(f),
        }
    }
}
