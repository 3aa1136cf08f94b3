//! Effective middleware chain for one request.

use std::fmt;
use std::sync::Arc;

use super::{Flow, Middleware};
use crate::error::DispatchError;
use crate::http::{Output, Request};

/// Where a chain entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Route,
    Controller,
}

/// Middleware declared by a controller, optionally limited to some actions.
#[derive(Clone)]
pub struct ControllerMiddleware {
    middleware: Arc<dyn Middleware>,
    only: Vec<String>,
}

impl ControllerMiddleware {
    /// Applies to every action of the controller.
    pub fn all(middleware: impl Middleware + 'static) -> Self {
        Self::shared(Arc::new(middleware))
    }

    pub fn shared(middleware: Arc<dyn Middleware>) -> Self {
        Self {
            middleware,
            only: Vec::new(),
        }
    }

    /// Applies only to the listed actions.
    pub fn only<I, S>(middleware: impl Middleware + 'static, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            middleware: Arc::new(middleware),
            only: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// An empty allow-list applies to every action.
    pub fn applies_to(&self, action: &str) -> bool {
        self.only.is_empty() || self.only.iter().any(|a| a == action)
    }
}

impl fmt::Debug for ControllerMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerMiddleware")
            .field("middleware", &self.middleware.name())
            .field("only", &self.only)
            .finish()
    }
}

struct Entry {
    middleware: Arc<dyn Middleware>,
    scope: Scope,
}

/// Ordered, applicability-filtered middleware for one dispatch.
pub struct MiddlewareChain {
    entries: Vec<Entry>,
}

impl MiddlewareChain {
    /// Global first, then route, then the controller's middleware that applies
    /// to `action`. Without an action (plain handlers) controller middleware is
    /// ignored.
    pub fn build(
        global: &[Arc<dyn Middleware>],
        route: &[Arc<dyn Middleware>],
        controller: &[ControllerMiddleware],
        action: Option<&str>,
    ) -> Self {
        let global = global.iter().map(|m| (m, Scope::Global));
        let route = route.iter().map(|m| (m, Scope::Route));
        let controller = controller
            .iter()
            .filter(|cm| action.is_some_and(|a| cm.applies_to(a)))
            .map(|cm| (&cm.middleware, Scope::Controller));

        let entries = global
            .chain(route)
            .chain(controller)
            .map(|(middleware, scope)| Entry {
                middleware: Arc::clone(middleware),
                scope,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names and scopes in execution order.
    pub fn describe(&self) -> Vec<(&str, Scope)> {
        self.entries
            .iter()
            .map(|e| (e.middleware.name(), e.scope))
            .collect()
    }

    /// Run every middleware in order. Returns the output of the first one that
    /// short-circuits, or `None` if all of them let the request through.
    pub async fn run(&self, request: &Request) -> Result<Option<Output>, DispatchError> {
        for entry in &self.entries {
            match entry.middleware.execute(request).await? {
                Flow::Continue => continue,
                Flow::Respond(output) => {
                    tracing::debug!(
                        middleware = entry.middleware.name(),
                        scope = ?entry.scope,
                        "Middleware short-circuited"
                    );
                    return Ok(Some(output));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Record {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        flow: Flow,
    }

    #[async_trait]
    impl Middleware for Record {
        fn name(&self) -> &str {
            self.label
        }

        async fn execute(&self, _: &Request) -> Result<Flow, DispatchError> {
            self.log.lock().unwrap().push(self.label);
            Ok(self.flow.clone())
        }
    }

    fn record(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Record {
        Record {
            label,
            log: log.clone(),
            flow: Flow::Continue,
        }
    }

    #[test]
    fn test_order_is_global_route_controller() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let global: Vec<Arc<dyn Middleware>> = vec![Arc::new(record("g", &log))];
        let route: Vec<Arc<dyn Middleware>> =
            vec![Arc::new(record("r1", &log)), Arc::new(record("r2", &log))];
        let controller = vec![
            ControllerMiddleware::all(record("c-all", &log)),
            ControllerMiddleware::only(record("c-store", &log), ["store"]),
        ];

        let chain = MiddlewareChain::build(&global, &route, &controller, Some("index"));
        assert_eq!(
            chain.describe(),
            vec![
                ("g", Scope::Global),
                ("r1", Scope::Route),
                ("r2", Scope::Route),
                ("c-all", Scope::Controller),
            ]
        );

        let chain = MiddlewareChain::build(&global, &route, &controller, Some("store"));
        assert_eq!(chain.len(), 5);

        let chain = MiddlewareChain::build(&global, &[], &controller, None);
        assert_eq!(chain.describe(), vec![("g", Scope::Global)]);
    }

    #[tokio::test]
    async fn test_short_circuit_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let global: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(record("first", &log)),
            Arc::new(Record {
                label: "deny",
                log: log.clone(),
                flow: Flow::respond("denied"),
            }),
            Arc::new(record("never", &log)),
        ];
        let chain = MiddlewareChain::build(&global, &[], &[], None);

        let output = chain.run(&Request::new(Method::Get, "/")).await.unwrap();
        assert_eq!(output, Some(Output::Text("denied".into())));
        assert_eq!(*log.lock().unwrap(), vec!["first", "deny"]);
    }

    #[tokio::test]
    async fn test_all_continue_yields_none() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let route: Vec<Arc<dyn Middleware>> = vec![Arc::new(record("a", &log))];
        let chain = MiddlewareChain::build(&[], &route, &[], None);
        assert_eq!(chain.run(&Request::new(Method::Get, "/")).await.unwrap(), None);
    }

    #[test]
    fn test_empty_allow_list_applies_everywhere() {
        let log = Arc::new(Mutex::new(Vec::new()));
        assert!(ControllerMiddleware::all(record("x", &log)).applies_to("anything"));
        let limited = ControllerMiddleware::only(record("x", &log), ["update", "destroy"]);
        assert!(limited.applies_to("destroy"));
        assert!(!limited.applies_to("show"));
    }
}
