//! Route table and request dispatch.
//!
//! # Responsibilities
//! - Own the ordered route table (registration order is match priority)
//! - Tell "no route" (404) apart from "wrong method" (405)
//! - Build the middleware chain and run it ahead of the action
//! - Autowire action arguments and normalize the action output
//!
//! # Design Decisions
//! - The table is filled at startup and only read while serving
//! - First registered route wins; names are not checked for uniqueness
//! - HEAD never reaches an action: any path match answers with an empty body

use std::sync::Arc;

use super::action::{Action, ControllerAction, Handler};
use super::attributes::{RouteAttribute, Routable};
use super::route::{Route, RouteMatch};
use crate::container::{Container, Injectable};
use crate::error::{DispatchError, RouteError};
use crate::http::response::JSON_CONTENT_TYPE;
use crate::http::{Method, Output, Request, Response};
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareRegistry};

/// Fluent configuration of a freshly registered route.
pub struct RouteBuilder<'r> {
    router: &'r mut Router,
    index: usize,
}

impl RouteBuilder<'_> {
    pub fn name(self, name: impl Into<String>) -> Self {
        self.router.routes[self.index].set_name(name.into());
        self
    }

    /// Append middleware by registered alias, instantiating each one now.
    pub fn middleware<I, S>(self, names: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let middleware = self
                .router
                .registry
                .make(name.as_ref(), &self.router.container)?;
            self.router.routes[self.index].push_middleware(middleware);
        }
        Ok(self)
    }

    /// Append an already built middleware.
    pub fn with_middleware(self, middleware: Arc<dyn Middleware>) -> Self {
        self.router.routes[self.index].push_middleware(middleware);
        self
    }

    pub fn route(&self) -> &Route {
        &self.router.routes[self.index]
    }
}

/// The route table plus everything needed to dispatch against it.
pub struct Router {
    routes: Vec<Route>,
    container: Arc<Container>,
    registry: MiddlewareRegistry,
    global: Vec<Arc<dyn Middleware>>,
    pretty_json: bool,
}

impl Router {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            routes: Vec::new(),
            container,
            registry: MiddlewareRegistry::new(),
            global: Vec::new(),
            pretty_json: true,
        }
    }

    /// Pretty-print JSON output (the default outside production).
    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        let route = Route::new(method, path, action.into())?;
        tracing::trace!(method = %method, path, "Registered route");
        self.routes.push(route);
        Ok(RouteBuilder {
            index: self.routes.len() - 1,
            router: self,
        })
    }

    pub fn get(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Get, path, action)
    }

    pub fn post(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Post, path, action)
    }

    pub fn put(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Put, path, action)
    }

    pub fn patch(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Patch, path, action)
    }

    pub fn delete(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Delete, path, action)
    }

    pub fn head(
        &mut self,
        path: &str,
        action: impl Into<Action>,
    ) -> Result<RouteBuilder<'_>, RouteError> {
        self.add_route(Method::Head, path, action)
    }

    /// First route whose path matches, in registration order. With a method,
    /// the route must also be registered for exactly that method.
    pub fn find_route(&self, path: &str, method: Option<Method>) -> Option<(&Route, RouteMatch)> {
        self.routes
            .iter()
            .filter(|route| method.map_or(true, |m| route.method() == m))
            .find_map(|route| route.matches(path).map(|m| (route, m)))
    }

    pub fn find_by_logic<P>(&self, predicate: P) -> Option<&Route>
    where
        P: Fn(&Route) -> bool,
    {
        self.routes.iter().find(|route| predicate(route))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Route> {
        self.find_by_logic(|route| route.name() == Some(name))
    }

    /// Concrete path of the route named `name`.
    pub fn url_for(&self, name: &str, args: &[&str]) -> Result<String, RouteError> {
        self.find_by_name(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?
            .url(args)
    }

    /// Make `M` available to routes and config under `name`.
    pub fn register_middleware<M>(&mut self, name: impl Into<String>) -> &mut Self
    where
        M: Middleware + Injectable,
    {
        self.registry.register::<M>(name);
        self
    }

    /// Replace the global middleware with the named aliases, in order.
    pub fn set_global_middleware<I, S>(&mut self, names: I) -> Result<(), RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let global = names
            .into_iter()
            .map(|name| self.registry.make(name.as_ref(), &self.container))
            .collect::<Result<Vec<_>, _>>()?;
        self.global = global;
        Ok(())
    }

    /// Append one global middleware.
    pub fn global(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.global.push(middleware);
        self
    }

    pub fn global_middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.global
    }

    /// Register one route per attribute `C` declares. Returns the number of
    /// routes added.
    pub fn auto_register<C>(&mut self) -> Result<usize, RouteError>
    where
        C: super::Controller + Routable,
    {
        let attributes = C::route_attributes();
        for attribute in &attributes {
            let action = attribute.action().unwrap_or_default();
            if C::action_parameters(action).is_none() {
                return Err(RouteError::UnknownAction {
                    controller: C::type_key(),
                    action: action.to_string(),
                });
            }
            self.register_attribute(attribute, Action::controller::<C>(action))?;
        }
        Ok(attributes.len())
    }

    /// Register `handler` once per attribute.
    pub fn auto_register_handler(
        &mut self,
        attributes: &[RouteAttribute],
        handler: Handler,
    ) -> Result<usize, RouteError> {
        for attribute in attributes {
            self.register_attribute(attribute, handler.clone())?;
        }
        Ok(attributes.len())
    }

    fn register_attribute(
        &mut self,
        attribute: &RouteAttribute,
        action: impl Into<Action>,
    ) -> Result<(), RouteError> {
        let builder = self.add_route(attribute.method(), attribute.path(), action)?;
        if let Some(name) = attribute.route_name() {
            builder.name(name);
        }
        Ok(())
    }

    /// Register the conventional CRUD routes for the actions `C` implements.
    ///
    /// | action  | method | path          | name           |
    /// |---------|--------|---------------|----------------|
    /// | index   | GET    | `base`        | `name.index`   |
    /// | store   | POST   | `base`        | `name.store`   |
    /// | show    | GET    | `base/(\d+)`  | `name.show`    |
    /// | update  | PUT    | `base/(\d+)`  | `name.update`  |
    /// | destroy | DELETE | `base/(\d+)`  | `name.destroy` |
    pub fn resource<C>(&mut self, base: &str, name: &str) -> Result<usize, RouteError>
    where
        C: super::Controller,
    {
        let base = base.trim_end_matches('/');
        let member = format!(r"{base}/(\d+)");
        let table = [
            ("index", Method::Get, base),
            ("store", Method::Post, base),
            ("show", Method::Get, member.as_str()),
            ("update", Method::Put, member.as_str()),
            ("destroy", Method::Delete, member.as_str()),
        ];

        let mut added = 0;
        for (action, method, path) in table {
            if C::action_parameters(action).is_none() {
                continue;
            }
            let path = if path.is_empty() { "/" } else { path };
            self.add_route(method, path, Action::controller::<C>(action))?
                .name(format!("{name}.{action}"));
            added += 1;
        }
        Ok(added)
    }

    /// Dispatch `request` to its route and produce the output.
    pub async fn resolve(
        &self,
        request: Arc<Request>,
        response: &mut Response,
    ) -> Result<Output, DispatchError> {
        let method = request.method();
        let path = request.base_uri();

        let exact = self.find_route(path, Some(method));
        let any = match exact {
            Some(_) => None,
            None => self.find_route(path, None),
        };

        let (route, matched) = match (exact, any) {
            (Some(found), _) if method != Method::Head => found,
            (Some((route, _)), _) | (None, Some((route, _))) if method == Method::Head => {
                response.set_route(route.path());
                return Ok(Output::Empty);
            }
            (None, Some((other, _))) => {
                tracing::warn!(
                    method = %method,
                    path,
                    registered = %other.method(),
                    "Method not allowed"
                );
                return Err(DispatchError::MethodNotAllowed {
                    method,
                    path: path.to_string(),
                });
            }
            _ => {
                tracing::warn!(method = %method, path, "No route matched");
                return Err(DispatchError::RouteNotFound {
                    method,
                    path: path.to_string(),
                });
            }
        };

        response.set_route(route.path());
        tracing::debug!(
            method = %method,
            path,
            route = route.path(),
            action = %route.action().describe(),
            "Route matched"
        );

        let output = match route.action() {
            Action::Handler(handler) => {
                let chain = MiddlewareChain::build(&self.global, route.middleware(), &[], None);
                if let Some(output) = chain.run(&request).await? {
                    return self.short_circuit(output, response);
                }
                let args = self
                    .container
                    .autowire_call_args(handler.parameters(), Some(&request))?
                    .with_captures(matched.into_params());
                handler.call(args).await?
            }
            Action::Controller(action) => {
                let parameters = action.parameters().ok_or_else(|| unknown_action(action))?;
                let controller = action.instantiate(&self.container)?;
                let declared = controller.middleware();
                let chain = MiddlewareChain::build(
                    &self.global,
                    route.middleware(),
                    &declared,
                    Some(action.action()),
                );
                if let Some(output) = chain.run(&request).await? {
                    return self.short_circuit(output, response);
                }
                let args = self
                    .container
                    .autowire_call_args(&parameters, Some(&request))?
                    .with_captures(matched.into_params());
                controller.invoke(action.action().to_string(), args).await?
            }
        };

        self.finalize(output, response)
    }

    fn short_circuit(
        &self,
        output: Output,
        response: &mut Response,
    ) -> Result<Output, DispatchError> {
        if !matches!(output, Output::Response(_)) {
            response.set_code(200);
        }
        self.finalize(output, response)
    }

    /// Serialize JSON output, pretty-printed unless disabled.
    fn finalize(&self, output: Output, response: &mut Response) -> Result<Output, DispatchError> {
        match output {
            Output::Json(value) => {
                let body = if self.pretty_json {
                    serde_json::to_string_pretty(&value)?
                } else {
                    serde_json::to_string(&value)?
                };
                response.set_header("content-type", JSON_CONTENT_TYPE);
                Ok(Output::Text(body))
            }
            other => Ok(other),
        }
    }
}

fn unknown_action(action: &ControllerAction) -> DispatchError {
    DispatchError::UnknownAction {
        controller: action.controller(),
        action: action.action().to_string(),
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes)
            .field("registry", &self.registry)
            .field("global", &self.global.len())
            .field("pretty_json", &self.pretty_json)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{Args, ContainerError, Parameter};
    use crate::middleware::{ControllerMiddleware, Flow};
    use crate::routing::Controller;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn text(body: &'static str) -> Action {
        Action::handler(move |_| async move { Ok(Output::from(body)) })
    }

    async fn dispatch(router: &Router, method: Method, uri: &str) -> Result<Output, DispatchError> {
        let mut response = Response::new();
        router
            .resolve(Arc::new(Request::new(method, uri)), &mut response)
            .await
    }

    #[tokio::test]
    async fn test_exact_match_invokes_handler() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.get("/test", text("Hello World")).unwrap();

        let output = dispatch(&router, Method::Get, "/test").await.unwrap();
        assert_eq!(output, Output::Text("Hello World".into()));
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.get("/test", text("Hello World")).unwrap();

        let err = dispatch(&router, Method::Get, "/test2").await.unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { .. }));
        assert_eq!(err.status_code().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_named_route_url_reaches_its_handler() {
        let mut router = Router::new(Arc::new(Container::new()));
        router
            .get(
                r"/user/(\d+)",
                Action::handler(|args: Args| async move {
                    Ok(Output::Text(format!("user {}", args.capture(0).unwrap_or("?"))))
                }),
            )
            .unwrap()
            .name("user");

        let url = router.url_for("user", &["512"]).unwrap();
        assert_eq!(url, "/user/512");
        let output = dispatch(&router, Method::Get, &url).await.unwrap();
        assert_eq!(output, Output::Text("user 512".into()));
        assert!(matches!(
            router.url_for("missing", &[]),
            Err(RouteError::UnknownRoute(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_allowed() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.get("/test", text("Hello World")).unwrap();

        let err = dispatch(&router, Method::Post, "/test").await.unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotAllowed { .. }));
        assert_eq!(err.status_code().as_u16(), 405);
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.get(r"/items/(\d+)", text("first")).unwrap();
        router.get(r"/items/(\w+)", text("second")).unwrap();

        let output = dispatch(&router, Method::Get, "/items/7").await.unwrap();
        assert_eq!(output, Output::Text("first".into()));
        let output = dispatch(&router, Method::Get, "/items/abc").await.unwrap();
        assert_eq!(output, Output::Text("second".into()));
    }

    #[tokio::test]
    async fn test_head_returns_empty_without_invoking_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut router = Router::new(Arc::new(Container::new()));
        router
            .get(
                "/report",
                Action::handler(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Output::from("body")) }
                }),
            )
            .unwrap();

        let output = dispatch(&router, Method::Head, "/report").await.unwrap();
        assert_eq!(output, Output::Empty);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let err = dispatch(&router, Method::Head, "/missing").await.unwrap_err();
        assert!(matches!(err, DispatchError::RouteNotFound { .. }));
    }

    #[test]
    fn test_find_route_with_and_without_method() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.post("/form", text("post")).unwrap();

        assert!(router.find_route("/form", Some(Method::Get)).is_none());
        let (route, _) = router.find_route("/form", None).unwrap();
        assert_eq!(route.method(), Method::Post);
        assert!(router.find_by_logic(|r| r.path() == "/form").is_some());
    }

    struct Deny;

    #[async_trait]
    impl Middleware for Deny {
        async fn execute(&self, _: &Request) -> Result<Flow, DispatchError> {
            Ok(Flow::respond("denied"))
        }
    }

    impl Injectable for Deny {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Deny)
        }
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler_and_sets_ok() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut router = Router::new(Arc::new(Container::new()));
        router.register_middleware::<Deny>("deny");
        router
            .get(
                "/secret",
                Action::handler(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { Ok(Output::from("secret")) }
                }),
            )
            .unwrap()
            .middleware(["deny"])
            .unwrap();

        let mut response = Response::new().with_code(500);
        let output = router
            .resolve(Arc::new(Request::new(Method::Get, "/secret")), &mut response)
            .await
            .unwrap();
        assert_eq!(output, Output::Text("denied".into()));
        assert_eq!(response.code(), 200);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct RequireLogin;

    #[async_trait]
    impl Middleware for RequireLogin {
        async fn execute(&self, _: &Request) -> Result<Flow, DispatchError> {
            Ok(Flow::respond(Response::redirect("/login").with_body("login first")))
        }
    }

    impl Injectable for RequireLogin {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(RequireLogin)
        }
    }

    #[tokio::test]
    async fn test_short_circuit_with_typed_response_keeps_its_status() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.register_middleware::<RequireLogin>("auth");
        router
            .get("/account", text("account"))
            .unwrap()
            .middleware(["auth"])
            .unwrap();

        let mut response = Response::new().with_code(500);
        let output = router
            .resolve(Arc::new(Request::new(Method::Get, "/account")), &mut response)
            .await
            .unwrap();
        match &output {
            Output::Response(inner) => {
                assert_eq!(inner.code(), 302);
                assert_eq!(inner.header("location"), Some("/login"));
            }
            other => panic!("expected a typed response, got {other:?}"),
        }
        assert_eq!(response.code(), 500);

        let http = response.render(output);
        assert_eq!(http.status().as_u16(), 302);
    }

    #[tokio::test]
    async fn test_resolve_records_matched_route_pattern() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.get(r"/user/(\d+)", text("user")).unwrap();

        let mut response = Response::new();
        router
            .resolve(Arc::new(Request::new(Method::Get, "/user/7")), &mut response)
            .await
            .unwrap();
        assert_eq!(response.route(), Some(r"/user/(\d+)"));

        let mut response = Response::new();
        router
            .resolve(Arc::new(Request::new(Method::Head, "/user/7")), &mut response)
            .await
            .unwrap();
        assert_eq!(response.route(), Some(r"/user/(\d+)"));

        let mut response = Response::new();
        assert!(router
            .resolve(Arc::new(Request::new(Method::Get, "/nowhere")), &mut response)
            .await
            .is_err());
        assert_eq!(response.route(), None);
    }

    #[test]
    fn test_unknown_middleware_alias_is_an_error() {
        let mut router = Router::new(Arc::new(Container::new()));
        let err = router
            .get("/x", text("x"))
            .unwrap()
            .middleware(["nope"])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RouteError::Container(ContainerError::UnresolvedDependency(_))
        ));
    }

    #[tokio::test]
    async fn test_json_is_pretty_unless_disabled() {
        let container = Arc::new(Container::new());
        let json_action = || Action::handler(|_| async { Ok(Output::Json(json!({"a": 1}))) });

        let mut router = Router::new(container.clone());
        router.get("/j", json_action()).unwrap();
        let mut response = Response::new();
        let output = router
            .resolve(Arc::new(Request::new(Method::Get, "/j")), &mut response)
            .await
            .unwrap();
        assert_eq!(output, Output::Text("{\n  \"a\": 1\n}".into()));
        assert_eq!(response.header("content-type"), Some(JSON_CONTENT_TYPE));

        let mut router = Router::new(container).with_pretty_json(false);
        router.get("/j", json_action()).unwrap();
        let output = dispatch(&router, Method::Get, "/j").await.unwrap();
        assert_eq!(output, Output::Text("{\"a\":1}".into()));
    }

    struct Greeting(&'static str);

    impl Injectable for Greeting {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Greeting("hello"))
        }
    }

    #[tokio::test]
    async fn test_handler_arguments_are_autowired_before_captures() {
        let mut router = Router::new(Arc::new(Container::new()));
        let handler = Handler::new(|args: Args| async move {
            let greeting = args.get::<Greeting>("greeting")?;
            let request = args.get::<Request>("request")?;
            Ok::<_, DispatchError>(Output::Text(format!(
                "{} {} via {}",
                greeting.0,
                args.capture(0).unwrap_or_default(),
                request.method()
            )))
        })
        .with_parameters(vec![
            Parameter::service::<Greeting>("greeting"),
            Parameter::request("request"),
        ]);
        router.get(r"/hi/(\w+)", handler).unwrap();

        let output = dispatch(&router, Method::Get, "/hi/ada").await.unwrap();
        assert_eq!(output, Output::Text("hello ada via GET".into()));
    }

    struct Users;

    impl Injectable for Users {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Users)
        }
    }

    #[async_trait]
    impl Controller for Users {
        fn middleware(&self) -> Vec<ControllerMiddleware> {
            vec![ControllerMiddleware::only(Deny, ["destroy"])]
        }

        fn action_parameters(action: &str) -> Option<Vec<Parameter>> {
            matches!(action, "index" | "show" | "destroy").then(Vec::new)
        }

        async fn call(
            self: Arc<Self>,
            action: String,
            args: Args,
        ) -> Result<Output, DispatchError> {
            match action.as_str() {
                "index" => Output::json(&["ada", "grace"]),
                "show" => Ok(Output::Text(format!("user {}", args.capture(0).unwrap_or("?")))),
                "destroy" => Ok(Output::from("deleted")),
                _ => Err(DispatchError::UnknownAction {
                    controller: Self::type_key(),
                    action,
                }),
            }
        }
    }

    impl Routable for Users {
        fn route_attributes() -> Vec<RouteAttribute> {
            vec![
                RouteAttribute::get("/users").on("index").name("users.list"),
                RouteAttribute::get(r"/users/(\d+)").on("show"),
            ]
        }
    }

    #[tokio::test]
    async fn test_controller_allow_list_filters_middleware() {
        let mut router = Router::new(Arc::new(Container::new()));
        assert_eq!(router.resource::<Users>("/users", "users").unwrap(), 3);

        let output = dispatch(&router, Method::Get, "/users/3").await.unwrap();
        assert_eq!(output, Output::Text("user 3".into()));

        let output = dispatch(&router, Method::Delete, "/users/3").await.unwrap();
        assert_eq!(output, Output::Text("denied".into()));

        assert_eq!(router.url_for("users.show", &["9"]).unwrap(), "/users/9");
        assert!(router.find_by_name("users.store").is_none());
    }

    #[tokio::test]
    async fn test_global_middleware_runs_for_every_action() {
        let mut router = Router::new(Arc::new(Container::new()));
        router.register_middleware::<Deny>("deny");
        router.set_global_middleware(["deny"]).unwrap();
        router.get("/open", text("open")).unwrap();
        router.resource::<Users>("/users", "users").unwrap();

        let output = dispatch(&router, Method::Get, "/open").await.unwrap();
        assert_eq!(output, Output::Text("denied".into()));
        let output = dispatch(&router, Method::Get, "/users").await.unwrap();
        assert_eq!(output, Output::Text("denied".into()));
    }

    #[tokio::test]
    async fn test_auto_register_preserves_names() {
        let mut router = Router::new(Arc::new(Container::new()));
        assert_eq!(router.auto_register::<Users>().unwrap(), 2);

        let route = router.find_by_name("users.list").unwrap();
        assert_eq!(route.path(), "/users");
        let output = dispatch(&router, Method::Get, "/users").await.unwrap();
        assert!(matches!(output, Output::Text(body) if body.contains("grace")));
    }

    struct Broken;

    impl Injectable for Broken {
        fn construct(_: &mut Args) -> Result<Self, ContainerError> {
            Ok(Broken)
        }
    }

    #[async_trait]
    impl Controller for Broken {
        fn action_parameters(_: &str) -> Option<Vec<Parameter>> {
            None
        }

        async fn call(self: Arc<Self>, action: String, _: Args) -> Result<Output, DispatchError> {
            Err(DispatchError::UnknownAction {
                controller: Self::type_key(),
                action,
            })
        }
    }

    impl Routable for Broken {
        fn route_attributes() -> Vec<RouteAttribute> {
            vec![RouteAttribute::get("/broken").on("missing")]
        }
    }

    #[tokio::test]
    async fn test_unknown_controller_action() {
        let mut router = Router::new(Arc::new(Container::new()));
        assert!(matches!(
            router.auto_register::<Broken>(),
            Err(RouteError::UnknownAction { .. })
        ));

        router
            .get("/broken", Action::controller::<Broken>("missing"))
            .unwrap();
        let err = dispatch(&router, Method::Get, "/broken").await.unwrap_err();
        assert!(matches!(err, DispatchError::UnknownAction { .. }));
    }

    #[tokio::test]
    async fn test_handler_registered_from_attributes() {
        let mut router = Router::new(Arc::new(Container::new()));
        let handler = Handler::new(|_| async { Ok(Output::from("pong")) });
        let attributes = [
            RouteAttribute::get("/ping").name("ping"),
            RouteAttribute::post("/ping"),
        ];
        assert_eq!(router.auto_register_handler(&attributes, handler).unwrap(), 2);

        assert_eq!(router.routes().len(), 2);
        assert_eq!(router.find_by_name("ping").unwrap().method(), Method::Get);
        let output = dispatch(&router, Method::Post, "/ping").await.unwrap();
        assert_eq!(output, Output::Text("pong".into()));
    }
}
