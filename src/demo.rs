//! Sample application served by the binary.
//!
//! A small user directory: a resource controller over an in-memory store,
//! a greeting handler with an injected service, an API key check limited to
//! the mutating actions and a request logger used as global middleware.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::container::{key_of, Args, ContainerError, Injectable, Parameter};
use crate::error::DispatchError;
use crate::http::{Output, Request};
use crate::lifecycle::{Application, StartupError};
use crate::middleware::{ControllerMiddleware, Flow, Middleware};
use crate::routing::{Action, Controller, Handler, Routable, RouteAttribute};

/// Header checked by [`ApiKey`].
pub const API_KEY_HEADER: &str = "x-api-key";

/// Builds the greeting text.
pub struct Greeter {
    greeting: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        format!("{}, {name}!", self.greeting)
    }
}

impl Injectable for Greeter {
    fn construct(_: &mut Args) -> Result<Self, ContainerError> {
        Ok(Greeter {
            greeting: "Hello".to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
}

/// In-memory user storage, bound as a singleton.
pub struct UserStore {
    users: RwLock<BTreeMap<u64, User>>,
    next_id: AtomicU64,
}

impl UserStore {
    pub fn seeded() -> Self {
        let store = UserStore {
            users: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        };
        store.insert("ada");
        store.insert("grace");
        store
    }

    pub fn all(&self) -> Vec<User> {
        self.read().values().cloned().collect()
    }

    pub fn find(&self, id: u64) -> Option<User> {
        self.read().get(&id).cloned()
    }

    pub fn insert(&self, name: &str) -> User {
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
        };
        self.write().insert(user.id, user.clone());
        user
    }

    pub fn rename(&self, id: u64, name: &str) -> Option<User> {
        let mut users = self.write();
        let user = users.get_mut(&id)?;
        user.name = name.to_string();
        Some(user.clone())
    }

    pub fn remove(&self, id: u64) -> Option<User> {
        self.write().remove(&id)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<u64, User>> {
        self.users.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<u64, User>> {
        self.users.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Injectable for UserStore {
    fn construct(_: &mut Args) -> Result<Self, ContainerError> {
        Ok(UserStore::seeded())
    }
}

/// Expected API key.
pub struct ApiKeySetting(pub String);

impl Injectable for ApiKeySetting {
    fn construct(_: &mut Args) -> Result<Self, ContainerError> {
        Ok(ApiKeySetting("demo-key".to_string()))
    }
}

/// Rejects requests without the expected `x-api-key` header.
pub struct ApiKey {
    expected: Arc<ApiKeySetting>,
}

impl Injectable for ApiKey {
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::service::<ApiKeySetting>("expected")]
    }

    fn construct(args: &mut Args) -> Result<Self, ContainerError> {
        Ok(ApiKey {
            expected: args.get("expected")?,
        })
    }
}

#[async_trait]
impl Middleware for ApiKey {
    fn name(&self) -> &str {
        "api-key"
    }

    async fn execute(&self, request: &Request) -> Result<Flow, DispatchError> {
        match request.header(API_KEY_HEADER) {
            Some(key) if key == self.expected.0 => Ok(Flow::Continue),
            _ => Err(DispatchError::http(401, "missing or invalid API key")),
        }
    }
}

/// Logs every request that reached a route.
pub struct RequestLog;

impl Injectable for RequestLog {
    fn construct(_: &mut Args) -> Result<Self, ContainerError> {
        Ok(RequestLog)
    }
}

#[async_trait]
impl Middleware for RequestLog {
    fn name(&self) -> &str {
        "request-log"
    }

    async fn execute(&self, request: &Request) -> Result<Flow, DispatchError> {
        tracing::info!(
            method = %request.method(),
            path = request.base_uri(),
            "Handling request"
        );
        Ok(Flow::Continue)
    }
}

/// CRUD over [`UserStore`].
pub struct UserController {
    users: Arc<UserStore>,
    api_key: Arc<ApiKeySetting>,
}

impl UserController {
    fn id(args: &Args) -> Result<u64, DispatchError> {
        args.capture(0)
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| DispatchError::BadRequest("invalid user id".to_string()))
    }

    fn name_field(args: &Args) -> Result<String, DispatchError> {
        let request = args.get::<Request>("request")?;
        request
            .input_str("name")
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| DispatchError::BadRequest("field `name` is required".to_string()))
    }

    fn not_found(id: u64) -> DispatchError {
        DispatchError::http(404, format!("user {id} not found"))
    }
}

impl Injectable for UserController {
    fn parameters() -> Vec<Parameter> {
        vec![
            Parameter::service::<UserStore>("users"),
            Parameter::service::<ApiKeySetting>("api_key"),
        ]
    }

    fn construct(args: &mut Args) -> Result<Self, ContainerError> {
        Ok(UserController {
            users: args.get("users")?,
            api_key: args.get("api_key")?,
        })
    }
}

#[async_trait]
impl Controller for UserController {
    fn middleware(&self) -> Vec<ControllerMiddleware> {
        vec![ControllerMiddleware::only(
            ApiKey {
                expected: Arc::clone(&self.api_key),
            },
            ["store", "update", "destroy"],
        )]
    }

    fn action_parameters(action: &str) -> Option<Vec<Parameter>> {
        match action {
            "index" | "show" | "destroy" => Some(Vec::new()),
            "store" | "update" => Some(vec![Parameter::request("request")]),
            _ => None,
        }
    }

    async fn call(self: Arc<Self>, action: String, args: Args) -> Result<Output, DispatchError> {
        match action.as_str() {
            "index" => Output::json(&self.users.all()),
            "show" => {
                let id = Self::id(&args)?;
                let user = self.users.find(id).ok_or_else(|| Self::not_found(id))?;
                Output::json(&user)
            }
            "store" => {
                let user = self.users.insert(&Self::name_field(&args)?);
                Output::json(&user)
            }
            "update" => {
                let id = Self::id(&args)?;
                let user = self
                    .users
                    .rename(id, &Self::name_field(&args)?)
                    .ok_or_else(|| Self::not_found(id))?;
                Output::json(&user)
            }
            "destroy" => {
                let id = Self::id(&args)?;
                self.users.remove(id).ok_or_else(|| Self::not_found(id))?;
                Ok(Output::Empty)
            }
            _ => Err(DispatchError::UnknownAction {
                controller: Self::type_key(),
                action,
            }),
        }
    }
}

/// Service status endpoints, registered from attributes.
pub struct StatusController;

impl Injectable for StatusController {
    fn construct(_: &mut Args) -> Result<Self, ContainerError> {
        Ok(StatusController)
    }
}

#[async_trait]
impl Controller for StatusController {
    fn action_parameters(action: &str) -> Option<Vec<Parameter>> {
        matches!(action, "health" | "version").then(Vec::new)
    }

    async fn call(self: Arc<Self>, action: String, _: Args) -> Result<Output, DispatchError> {
        match action.as_str() {
            "health" => Ok(Output::from("ok")),
            "version" => Ok(Output::Json(json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }))),
            _ => Err(DispatchError::UnknownAction {
                controller: Self::type_key(),
                action,
            }),
        }
    }
}

impl Routable for StatusController {
    fn route_attributes() -> Vec<RouteAttribute> {
        vec![
            RouteAttribute::get("/health").on("health").name("health"),
            RouteAttribute::get("/version").on("version").name("version"),
        ]
    }
}

fn greet_handler() -> Handler {
    Handler::new(|args: Args| async move {
        let greeter = args.get::<Greeter>("greeter")?;
        let name = args.capture(0).unwrap_or("world");
        Ok::<_, DispatchError>(Output::Json(json!({ "message": greeter.greet(name) })))
    })
    .with_parameters(vec![Parameter::service::<Greeter>("greeter")])
}

fn echo_handler() -> Handler {
    Handler::new(|args: Args| async move {
        let request = args.get::<Request>("request")?;
        Output::json(&request.all_input())
    })
    .with_parameters(vec![Parameter::request("request")])
}

/// Assemble the sample application on top of `config`.
pub fn application(config: AppConfig) -> Result<Application, StartupError> {
    let builder = Application::builder(config)
        .register_type::<Greeter>()
        .register_type_as::<UserStore>("users")
        .middleware::<RequestLog>("request-log")
        .middleware::<ApiKey>("api-key");

    builder
        .container()
        .bind_singleton(key_of::<UserStore>(), |_| Ok(UserStore::seeded()));

    builder
        .routes(|router| {
            router
                .get("/", Action::handler(|_| async { Ok(Output::from("request-dispatch")) }))?
                .name("home");
            router.get(r"/hello/(\w+)", greet_handler())?.name("hello");
            router.post("/echo", echo_handler())?.middleware(["api-key"])?;
            router.auto_register::<StatusController>()?;
            router.resource::<UserController>("/users", "users")?;
            Ok(())
        })
        .build()
}
