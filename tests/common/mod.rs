//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use request_dispatch::config::AppConfig;
use request_dispatch::demo;
use request_dispatch::http::{HttpServer, Method, Output, Request, Response};
use request_dispatch::lifecycle::{Application, Shutdown};
use request_dispatch::DispatchError;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A server bound to an ephemeral local port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Configuration suitable for tests: loopback, production JSON formatting.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.app.environment = "production".into();
    config
}

#[allow(dead_code)]
pub fn demo_app() -> Application {
    demo::application(test_config()).unwrap()
}

/// Serve `app` on 127.0.0.1 with an OS-assigned port.
#[allow(dead_code)]
pub async fn start_server(app: &Application) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app);
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

/// Resolve a request in-process.
#[allow(dead_code)]
pub async fn dispatch(
    app: &Application,
    method: Method,
    uri: &str,
) -> (Result<Output, DispatchError>, Response) {
    let mut response = Response::new();
    let output = app
        .router()
        .resolve(Arc::new(Request::new(method, uri)), &mut response)
        .await;
    (output, response)
}
