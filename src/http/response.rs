//! Response handling and transformation.
//!
//! # Responsibilities
//! - Carry the status code and headers set during dispatch
//! - Combine them with the resolved [`Output`] into a transport response
//!
//! # Design Decisions
//! - A typed `Output::Response` replaces the dispatch response entirely
//! - Content type defaults from the output kind unless a header was set
//! - Invalid header names or values are dropped with a warning

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};

use crate::http::output::Output;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Mutable status, headers and body for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    code: u16,
    headers: BTreeMap<String, String>,
    body: Option<String>,
    route: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            code: 200,
            headers: BTreeMap::new(),
            body: None,
            route: None,
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new().with_code(302).with_header("location", location)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn set_code(&mut self, code: u16) {
        self.code = code;
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Pattern of the route that handled the request, once one matched.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn set_route(&mut self, pattern: impl Into<String>) {
        self.route = Some(pattern.into());
    }

    /// Build the transport response for `output`.
    pub fn render(self, output: Output) -> axum::response::Response {
        let (response, body, default_type) = match output {
            Output::Response(inner) => {
                let body = inner.body.clone();
                (inner, body, None)
            }
            Output::Empty => (self, None, None),
            Output::Text(text) => (self, Some(text), Some(TEXT_CONTENT_TYPE)),
            Output::View(html) => (self, Some(html), Some(HTML_CONTENT_TYPE)),
            Output::Json(value) => (self, Some(value.to_string()), Some(JSON_CONTENT_TYPE)),
        };

        let mut http = axum::response::Response::new(Body::from(body.unwrap_or_default()));
        *http.status_mut() =
            StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        for (name, value) in &response.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    http.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }
        if let Some(content_type) = default_type {
            http.headers_mut()
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(content_type));
        }
        http
    }
}
