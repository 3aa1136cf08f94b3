//! Request normalization.
//!
//! # Responsibilities
//! - Convert the transport request into a [`Request`] value
//! - Decode query strings and JSON / form bodies into named fields
//! - Look up input fields through an ordered list of sources
//! - Honor `_method` overrides on form posts
//!
//! # Design Decisions
//! - Bodies are read once, bounded by a size limit
//! - Field lookup is explicit: callers choose sources or take the default
//!   body-then-query order
//! - Header names are stored lowercase

use std::collections::BTreeMap;

use axum::body::Body;
use serde_json::Value;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::http::method::Method;

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Form field that overrides the method of a POST.
const METHOD_OVERRIDE_FIELD: &str = "_method";

/// A place input fields can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Body,
    Query,
}

const DEFAULT_INPUT_ORDER: [InputSource; 2] = [InputSource::Body, InputSource::Query];

/// A normalized incoming request.
#[derive(Debug, Clone)]
pub struct Request {
    id: Option<String>,
    method: Method,
    base_uri: String,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, Value>,
    body: BTreeMap<String, Value>,
}

impl Request {
    /// Build a request from a method and a path with optional query string.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        Self {
            id: None,
            method,
            base_uri: normalize_path(path),
            headers: BTreeMap::new(),
            query: decode_form(query.as_bytes()),
            body: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Add a body field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body.insert(name.into(), value.into());
        self
    }

    /// Read and normalize a transport request. The body is read up to
    /// `body_limit` bytes.
    pub async fn from_http(
        request: axum::http::Request<Body>,
        body_limit: usize,
    ) -> Result<Self, DispatchError> {
        let (parts, body) = request.into_parts();
        let method = Method::try_from(&parts.method)?;
        let uri = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let mut request = Request::new(method, uri);
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                request.headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        request.id = Some(
            request
                .headers
                .get(X_REQUEST_ID)
                .cloned()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        );

        let bytes = axum::body::to_bytes(body, body_limit)
            .await
            .map_err(|e| DispatchError::BadRequest(e.to_string()))?;
        request.body = decode_body(request.header("content-type"), &bytes)?;
        request.apply_method_override();

        Ok(request)
    }

    fn apply_method_override(&mut self) {
        if self.method != Method::Post {
            return;
        }
        let requested = self
            .body
            .get(METHOD_OVERRIDE_FIELD)
            .and_then(Value::as_str)
            .and_then(|m| m.parse::<Method>().ok());
        if let Some(method @ (Method::Put | Method::Patch | Method::Delete)) = requested {
            tracing::trace!(from = %self.method, to = %method, "Method override");
            self.method = method;
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Path without query string.
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    pub fn post(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// First value for `name` found in `sources`, checked in order.
    pub fn input_from(&self, name: &str, sources: &[InputSource]) -> Option<&Value> {
        sources.iter().find_map(|source| match source {
            InputSource::Body => self.body.get(name),
            InputSource::Query => self.query.get(name),
        })
    }

    /// Body field, falling back to the query string.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.input_from(name, &DEFAULT_INPUT_ORDER)
    }

    pub fn input_str(&self, name: &str) -> Option<&str> {
        self.input(name).and_then(Value::as_str)
    }

    /// All input fields; body fields shadow query fields of the same name.
    pub fn all_input(&self) -> BTreeMap<&str, &Value> {
        self.query
            .iter()
            .chain(self.body.iter())
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn decode_form(bytes: &[u8]) -> BTreeMap<String, Value> {
    url::form_urlencoded::parse(bytes)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect()
}

fn decode_body(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<BTreeMap<String, Value>, DispatchError> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| DispatchError::BadRequest(format!("invalid JSON body: {e}")))?;
        return Ok(match value {
            Value::Object(fields) => fields.into_iter().collect(),
            _ => BTreeMap::new(),
        });
    }
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(decode_form(bytes));
    }
    Ok(BTreeMap::new())
}
