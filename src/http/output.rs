//! Handler output values.

use serde::Serialize;
use serde_json::Value;

use crate::error::DispatchError;
use crate::http::response::Response;

/// What a handler or short-circuiting middleware produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// No body.
    Empty,
    /// Raw text written as-is.
    Text(String),
    /// Rendered HTML.
    View(String),
    /// Structured data, serialized by the router.
    Json(Value),
    /// A response carrying its own status and headers.
    Response(Response),
}

impl Output {
    /// Serialize `value` into JSON output.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, DispatchError> {
        Ok(Output::Json(serde_json::to_value(value)?))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Empty)
    }
}

impl From<()> for Output {
    fn from(_: ()) -> Self {
        Output::Empty
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Output::Text(text.to_string())
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Output::Text(text)
    }
}

impl From<Value> for Output {
    fn from(value: Value) -> Self {
        Output::Json(value)
    }
}

impl From<Response> for Output {
    fn from(response: Response) -> Self {
        Output::Response(response)
    }
}
