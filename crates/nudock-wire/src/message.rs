use serde::{Deserialize, Serialize};

/// The document was accepted and the body carries the reply document.
pub const STATUS_OK: u16 = 200;
/// The request failed parsing, validation or handling; the body is plain text.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// No route matches the request path.
pub const STATUS_NOT_FOUND: u16 = 404;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// A POST-style request: a serialized document addressed to a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub path: String,
    pub content_type: String,
    pub body: String,
}

impl Request {
    /// A request carrying a serialized JSON document.
    pub fn json(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            body: body.into(),
        }
    }
}

/// The reply to exactly one [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl Response {
    /// A 200 reply carrying a serialized JSON document.
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK,
            content_type: CONTENT_TYPE_JSON.to_string(),
            body: body.into(),
        }
    }

    /// A 400 reply with a plain-text explanation.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            content_type: CONTENT_TYPE_TEXT.to_string(),
            body: message.into(),
        }
    }

    /// A 404 reply with a structured body naming the unmatched path.
    pub fn not_found(path: &str) -> Self {
        let body = serde_json::json!({ "error": format!("Unknown request title: {path}") });
        Self {
            status: STATUS_NOT_FOUND,
            content_type: CONTENT_TYPE_JSON.to_string(),
            body: format!("{body:#}"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}
