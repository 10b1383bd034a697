use serde_json::Value;

/// A handler's refusal to produce a response document.
///
/// The message becomes the body of the 400 reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

pub type HandlerResult = std::result::Result<Value, HandlerError>;

/// Computes a response document from a request document.
///
/// Handlers run on connection threads and may be called concurrently.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Value) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Value) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, request: &Value) -> HandlerResult {
        self(request)
    }
}

/// Pin a closure to the handler signature so its argument and error types
/// are inferred at the call site.
pub fn handler_fn<F>(f: F) -> F
where
    F: Fn(&Value) -> HandlerResult + Send + Sync + 'static,
{
    f
}
