//! Request dispatch: route lookup and the validate/handle/validate pipeline.
//!
//! Every request yields exactly one [`Response`]. Each stage returns a
//! `Result` and the first failure becomes a 400 reply.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nudock_schema::{Direction, SchemaError};
use nudock_wire::{Request, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::handler::{Handler, HandlerError};
use crate::handshake::{self, HANDSHAKE_PATH};
use crate::registry::{HandlerRegistry, Route};

/// What the server does once the reply has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterReply {
    Continue,
    /// Stop accepting connections (failed handshake).
    StopAccepting,
}

/// A reply and the server's next step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub response: Response,
    pub after: AfterReply,
}

impl Dispatched {
    fn reply(response: Response) -> Self {
        Self {
            response,
            after: AfterReply::Continue,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("Server failed to parse request: {0}")]
    Parse(serde_json::Error),

    #[error("Server {0}")]
    Validation(SchemaError),

    #[error("Server handler failed: {0}")]
    Handler(HandlerError),

    #[error("Server handler panicked: {0}")]
    Panicked(String),

    #[error("Server failed to serialize response: {0}")]
    Serialize(serde_json::Error),
}

/// Routes requests to registered handlers.
pub struct Dispatcher {
    version: String,
    validate: bool,
    registry: Arc<HandlerRegistry>,
    served: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(
        version: impl Into<String>,
        validate: bool,
        registry: Arc<HandlerRegistry>,
        served: Arc<AtomicU64>,
    ) -> Self {
        Self {
            version: version.into(),
            validate,
            registry,
            served,
        }
    }

    pub fn dispatch(&self, request: &Request) -> Dispatched {
        if request.path == HANDSHAKE_PATH {
            return handshake::answer(&self.version, &request.body);
        }

        match self.registry.route(&request.path) {
            Some(route) => Dispatched::reply(self.serve(&route, &request.body)),
            None => {
                warn!(path = %request.path, "no handler for request path");
                Dispatched::reply(Response::not_found(&request.path))
            }
        }
    }

    /// Requests routed to a handler so far.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }

    fn serve(&self, route: &Route<'_>, body: &str) -> Response {
        let count = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        match self.pipeline(route, body) {
            Ok(reply) => {
                debug!(request = route.name, count, "request served");
                Response::ok_json(reply)
            }
            Err(err) => {
                warn!(request = route.name, count, %err, "request rejected");
                Response::bad_request(err.to_string())
            }
        }
    }

    fn pipeline(&self, route: &Route<'_>, body: &str) -> Result<String, DispatchError> {
        let request: Value = serde_json::from_str(body).map_err(DispatchError::Parse)?;
        if self.validate {
            self.check(route, Direction::Request, &request)?;
        }

        let response = invoke(route.handler, &request)?;
        if self.validate {
            self.check(route, Direction::Response, &response)?;
        }

        serde_json::to_string(&response).map_err(DispatchError::Serialize)
    }

    fn check(
        &self,
        route: &Route<'_>,
        direction: Direction,
        document: &Value,
    ) -> Result<(), DispatchError> {
        route.schemas.validate(direction, document).map_err(|err| {
            warn!(
                request = route.name,
                %direction,
                expected = %route.schemas.expected(direction),
                received = %document,
                "document does not match its schema"
            );
            DispatchError::Validation(err)
        })
    }
}

fn invoke(handler: &dyn Handler, request: &Value) -> Result<Value, DispatchError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
        Ok(result) => result.map_err(DispatchError::Handler),
        Err(payload) => Err(DispatchError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
