//! Schema-validated request dispatch between two cooperating processes.
//!
//! An [`Endpoint`] plays exactly one role. As a server it registers named
//! handlers, binds the configured transport and answers requests until it is
//! stopped. As a client it connects, performs the version handshake and sends
//! requests by name.
//!
//! ```no_run
//! use nudock_endpoint::{handler_fn, Endpoint, EndpointConfig};
//!
//! let mut dock = Endpoint::new(EndpointConfig::default());
//! dock.register_handler("ping", handler_fn(|_request| Ok(serde_json::json!("pong"))))?;
//! dock.start_server()?;
//! # Ok::<(), nudock_endpoint::EndpointError>(())
//! ```

mod client;
pub mod config;
mod dispatch;
pub mod endpoint;
pub mod error;
pub mod handler;
pub mod handshake;
pub mod registry;
mod server;

pub use config::{EndpointConfig, DEFAULT_SCHEMAS_DIR, VERSION};
pub use endpoint::{Endpoint, Role, ServerPhase};
pub use error::{EndpointError, Result};
pub use handler::{handler_fn, Handler, HandlerError, HandlerResult};
pub use handshake::{check_version, VersionCheck, VersionMessage, HANDSHAKE_PATH};
pub use registry::{HandlerRegistry, Registration};
pub use server::ServerHandle;

pub use nudock_schema::{SchemaConfig, SchemaError};
pub use nudock_transport::{CommunicationKind, TransportConfig, TransportError, TransportTarget};
pub use nudock_wire::{Request, Response};
