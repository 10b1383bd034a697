//! Schema-validated request/response dispatch between two local processes.
//!
//! One process registers named handlers and serves; the other connects,
//! agrees on a version and sends JSON documents by name. Every document is
//! checked against the JSON Schema pair registered for its name.
//!
//! # Crate Structure
//!
//! - [`transport`]: domain socket and loopback streams
//! - [`wire`]: length-prefixed frames carrying request/response envelopes
//! - [`schema`]: per-name request/response schema pairs
//! - [`endpoint`]: handler registry, handshake, dispatch, server and client

/// Re-export transport types.
pub mod transport {
    pub use nudock_transport::*;
}

/// Re-export wire types.
pub mod wire {
    pub use nudock_wire::*;
}

/// Re-export schema types.
pub mod schema {
    pub use nudock_schema::*;
}

/// Re-export endpoint types.
pub mod endpoint {
    pub use nudock_endpoint::*;
}

pub use nudock_endpoint::{
    handler_fn, CommunicationKind, Endpoint, EndpointConfig, EndpointError, Handler,
    HandlerError, HandlerResult, Registration, Role, ServerHandle, VERSION,
};
