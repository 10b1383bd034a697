use crate::endpoint::Role;

/// Errors that can occur in endpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] nudock_transport::TransportError),

    /// Frame or envelope error.
    #[error("wire error: {0}")]
    Wire(#[from] nudock_wire::WireError),

    /// Schema loading or validation error.
    #[error("schema error: {0}")]
    Schema(#[from] nudock_schema::SchemaError),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint already plays a role.
    #[error("endpoint already started as {0}")]
    AlreadyStarted(Role),

    /// Requests can only be sent from a started client.
    #[error("endpoint is not a started client")]
    NotClient,

    /// A request was addressed to an empty name.
    #[error("request name is empty")]
    EmptyRequestName,

    /// The start-up version exchange did not complete.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// The server answered a request with a non-success status.
    #[error("request {path} failed with status {status}: {body}")]
    RequestFailed {
        path: String,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, EndpointError>;
