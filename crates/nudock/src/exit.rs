use std::fmt;
use std::io;

use nudock_endpoint::EndpointError;
use nudock_transport::TransportError;
use nudock_wire::{WireError, STATUS_NOT_FOUND};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::Unsupported(_) | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    match err {
        WireError::Io(source) => io_error(context, source),
        WireError::PayloadTooLarge { .. } | WireError::Envelope(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        WireError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn endpoint_error(context: &str, err: EndpointError) -> CliError {
    match err {
        EndpointError::Transport(err) => transport_error(context, err),
        EndpointError::Wire(err) => wire_error(context, err),
        EndpointError::Schema(_) | EndpointError::Json(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        EndpointError::EmptyRequestName => CliError::new(USAGE, format!("{context}: {err}")),
        EndpointError::RequestFailed { status, .. } if status == STATUS_NOT_FOUND => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        EndpointError::RequestFailed { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        EndpointError::HandshakeFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_a_usage_error() {
        let err = endpoint_error(
            "send failed",
            EndpointError::RequestFailed {
                path: "/nowhere".to_string(),
                status: 404,
                body: "{}".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
        assert!(err.message.starts_with("send failed: "));
    }

    #[test]
    fn rejected_document_is_data_invalid() {
        let err = endpoint_error(
            "send failed",
            EndpointError::RequestFailed {
                path: "/echo".to_string(),
                status: 400,
                body: "bad".to_string(),
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn refused_connection_is_a_failure() {
        let err = endpoint_error(
            "connect failed",
            EndpointError::Transport(TransportError::Connect {
                address: "127.0.0.1:1".to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
        );
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn unsupported_transport_is_usage() {
        let err = transport_error("start failed", TransportError::Unsupported("tcp"));
        assert_eq!(err.code, USAGE);
    }
}
