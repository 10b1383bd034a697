//! Local transport layer for nudock.
//!
//! Two concrete transports are provided:
//! - Unix domain sockets addressed by a path derived from the port number
//! - Loopback TCP on `127.0.0.1:<port>`
//!
//! A third kind, plain network TCP, is declared so configurations can name it,
//! but selecting it fails with [`TransportError::Unsupported`].
//!
//! Everything above this crate talks to an [`IpcStream`], obtained either from
//! a bound [`Listener`] or from [`connect`].

pub mod error;
pub mod selector;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use selector::{
    connect, CommunicationKind, Listener, TransportConfig, TransportTarget, DEFAULT_PORT,
    DEFAULT_SOCKET_DIR, SOCKET_NAMESPACE,
};
pub use tcp::LoopbackSocket;
pub use traits::IpcStream;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
