//! Resolution of a configured communication kind into a concrete target.
//!
//! Selection happens once, when an endpoint starts. The resolved
//! [`TransportTarget`] is then bound by the server ([`Listener::bind`]) or
//! dialled by the client ([`connect`]).

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{Result, TransportError};
use crate::tcp::LoopbackSocket;
use crate::traits::IpcStream;
#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 1234;

/// File name prefix of domain socket paths; the port number completes it.
pub const SOCKET_NAMESPACE: &str = "nudock";

/// Directory holding domain socket files when none is configured.
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";

/// How the two endpoints reach each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommunicationKind {
    /// Unix domain socket. Same machine only, lowest overhead.
    UnixDomainSocket,
    /// TCP on the loopback interface.
    #[default]
    Localhost,
    /// TCP across the network. Declared but not implemented.
    Tcp,
}

impl CommunicationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommunicationKind::UnixDomainSocket => "unix-domain-socket",
            CommunicationKind::Localhost => "localhost",
            CommunicationKind::Tcp => "tcp",
        }
    }
}

impl fmt::Display for CommunicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport section of an endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub kind: CommunicationKind,
    /// Loopback port, or the discriminator in the domain socket file name.
    pub port: u16,
    /// Directory holding domain socket files.
    pub socket_dir: PathBuf,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: CommunicationKind::default(),
            port: DEFAULT_PORT,
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
        }
    }
}

impl TransportConfig {
    /// Domain socket path for this configuration: `<socket_dir>/nudock-<port>.sock`.
    pub fn socket_path(&self) -> PathBuf {
        self.socket_dir
            .join(format!("{SOCKET_NAMESPACE}-{}.sock", self.port))
    }

    /// Resolve the configured kind into a bind/connect target.
    ///
    /// Fails with [`TransportError::Unsupported`] for [`CommunicationKind::Tcp`],
    /// and for domain sockets on platforms without them. There is no fallback
    /// to another kind.
    pub fn resolve(&self) -> Result<TransportTarget> {
        match self.kind {
            CommunicationKind::UnixDomainSocket => {
                if cfg!(unix) {
                    Ok(TransportTarget::UnixSocket(self.socket_path()))
                } else {
                    error!("unix domain sockets are not available on this platform");
                    Err(TransportError::Unsupported(self.kind.as_str()))
                }
            }
            CommunicationKind::Localhost => Ok(TransportTarget::Loopback { port: self.port }),
            CommunicationKind::Tcp => {
                error!("TCP communication is not supported");
                Err(TransportError::Unsupported(self.kind.as_str()))
            }
        }
    }
}

/// A concrete place to listen on or connect to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    UnixSocket(PathBuf),
    Loopback { port: u16 },
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportTarget::UnixSocket(path) => write!(f, "unix:{}", path.display()),
            TransportTarget::Loopback { port } => write!(f, "127.0.0.1:{port}"),
        }
    }
}

/// A bound server-side transport.
pub enum Listener {
    #[cfg(unix)]
    Unix(UnixDomainSocket),
    Loopback(LoopbackSocket),
}

impl Listener {
    /// Bind the given target. Stale domain socket paths are removed first.
    pub fn bind(target: &TransportTarget) -> Result<Self> {
        let listener = match target {
            #[cfg(unix)]
            TransportTarget::UnixSocket(path) => Listener::Unix(UnixDomainSocket::bind(path)?),
            #[cfg(not(unix))]
            TransportTarget::UnixSocket(_) => {
                return Err(TransportError::Unsupported(
                    CommunicationKind::UnixDomainSocket.as_str(),
                ))
            }
            TransportTarget::Loopback { port } => Listener::Loopback(LoopbackSocket::bind(*port)?),
        };
        info!(target = %listener.local_target(), "transport bound");
        Ok(listener)
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => socket.accept(),
            Listener::Loopback(socket) => socket.accept(),
        }
    }

    /// The target clients should connect to. For loopback port 0 this carries
    /// the port the OS picked.
    pub fn local_target(&self) -> TransportTarget {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => TransportTarget::UnixSocket(socket.path().to_path_buf()),
            Listener::Loopback(socket) => TransportTarget::Loopback {
                port: socket.local_port(),
            },
        }
    }
}

/// Connect to a target (blocking).
pub fn connect(target: &TransportTarget) -> Result<IpcStream> {
    match target {
        TransportTarget::UnixSocket(path) => connect_unix(path),
        TransportTarget::Loopback { port } => LoopbackSocket::connect(*port),
    }
}

#[cfg(unix)]
fn connect_unix(path: &Path) -> Result<IpcStream> {
    UnixDomainSocket::connect(path)
}

#[cfg(not(unix))]
fn connect_unix(_path: &Path) -> Result<IpcStream> {
    Err(TransportError::Unsupported(
        CommunicationKind::UnixDomainSocket.as_str(),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn default_is_loopback_on_1234() {
        let config = TransportConfig::default();
        assert_eq!(config.kind, CommunicationKind::Localhost);
        assert_eq!(
            config.resolve().unwrap(),
            TransportTarget::Loopback { port: 1234 }
        );
    }

    #[test]
    fn socket_path_includes_port() {
        let config = TransportConfig {
            kind: CommunicationKind::UnixDomainSocket,
            port: 4321,
            socket_dir: PathBuf::from("/tmp"),
        };
        assert_eq!(config.socket_path(), PathBuf::from("/tmp/nudock-4321.sock"));
        #[cfg(unix)]
        assert_eq!(
            config.resolve().unwrap(),
            TransportTarget::UnixSocket(PathBuf::from("/tmp/nudock-4321.sock"))
        );
    }

    #[test]
    fn tcp_kind_fails_fast() {
        let config = TransportConfig {
            kind: CommunicationKind::Tcp,
            ..TransportConfig::default()
        };
        let err = config.resolve().unwrap_err();
        assert!(matches!(err, TransportError::Unsupported("tcp")));
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn target_display() {
        assert_eq!(
            TransportTarget::Loopback { port: 99 }.to_string(),
            "127.0.0.1:99"
        );
        assert_eq!(
            TransportTarget::UnixSocket(PathBuf::from("/tmp/x.sock")).to_string(),
            "unix:/tmp/x.sock"
        );
    }

    #[test]
    fn loopback_listener_reports_picked_port() {
        let listener = Listener::bind(&TransportTarget::Loopback { port: 0 }).unwrap();
        let target = listener.local_target();
        assert!(matches!(target, TransportTarget::Loopback { port } if port != 0));

        let connect_target = target.clone();
        let handle = std::thread::spawn(move || {
            let mut stream = connect(&connect_target).unwrap();
            stream.write_all(b"ok").unwrap();
        });

        let mut accepted = listener.accept().unwrap();
        let mut buf = [0u8; 2];
        accepted.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
        handle.join().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn unix_listener_binds_resolved_path() {
        let dir = std::env::temp_dir().join(format!(
            "nudock-selector-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let config = TransportConfig {
            kind: CommunicationKind::UnixDomainSocket,
            port: 7,
            socket_dir: dir.clone(),
        };

        let target = config.resolve().unwrap();
        let listener = Listener::bind(&target).unwrap();
        assert_eq!(listener.local_target(), target);
        assert!(dir.join("nudock-7.sock").exists());

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
