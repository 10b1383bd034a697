use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// TCP listener bound to the IPv4 loopback interface.
pub struct LoopbackSocket {
    listener: TcpListener,
    addr: SocketAddr,
}

impl LoopbackSocket {
    /// Bind and listen on `127.0.0.1:<port>`.
    ///
    /// Port 0 asks the OS for a free port; see [`local_port`](Self::local_port).
    pub fn bind(port: u16) -> Result<Self> {
        let requested = loopback_addr(port);
        let listener = TcpListener::bind(requested).map_err(|e| TransportError::Bind {
            address: requested.to_string(),
            source: e,
        })?;
        let addr = listener.local_addr()?;

        info!(%addr, "listening on loopback");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted loopback connection");
        Ok(IpcStream::from_tcp(stream))
    }

    /// Connect to a loopback listener on `port` (blocking).
    pub fn connect(port: u16) -> Result<IpcStream> {
        let addr = loopback_addr(port);
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            address: addr.to_string(),
            source: e,
        })?;
        stream.set_nodelay(true)?;
        debug!(%addr, "connected to loopback");
        Ok(IpcStream::from_tcp(stream))
    }

    /// The port actually bound.
    pub fn local_port(&self) -> u16 {
        self.addr.port()
    }
}

fn loopback_addr(port: u16) -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}
