//! Accept loop and per-connection request loops.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nudock_transport::{connect, IpcStream, Listener, TransportError, TransportTarget};
use nudock_wire::{FrameConfig, FrameReader, FrameWriter, Response, WireError};
use tracing::{debug, info, info_span, warn};

use crate::dispatch::{AfterReply, Dispatched, Dispatcher};
use crate::error::Result;

const LISTEN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stops a running server from any thread.
///
/// Cloning is cheap; all clones control the same server.
#[derive(Debug, Clone, Default)]
pub struct ServerHandle {
    inner: Arc<HandleState>,
}

#[derive(Debug, Default)]
struct HandleState {
    stopped: AtomicBool,
    target: Mutex<Option<TransportTarget>>,
}

impl ServerHandle {
    /// Ask the server to stop accepting connections and return from
    /// `start_server`. Idempotent.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("server stop requested");
        self.wake();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Where the server is listening, once it has bound.
    pub fn local_target(&self) -> Option<TransportTarget> {
        self.inner
            .target
            .lock()
            .ok()
            .and_then(|target| target.clone())
    }

    /// Block until the server has bound or `timeout` elapses.
    pub fn wait_until_listening(&self, timeout: Duration) -> Option<TransportTarget> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(target) = self.local_target() {
                return Some(target);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(LISTEN_POLL_INTERVAL);
        }
    }

    fn arm(&self, target: TransportTarget) {
        if let Ok(mut slot) = self.inner.target.lock() {
            *slot = Some(target);
        }
    }

    fn disarm(&self) {
        if let Ok(mut slot) = self.inner.target.lock() {
            *slot = None;
        }
    }

    // Unblock a pending accept with a throwaway connection.
    fn wake(&self) {
        if let Some(target) = self.local_target() {
            if let Err(err) = connect(&target) {
                debug!(%err, "wake-up connection failed");
            }
        }
    }
}

struct Connection {
    control: IpcStream,
    worker: JoinHandle<()>,
}

/// Accept connections until `handle` is stopped, serving each on its own
/// thread. Open connections are shut down and joined before returning.
pub(crate) fn run(
    listener: &Listener,
    dispatcher: Arc<Dispatcher>,
    handle: &ServerHandle,
    frame_config: &FrameConfig,
) -> Result<()> {
    handle.arm(listener.local_target());
    let next_id = AtomicU64::new(1);
    let mut connections: Vec<Connection> = Vec::new();

    let result = loop {
        if handle.is_stopped() {
            break Ok(());
        }

        let stream = match listener.accept() {
            Ok(stream) => stream,
            Err(err) if handle.is_stopped() => {
                debug!(%err, "accept interrupted by stop");
                break Ok(());
            }
            Err(err) => break Err(err.into()),
        };
        if handle.is_stopped() {
            break Ok(());
        }

        connections.retain(|connection| !connection.worker.is_finished());
        let id = next_id.fetch_add(1, Ordering::Relaxed);
        match spawn_connection(id, stream, &dispatcher, handle, frame_config) {
            Ok(connection) => connections.push(connection),
            Err(err) => warn!(connection = id, %err, "failed to start connection thread"),
        }
    };

    handle.disarm();
    for connection in connections {
        let _ = connection.control.shutdown();
        if connection.worker.join().is_err() {
            warn!("connection thread panicked");
        }
    }
    info!("server stopped");

    result
}

fn spawn_connection(
    id: u64,
    stream: IpcStream,
    dispatcher: &Arc<Dispatcher>,
    handle: &ServerHandle,
    frame_config: &FrameConfig,
) -> Result<Connection> {
    let control = stream.try_clone()?;
    let reader_stream = stream.try_clone()?;
    let dispatcher = Arc::clone(dispatcher);
    let handle = handle.clone();
    let reader = FrameReader::with_config(reader_stream, frame_config.clone());
    let writer = FrameWriter::with_config(stream, frame_config.clone());

    let worker = thread::Builder::new()
        .name(format!("nudock-conn-{id}"))
        .spawn(move || {
            let _span = info_span!("connection", id).entered();
            serve_connection(reader, writer, &dispatcher, &handle);
        })
        .map_err(TransportError::Io)?;

    Ok(Connection { control, worker })
}

fn serve_connection(
    mut reader: FrameReader<IpcStream>,
    mut writer: FrameWriter<IpcStream>,
    dispatcher: &Dispatcher,
    handle: &ServerHandle,
) {
    let stream = reader.get_ref();
    debug!(
        transport = stream.transport_name(),
        peer = ?stream.peer_credentials(),
        "connection opened"
    );
    serve_requests(&mut reader, &mut writer, dispatcher, handle);

    // The accept loop holds a clone of this stream; the peer must see EOF.
    if let Err(err) = reader.get_ref().shutdown() {
        debug!(%err, "connection shutdown failed");
    }
}

fn serve_requests(
    reader: &mut FrameReader<IpcStream>,
    writer: &mut FrameWriter<IpcStream>,
    dispatcher: &Dispatcher,
    handle: &ServerHandle,
) {
    loop {
        let request = match reader.read_request() {
            Ok(request) => request,
            Err(WireError::ConnectionClosed) => {
                debug!("connection closed by peer");
                return;
            }
            Err(err @ (WireError::Envelope(_) | WireError::UnexpectedKind { .. })) => {
                warn!(%err, "malformed request");
                let reply = Response::bad_request(format!("Server could not read request: {err}"));
                if let Err(err) = writer.send_response(&reply) {
                    warn!(%err, "failed to send reply");
                    return;
                }
                continue;
            }
            Err(err) => {
                if !handle.is_stopped() {
                    warn!(%err, "connection read failed");
                }
                return;
            }
        };

        debug!(path = %request.path, "request received");
        let Dispatched { response, after } = dispatcher.dispatch(&request);
        if let Err(err) = send_reply(writer, &response) {
            warn!(path = %request.path, %err, "failed to send reply");
            return;
        }
        if after == AfterReply::StopAccepting {
            handle.stop();
            return;
        }
    }
}

/// Send `response`, replacing it with a 400 when it exceeds the frame limit.
fn send_reply(
    writer: &mut FrameWriter<IpcStream>,
    response: &Response,
) -> std::result::Result<(), WireError> {
    match writer.send_response(response) {
        Err(WireError::PayloadTooLarge { size, max }) => {
            warn!(size, max, "reply exceeds the message size limit");
            writer.send_response(&Response::bad_request(format!(
                "Server response too large: {size} bytes, max {max}"
            )))
        }
        other => other,
    }
}
