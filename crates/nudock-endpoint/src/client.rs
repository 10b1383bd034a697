use nudock_transport::{connect, IpcStream, TransportTarget};
use nudock_wire::{FrameConfig, FrameReader, FrameWriter, Request, Response};
use tracing::debug;

use crate::error::Result;

/// A connected client: one stream, one request in flight at a time.
pub(crate) struct ClientConnection {
    target: TransportTarget,
    reader: FrameReader<IpcStream>,
    writer: FrameWriter<IpcStream>,
}

impl ClientConnection {
    pub(crate) fn open(target: TransportTarget, config: FrameConfig) -> Result<Self> {
        let stream = connect(&target)?;
        let reader_stream = stream.try_clone()?;
        debug!(%target, transport = stream.transport_name(), "connected");

        Ok(Self {
            target,
            reader: FrameReader::with_config(reader_stream, config.clone()),
            writer: FrameWriter::with_config(stream, config),
        })
    }

    /// Send `body` to `path` and wait for the reply.
    pub(crate) fn post(&mut self, path: &str, body: String) -> Result<Response> {
        self.writer.send_request(&Request::json(path, body))?;
        Ok(self.reader.read_response()?)
    }

    pub(crate) fn target(&self) -> &TransportTarget {
        &self.target
    }
}

impl Drop for ClientConnection {
    fn drop(&mut self) {
        let _ = self.writer.get_ref().shutdown();
    }
}
