use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig, FrameKind};
use crate::error::{Result, WireError};
use crate::message::{Request, Response};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                trace!(kind = %frame.kind, size = frame.payload.len(), "frame read");
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next frame and decode it as a [`Request`] envelope.
    ///
    /// A frame that decodes but carries a malformed envelope yields
    /// [`WireError::Envelope`]; the stream stays in sync in that case.
    pub fn read_request(&mut self) -> Result<Request> {
        let frame = self.expect_kind(FrameKind::Request)?;
        Ok(serde_json::from_slice(&frame.payload)?)
    }

    /// Read the next frame and decode it as a [`Response`] envelope.
    pub fn read_response(&mut self) -> Result<Response> {
        let frame = self.expect_kind(FrameKind::Response)?;
        Ok(serde_json::from_slice(&frame.payload)?)
    }

    fn expect_kind(&mut self, expected: FrameKind) -> Result<Frame> {
        let frame = self.read_frame()?;
        if frame.kind != expected {
            return Err(WireError::UnexpectedKind {
                expected,
                actual: frame.kind,
            });
        }
        Ok(frame)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, MAGIC};

    fn wire_of(frames: &[(FrameKind, &[u8])]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for (kind, payload) in frames {
            encode_frame(*kind, payload, &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn reads_request_envelope() {
        let payload = serde_json::to_vec(&Request::json("/ping", "\"hi\"")).unwrap();
        let mut reader = FrameReader::new(Cursor::new(wire_of(&[(
            FrameKind::Request,
            &payload,
        )])));

        let request = reader.read_request().unwrap();
        assert_eq!(request.path, "/ping");
        assert_eq!(request.body, "\"hi\"");
    }

    #[test]
    fn rejects_response_where_request_expected() {
        let payload = serde_json::to_vec(&Response::ok_json("{}")).unwrap();
        let mut reader = FrameReader::new(Cursor::new(wire_of(&[(
            FrameKind::Response,
            &payload,
        )])));

        let err = reader.read_request().unwrap_err();
        assert!(matches!(
            err,
            WireError::UnexpectedKind {
                expected: FrameKind::Request,
                actual: FrameKind::Response
            }
        ));
    }

    #[test]
    fn malformed_envelope_keeps_stream_in_sync() {
        let good = serde_json::to_vec(&Request::json("/next", "1")).unwrap();
        let mut reader = FrameReader::new(Cursor::new(wire_of(&[
            (FrameKind::Request, b"{not-an-envelope"),
            (FrameKind::Request, &good),
        ])));

        assert!(matches!(
            reader.read_request(),
            Err(WireError::Envelope(_))
        ));
        assert_eq!(reader.read_request().unwrap().path, "/next");
    }

    #[test]
    fn partial_reads_are_reassembled() {
        let payload = serde_json::to_vec(&Response::ok_json("{\"a\":1}")).unwrap();
        let byte_reader = ByteByByteReader {
            bytes: wire_of(&[(FrameKind::Response, &payload)]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let response = reader.read_response().unwrap();
        assert_eq!(response.body, "{\"a\":1}");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_slice(&MAGIC);
        partial.put_u32_le(16);
        partial.put_u16_le(1);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    #[test]
    fn configured_limit_applies() {
        let mut reader = FrameReader::with_config(
            Cursor::new(wire_of(&[(FrameKind::Request, &[b'x'; 64])])),
            FrameConfig {
                max_payload_size: 16,
            },
        );
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            WireError::PayloadTooLarge { size: 64, max: 16 }
        ));
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }
}
