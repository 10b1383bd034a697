use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig, FrameKind};
use crate::error::{Result, WireError};
use crate::message::{Request, Response};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
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

    /// Encode and send a payload as one frame of the given kind (blocking).
    pub fn send(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(WireError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(kind, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(WireError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }

        self.flush()
    }

    /// Frame and send a request envelope.
    pub fn send_request(&mut self, request: &Request) -> Result<()> {
        let payload = serde_json::to_vec(request)?;
        self.send(FrameKind::Request, &payload)
    }

    /// Frame and send a response envelope.
    pub fn send_response(&mut self, response: &Response) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        self.send(FrameKind::Response, &payload)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::decode_frame;
    use crate::reader::FrameReader;

    #[test]
    fn response_envelope_reaches_reader() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .send_response(&Response::bad_request("validation failed"))
            .unwrap();

        let bytes = writer.into_inner().into_inner();
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let response = reader.read_response().unwrap();
        assert_eq!(response, Response::bad_request("validation failed"));
    }

    #[test]
    fn request_frame_kind_on_the_wire() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_request(&Request::json("/a", "1")).unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let frame = decode_frame(&mut wire, usize::MAX).unwrap().unwrap();
        assert_eq!(frame.kind, FrameKind::Request);
    }

    #[test]
    fn oversized_payload_is_rejected_before_writing() {
        let mut writer = FrameWriter::with_config(
            Cursor::new(Vec::<u8>::new()),
            FrameConfig {
                max_payload_size: 4,
            },
        );
        let err = writer.send(FrameKind::Request, b"too-long").unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { size: 8, max: 4 }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn zero_length_write_reports_closed() {
        let mut writer = FrameWriter::new(ClosedWriter);
        let err = writer.send(FrameKind::Response, b"x").unwrap_err();
        assert!(matches!(err, WireError::ConnectionClosed));
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
