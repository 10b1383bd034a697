use crate::codec::FrameKind;

/// Errors that can occur while framing or unframing exchanges.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4E44 \"ND\")")]
    InvalidMagic,

    /// The frame header names a kind this version does not know.
    #[error("unknown frame kind {0}")]
    UnknownKind(u16),

    /// A frame arrived out of turn (e.g. a response where a request was due).
    #[error("expected {expected} frame, got {actual}")]
    UnexpectedKind {
        expected: FrameKind,
        actual: FrameKind,
    },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame payload is not a valid envelope.
    #[error("malformed envelope: {0}")]
    Envelope(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, WireError>;
