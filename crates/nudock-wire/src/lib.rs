//! Request/response framing for nudock.
//!
//! One exchange is one request frame followed by one response frame. Every
//! frame is:
//! - a 2-byte magic number ("ND") for stream synchronization
//! - a 4-byte little-endian payload length
//! - a 2-byte little-endian frame kind (request or response)
//!
//! The payload is a JSON envelope ([`Request`] or [`Response`]) modelled on an
//! HTTP POST: a path, a status, a content type and a body.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameKind, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{Result, WireError};
pub use message::{
    Request, Response, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT, STATUS_BAD_REQUEST, STATUS_NOT_FOUND,
    STATUS_OK,
};
pub use reader::FrameReader;
pub use writer::FrameWriter;
