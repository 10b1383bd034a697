use std::fmt;
use std::path::PathBuf;

use serde_json::Value;

/// Which half of an exchange a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Request,
    Response,
}

impl Direction {
    /// Key of this half inside a schema document's `properties`.
    pub fn section(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// The first schema violation found in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// JSON pointer to the violating location ("" for the document root).
    pub pointer: String,
    /// The offending value.
    pub instance: Value,
    /// Human-readable explanation from the validator.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pointer: \"{}\" instance: {} error message: \"{}\"",
            self.pointer, self.instance, self.message
        )
    }
}

/// Errors that can occur while loading schemas or validating documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("failed to load schema {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },

    /// The schema file is not a JSON document.
    #[error("schema is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The schema document lacks `properties.request` or `properties.response`.
    #[error("schema document has no \"properties.{0}\" section")]
    MissingSection(Direction),

    /// A sub-schema could not be compiled.
    #[error("failed to compile {direction} schema: {message}")]
    CompileFailed { direction: Direction, message: String },

    /// A document does not match its schema.
    #[error("{direction} validation failed: {violation}")]
    Rejected {
        direction: Direction,
        violation: Violation,
    },

    /// No schema pair is registered under the given request name.
    #[error("no schema registered for request \"{0}\"")]
    NotRegistered(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
