use std::fmt;
use std::io::Read;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{Direction, Result, SchemaError, Violation};
use crate::strict::close_objects;

/// Compiled request and response validators for one request name.
///
/// Immutable once built.
pub struct SchemaPair {
    request: Validator,
    response: Validator,
    request_schema: Value,
    response_schema: Value,
}

impl SchemaPair {
    /// Read, parse and compile the schema document at `path`.
    pub fn load(path: &Path, config: &SchemaConfig) -> Result<Self> {
        let content = read_limited(path, config.max_schema_file_size)?;
        let document: Value = serde_json::from_str(&content)?;
        let pair = Self::from_document(&document, config)?;
        debug!(?path, "schema pair loaded");
        Ok(pair)
    }

    /// Compile a pair from an already-parsed schema document.
    pub fn from_document(document: &Value, config: &SchemaConfig) -> Result<Self> {
        let request_schema = section(document, Direction::Request)?;
        let response_schema = section(document, Direction::Response)?;

        Ok(Self {
            request: compile(&request_schema, Direction::Request, config)?,
            response: compile(&response_schema, Direction::Response, config)?,
            request_schema,
            response_schema,
        })
    }

    /// Validate `document` against the request or response shape.
    ///
    /// Reports the first violation only.
    pub fn validate(&self, direction: Direction, document: &Value) -> Result<()> {
        let validator = match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        };

        match validator.iter_errors(document).next() {
            None => Ok(()),
            Some(err) => Err(SchemaError::Rejected {
                direction,
                violation: Violation {
                    pointer: err.instance_path().to_string(),
                    instance: Value::clone(err.instance()),
                    message: err.to_string(),
                },
            }),
        }
    }

    pub fn validate_request(&self, document: &Value) -> Result<()> {
        self.validate(Direction::Request, document)
    }

    pub fn validate_response(&self, document: &Value) -> Result<()> {
        self.validate(Direction::Response, document)
    }

    /// The sub-schema a document of the given direction must match.
    pub fn expected(&self, direction: Direction) -> &Value {
        match direction {
            Direction::Request => &self.request_schema,
            Direction::Response => &self.response_schema,
        }
    }
}

impl fmt::Debug for SchemaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaPair")
            .field("request", &self.request_schema)
            .field("response", &self.response_schema)
            .finish()
    }
}

fn section(document: &Value, direction: Direction) -> Result<Value> {
    document
        .get("properties")
        .and_then(|properties| properties.get(direction.section()))
        .cloned()
        .ok_or(SchemaError::MissingSection(direction))
}

fn compile(schema: &Value, direction: Direction, config: &SchemaConfig) -> Result<Validator> {
    let mut schema = schema.clone();
    if config.strict_mode {
        close_objects(&mut schema);
    }
    jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed {
        direction,
        message: err.to_string(),
    })
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let load_failed = |reason: String| SchemaError::LoadFailed {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path).map_err(|err| load_failed(err.to_string()))?;
    let metadata = file
        .metadata()
        .map_err(|err| load_failed(err.to_string()))?;
    if !metadata.is_file() {
        return Err(load_failed("not a regular file".to_string()));
    }
    if metadata.len() > max_bytes as u64 {
        return Err(load_failed(format!(
            "file too large ({} bytes, max {max_bytes})",
            metadata.len()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| load_failed(err.to_string()))?;
    if content.len() > max_bytes {
        return Err(load_failed("file grew past the size limit while reading".to_string()));
    }

    Ok(content)
}
