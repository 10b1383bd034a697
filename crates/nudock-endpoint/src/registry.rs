//! Named handlers and the schema pairs that guard them.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nudock_schema::{SchemaConfig, SchemaPair, SchemaSet};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;
use crate::handler::Handler;
use crate::handshake::HANDSHAKE_NAME;

/// Outcome of a registration attempt that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The name was empty after stripping a leading `/`.
    SkippedEmpty,
    /// The name is used by the start-up handshake.
    SkippedReserved,
    /// A handler with that name already exists; the first one is kept.
    SkippedDuplicate,
    /// The endpoint already plays a role.
    SkippedStarted,
}

impl Registration {
    pub fn is_added(self) -> bool {
        self == Registration::Added
    }
}

/// Where a handler's schema pair comes from.
pub(crate) enum SchemaSource<'a> {
    /// `<schemas_dir>/<name>.schema.json`.
    Default,
    File(&'a Path),
    Document(&'a Value),
}

/// A resolved route: the handler plus its schema pair.
pub(crate) struct Route<'a> {
    pub name: &'a str,
    pub handler: &'a dyn Handler,
    pub schemas: &'a SchemaPair,
}

/// Request handlers keyed by normalized name.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
    schemas: SchemaSet,
    schemas_dir: PathBuf,
}

impl HandlerRegistry {
    pub fn new(schemas_dir: impl Into<PathBuf>, config: SchemaConfig) -> Self {
        Self {
            handlers: HashMap::new(),
            schemas: SchemaSet::with_config(config),
            schemas_dir: schemas_dir.into(),
        }
    }

    /// Schema file the default source resolves to for `name`.
    pub fn default_schema_path(&self, name: &str) -> PathBuf {
        self.schemas_dir
            .join(format!("{}.schema.json", normalize_name(name)))
    }

    pub(crate) fn register(
        &mut self,
        name: &str,
        handler: Arc<dyn Handler>,
        source: SchemaSource<'_>,
    ) -> Result<Registration> {
        let name = normalize_name(name);
        if name.is_empty() {
            warn!("refusing to register a handler with an empty name");
            return Ok(Registration::SkippedEmpty);
        }
        if name == HANDSHAKE_NAME {
            warn!(name, "refusing to register a handler under the handshake name");
            return Ok(Registration::SkippedReserved);
        }
        if self.handlers.contains_key(name) {
            warn!(name, "handler already registered; keeping the first one");
            return Ok(Registration::SkippedDuplicate);
        }

        match source {
            SchemaSource::Default => {
                let path = self.default_schema_path(name);
                self.schemas.load(name, &path)?;
                info!(name, path = %path.display(), "handler registered");
            }
            SchemaSource::File(path) => {
                self.schemas.load(name, path)?;
                info!(name, path = %path.display(), "handler registered");
            }
            SchemaSource::Document(document) => {
                self.schemas.register_document(name, document)?;
                info!(name, "handler registered with inline schema");
            }
        }
        self.handlers.insert(name.to_string(), handler);

        Ok(Registration::Added)
    }

    /// Look up the route for a request path (`/name` or `name`).
    pub(crate) fn route(&self, path: &str) -> Option<Route<'_>> {
        let (name, handler) = self.handlers.get_key_value(normalize_name(path))?;
        let schemas = self.schemas.get(name)?;
        Some(Route {
            name,
            handler: handler.as_ref(),
            schemas,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(normalize_name(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn schemas_dir(&self) -> &Path {
        &self.schemas_dir
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.names())
            .field("schemas_dir", &self.schemas_dir)
            .finish()
    }
}

/// Strip one leading `/` so that `/ping` and `ping` name the same route.
pub(crate) fn normalize_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}
