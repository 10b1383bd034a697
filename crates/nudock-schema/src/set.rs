use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::config::SchemaConfig;
use crate::error::{Direction, Result, SchemaError};
use crate::pair::SchemaPair;

/// Schema pairs keyed by request name.
#[derive(Debug, Default)]
pub struct SchemaSet {
    pairs: HashMap<String, SchemaPair>,
    config: SchemaConfig,
}

impl SchemaSet {
    pub fn new() -> Self {
        Self::with_config(SchemaConfig::default())
    }

    pub fn with_config(config: SchemaConfig) -> Self {
        Self {
            pairs: HashMap::new(),
            config,
        }
    }

    /// Load the pair for `name` from `path`, replacing any previous pair.
    pub fn load(&mut self, name: &str, path: &Path) -> Result<()> {
        let pair = SchemaPair::load(path, &self.config)?;
        self.pairs.insert(name.to_string(), pair);
        Ok(())
    }

    /// Compile the pair for `name` from an in-memory schema document.
    pub fn register_document(&mut self, name: &str, document: &Value) -> Result<()> {
        let pair = SchemaPair::from_document(document, &self.config)?;
        self.pairs.insert(name.to_string(), pair);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SchemaPair> {
        self.pairs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    /// Validate `document` against the `direction` shape registered for `name`.
    pub fn validate(&self, name: &str, direction: Direction, document: &Value) -> Result<()> {
        self.pairs
            .get(name)
            .ok_or_else(|| SchemaError::NotRegistered(name.to_string()))?
            .validate(direction, document)
    }

    /// Registered request names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pairs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }
}
