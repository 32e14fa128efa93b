//! Schema Registry for Version Management
//!
//! Stored files are read back with the schema they were written with, so the
//! registry keeps every version and tracks the latest one per base name.

use std::collections::HashMap;
use std::sync::RwLock;

use apache_avro::Schema;

use crate::{schemas, SchemaError};

/// Thread-safe schema registry with version tracking
pub struct SchemaRegistry {
    /// Schemas indexed by qualified name (`series_row_v1`)
    schemas: RwLock<HashMap<String, Schema>>,

    /// Base name -> highest registered version number
    latest: RwLock<HashMap<String, u32>>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            latest: RwLock::new(HashMap::new()),
        }
    }

    /// Registry holding every built-in LoEco schema
    pub fn with_defaults() -> Result<Self, SchemaError> {
        let registry = Self::new();
        registry.register(schemas::SERIES_ROW_V1, schemas::series_row_v1()?)?;
        Ok(registry)
    }

    /// Register `schema` under a qualified `<base>_v<N>` name
    pub fn register(&self, qualified_name: &str, schema: Schema) -> Result<(), SchemaError> {
        let (base, version) = split_version(qualified_name)
            .ok_or_else(|| SchemaError::ParseError(format!("missing _v<N> suffix: {qualified_name}")))?;

        {
            let mut schemas = self.schemas.write().map_err(|_| SchemaError::LockPoisoned)?;
            if schemas.contains_key(qualified_name) {
                return Err(SchemaError::ValidationError(format!(
                    "schema {qualified_name} already registered"
                )));
            }
            schemas.insert(qualified_name.to_string(), schema);
        }

        let mut latest = self.latest.write().map_err(|_| SchemaError::LockPoisoned)?;
        let entry = latest.entry(base.to_string()).or_insert(version);
        if version > *entry {
            *entry = version;
        }
        Ok(())
    }

    /// Get a schema by qualified name
    pub fn get(&self, qualified_name: &str) -> Result<Schema, SchemaError> {
        let schemas = self.schemas.read().map_err(|_| SchemaError::LockPoisoned)?;
        schemas
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(qualified_name.to_string()))
    }

    /// Highest registered version of `base_name`
    pub fn get_latest(&self, base_name: &str) -> Result<Schema, SchemaError> {
        let version = {
            let latest = self.latest.read().map_err(|_| SchemaError::LockPoisoned)?;
            *latest
                .get(base_name)
                .ok_or_else(|| SchemaError::NotFound(format!("no versions of {base_name}")))?
        };
        self.get(&format!("{base_name}_v{version}"))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `series_row_v12` -> `("series_row", 12)`
fn split_version(qualified_name: &str) -> Option<(&str, u32)> {
    let pos = qualified_name.rfind("_v")?;
    let version = qualified_name[pos + 2..].parse().ok()?;
    Some((&qualified_name[..pos], version))
}
