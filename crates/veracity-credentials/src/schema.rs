use dashmap::DashMap;
use serde_json::Value;
use std::path::Path;

use crate::error::CredentialError;

/// Schemas shipped with the verifier, as `(file stem, JSON)`.
const BUNDLED: [(&str, &str); 2] = [
    ("key-credential", include_str!("schemas/key-credential.json")),
    ("company-prefix", include_str!("schemas/company-prefix.json")),
];

/// JSON schemas served to external rule engines by id.
///
/// Every schema is reachable under its file stem and, when present, its
/// `$id`. Lookups are synchronous.
pub struct SchemaCache {
    schemas: DashMap<String, Vec<u8>>,
}

impl SchemaCache {
    /// Cache holding the bundled schemas.
    pub fn new() -> Result<Self, CredentialError> {
        let cache = Self::empty();
        for (name, schema) in BUNDLED {
            cache.insert(name, schema.as_bytes().to_vec())?;
        }
        Ok(cache)
    }

    pub fn empty() -> Self {
        Self {
            schemas: DashMap::new(),
        }
    }

    /// Bundled schemas plus every `*.json` file in `dir`, when given.
    pub fn with_dir(dir: Option<&Path>) -> Result<Self, CredentialError> {
        let cache = Self::new()?;
        if let Some(dir) = dir {
            cache.load_dir(dir)?;
        }
        Ok(cache)
    }

    /// Register a schema under `name` and its `$id`.
    pub fn insert(&self, name: &str, schema: Vec<u8>) -> Result<(), CredentialError> {
        let parsed: Value = serde_json::from_slice(&schema)
            .map_err(|e| CredentialError::InvalidSchema(format!("{}: {}", name, e)))?;
        if !parsed.is_object() {
            return Err(CredentialError::InvalidSchema(format!(
                "{}: schema must be a JSON object",
                name
            )));
        }

        if let Some(id) = parsed.get("$id").and_then(Value::as_str) {
            self.schemas.insert(id.to_string(), schema.clone());
        }
        self.schemas.insert(name.to_string(), schema);
        Ok(())
    }

    /// Load every `*.json` file in `dir`, keyed by file stem. Returns the
    /// number of files loaded.
    pub fn load_dir(&self, dir: &Path) -> Result<usize, CredentialError> {
        let unreadable = |e: std::io::Error| {
            CredentialError::InvalidSchema(format!("{}: {}", dir.display(), e))
        };

        let mut loaded = 0;
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path).map_err(unreadable)?;
            self.insert(stem, bytes)?;
            loaded += 1;
        }
        tracing::info!(dir = %dir.display(), loaded, "loaded JSON schemas");
        Ok(loaded)
    }

    /// Raw schema bytes for `id`.
    pub fn get(&self, id: &str) -> Result<Vec<u8>, CredentialError> {
        self.schemas
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CredentialError::SchemaNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
