//! Callbacks handed to an external rule engine.
//!
//! The engine walks credential chains on its own and calls back into the
//! verifier to load, verify, and look up schemas.

use serde_json::Value;
use std::sync::Arc;
use veracity_core::{VerificationResult, VerifierConfig, VerifyOptions};

use crate::dispatcher::Verifier;
use crate::error::CredentialError;
use crate::schema::SchemaCache;

#[derive(Clone)]
pub struct ExternalHooks {
    verifier: Arc<Verifier>,
    schemas: Arc<SchemaCache>,
}

impl ExternalHooks {
    pub fn new(verifier: Arc<Verifier>, schemas: Arc<SchemaCache>) -> Self {
        Self { verifier, schemas }
    }

    /// Hooks over a fresh verifier, with bundled schemas plus `schemas.dir`.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, CredentialError> {
        let verifier = Verifier::from_config(config)?;
        let schemas = SchemaCache::with_dir(config.schemas.dir.as_deref())?;
        Ok(Self::new(Arc::new(verifier), Arc::new(schemas)))
    }

    /// Fetch a credential the engine found by reference.
    pub async fn external_credential_loader(&self, url: &str) -> Result<Value, CredentialError> {
        tracing::debug!(%url, "loading external credential");
        Ok(self.verifier.loader().load(url).await?.document)
    }

    pub async fn external_credential_verification(
        &self,
        credential: &Value,
        challenge: Option<&str>,
        domain: Option<&str>,
    ) -> VerificationResult {
        let options = VerifyOptions {
            challenge: challenge.map(str::to_string),
            domain: domain.map(str::to_string),
        };
        self.verifier.verify(credential, &options).await
    }

    pub fn external_json_schema_loader(&self, schema_id: &str) -> Result<Vec<u8>, CredentialError> {
        self.schemas.get(schema_id)
    }
}
