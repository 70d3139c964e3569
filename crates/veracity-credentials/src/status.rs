//! Status-list checking for `credentialStatus` entries.
//!
//! Each entry points at a status-list credential. That credential is loaded,
//! verified recursively through [`VerifyCredential`], matched against the
//! entry (purpose, issuer, types), and its bitstring is read at the entry's
//! index. Entries are checked concurrently; a failing entry never affects
//! its siblings.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use veracity_core::types::has_type;
use veracity_core::{
    issuer_id, StatusConfig, StatusEntryResult, StatusResult, StatusScheme, VerificationError,
    VerificationResult, VerifyOptions,
};
use veracity_loader::DocumentLoader;

use crate::error::StatusError;
use crate::status_list::StatusList;
use crate::token;

/// Re-entry point for verifying status-list credentials.
#[async_trait]
pub trait VerifyCredential: Send + Sync {
    async fn verify_with_context(
        &self,
        input: &Value,
        options: &VerifyOptions,
        ctx: &VerificationContext,
    ) -> VerificationResult;
}

/// Recursion state carried through nested status-list verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationContext {
    depth: usize,
    visited: HashSet<String>,
}

impl VerificationContext {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn has_visited(&self, uri: &str) -> bool {
        self.visited.contains(uri)
    }

    /// Context for verifying the status list at `uri`.
    pub fn descend(&self, uri: &str, max_depth: usize) -> Result<Self, StatusError> {
        if self.visited.contains(uri) {
            return Err(StatusError::Cycle(uri.to_string()));
        }
        if self.depth >= max_depth {
            return Err(StatusError::DepthExceeded(max_depth));
        }
        let mut visited = self.visited.clone();
        visited.insert(uri.to_string());
        Ok(Self {
            depth: self.depth + 1,
            visited,
        })
    }
}

/// A status entry that passed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEntry {
    pub raw: Value,
    pub purpose: Option<String>,
    pub index: u64,
    pub list_credential: String,
}

/// Checks `credentialStatus` entries against their status lists.
pub struct StatusListVerifier {
    loader: Arc<dyn DocumentLoader>,
    config: StatusConfig,
}

impl StatusListVerifier {
    pub fn new(loader: Arc<dyn DocumentLoader>, config: StatusConfig) -> Self {
        Self { loader, config }
    }

    /// Pick the scheme for a credential: Bitstring when any entry uses it,
    /// otherwise the type of the first entry.
    pub fn scheme_for(credential: &Value) -> Result<StatusScheme, StatusError> {
        let entries = raw_entries(credential);
        let first = entries.first().ok_or(StatusError::NoEntries)?;

        let bitstring = StatusScheme::BitstringStatusList.entry_type();
        if entries.iter().any(|e| entry_type(e) == Some(bitstring)) {
            return Ok(StatusScheme::BitstringStatusList);
        }
        let first_type = entry_type(first).unwrap_or_default();
        StatusScheme::from_entry_type(first_type)
            .ok_or_else(|| StatusError::UnknownType(first_type.to_string()))
    }

    /// Extract and validate the entries relevant to `scheme`.
    pub fn entries(credential: &Value, scheme: StatusScheme) -> Result<Vec<StatusEntry>, StatusError> {
        let raw: Vec<&Value> = raw_entries(credential)
            .into_iter()
            .filter(|e| !scheme.filters_entries() || entry_type(e) == Some(scheme.entry_type()))
            .collect();
        if raw.is_empty() {
            return Err(StatusError::NoEntries);
        }
        raw.into_iter().map(|e| validate_entry(e, scheme)).collect()
    }

    /// Check every status entry of `credential`.
    ///
    /// Structural problems fail the whole check before any I/O. Once entries
    /// are valid, failures are confined to the entry that caused them.
    pub async fn check(
        &self,
        credential: &Value,
        scheme: StatusScheme,
        ctx: &VerificationContext,
        verifier: &dyn VerifyCredential,
    ) -> Result<StatusResult, StatusError> {
        let entries = Self::entries(credential, scheme)?;
        tracing::debug!(%scheme, entries = entries.len(), depth = ctx.depth(), "checking credential status");

        let checks = entries.into_iter().map(|entry| async move {
            match self.check_entry(credential, &entry, scheme, ctx, verifier).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::debug!(list = %entry.list_credential, error = %e, "status entry failed");
                    StatusEntryResult {
                        verified: false,
                        credential_status: entry.raw,
                        error: Some(VerificationError::from(e).report()),
                    }
                }
            }
        });
        Ok(StatusResult::from_entries(join_all(checks).await))
    }

    async fn check_entry(
        &self,
        credential: &Value,
        entry: &StatusEntry,
        scheme: StatusScheme,
        ctx: &VerificationContext,
        verifier: &dyn VerifyCredential,
    ) -> Result<StatusEntryResult, StatusError> {
        let uri = entry.list_credential.as_str();
        let child_ctx = ctx.descend(uri, self.config.max_recursion_depth)?;

        let loaded = self
            .loader
            .load(uri)
            .await
            .map_err(|e| StatusError::ListUnavailable {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
        let list_credential = list_credential_view(&loaded.document)?;
        let subject = credential_subject(&list_credential)?;

        if let Some(purpose) = &entry.purpose {
            let list_purpose = subject
                .get("statusPurpose")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if list_purpose != purpose {
                return Err(StatusError::PurposeMismatch {
                    entry: purpose.clone(),
                    list: list_purpose.to_string(),
                });
            }
        }

        let verification = verifier
            .verify_with_context(&loaded.document, &VerifyOptions::default(), &child_ctx)
            .await;
        if !verification.verified {
            let reason = verification
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "not verified".into());
            return Err(StatusError::ListVerification {
                uri: uri.to_string(),
                reason,
            });
        }

        if self.config.verify_matching_issuers {
            let credential_issuer = issuer_id(credential).unwrap_or_default();
            let list_issuer = issuer_id(&list_credential).unwrap_or_default();
            if credential_issuer != list_issuer {
                return Err(StatusError::IssuerMismatch {
                    credential: credential_issuer.to_string(),
                    list: list_issuer.to_string(),
                });
            }
        }

        if !has_type(&list_credential, scheme.list_credential_type()) {
            return Err(StatusError::InvalidList(format!(
                "{} is not a {}",
                uri,
                scheme.list_credential_type()
            )));
        }
        if !has_type(subject, scheme.list_type()) {
            return Err(StatusError::InvalidList(format!(
                "credentialSubject type must be {}",
                scheme.list_type()
            )));
        }

        let encoded = subject
            .get("encodedList")
            .and_then(Value::as_str)
            .ok_or_else(|| StatusError::InvalidList("credentialSubject has no encodedList".into()))?;
        let set = StatusList::decode(encoded)?.get(entry.index)?;

        let error = set.then(|| {
            let purpose = entry.purpose.as_deref().unwrap_or("revocation");
            VerificationError::Validation(format!(
                "{} status is set at index {}",
                purpose, entry.index
            ))
            .report()
        });
        Ok(StatusEntryResult {
            verified: !set,
            credential_status: entry.raw.clone(),
            error,
        })
    }
}

fn raw_entries(credential: &Value) -> Vec<&Value> {
    match credential.get("credentialStatus") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(entry @ Value::Object(_)) => vec![entry],
        _ => Vec::new(),
    }
}

fn entry_type(entry: &Value) -> Option<&str> {
    entry.get("type").and_then(Value::as_str)
}

fn validate_entry(entry: &Value, scheme: StatusScheme) -> Result<StatusEntry, StatusError> {
    let invalid = |reason: String| StatusError::InvalidEntry(reason);

    let found_type = entry_type(entry).unwrap_or_default();
    if found_type != scheme.entry_type() {
        return Err(invalid(format!(
            "expected type {}, got '{}'",
            scheme.entry_type(),
            found_type
        )));
    }

    let purpose = if scheme.has_purpose() {
        let purpose = entry
            .get("statusPurpose")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("statusPurpose must be a string".into()))?;
        Some(purpose.to_string())
    } else {
        None
    };

    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("id must be a string".into()))?;
    let list_credential = entry
        .get(scheme.list_credential_field())
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("{} must be a string", scheme.list_credential_field())))?;
    if id == list_credential {
        return Err(invalid(format!(
            "id must differ from {}",
            scheme.list_credential_field()
        )));
    }

    let index = match entry.get(scheme.index_field()) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .ok_or_else(|| invalid(format!("{} must be a non-negative integer", scheme.index_field())))?;

    Ok(StatusEntry {
        raw: entry.clone(),
        purpose,
        index,
        list_credential: list_credential.to_string(),
    })
}

/// The credential object of a loaded status list: the JSON-LD document, or
/// the `vc` claim (else the payload) of a token, with `iss` as issuer.
fn list_credential_view(document: &Value) -> Result<Value, StatusError> {
    match document {
        Value::Object(_) => Ok(document.clone()),
        Value::String(compact) => {
            let decoded = token::decode(compact)
                .map_err(|e| StatusError::InvalidList(e.to_string()))?;
            Ok(credential_view(&decoded.payload))
        }
        _ => Err(StatusError::InvalidList(
            "status list credential must be an object or a token".into(),
        )),
    }
}

/// Credential view of token claims: the `vc` object (falling back to the
/// whole payload), with `iss` copied in as `issuer` when absent.
pub fn credential_view(payload: &Value) -> Value {
    let mut view = match payload.get("vc") {
        Some(vc @ Value::Object(_)) => vc.clone(),
        _ => payload.clone(),
    };
    if let (Some(obj), Some(iss)) = (view.as_object_mut(), payload.get("iss")) {
        if !obj.contains_key("issuer") {
            obj.insert("issuer".into(), iss.clone());
        }
    }
    view
}

fn credential_subject(credential: &Value) -> Result<&Value, StatusError> {
    match credential.get("credentialSubject") {
        Some(Value::Array(items)) => items.first(),
        Some(subject @ Value::Object(_)) => Some(subject),
        _ => None,
    }
    .ok_or_else(|| StatusError::InvalidList("status list credential has no credentialSubject".into()))
}
