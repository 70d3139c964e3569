use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{ErrorReport, VerificationError};

/// Base type every credential carries.
pub const VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";
/// Base type every presentation carries.
pub const VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";
/// Wrapper type carrying a compact token as its `id` data URL.
pub const ENVELOPED_VERIFIABLE_CREDENTIAL: &str = "EnvelopedVerifiableCredential";

/// Read the `type` labels of a JSON-LD object (string or array form).
pub fn type_labels(value: &Value) -> Vec<&str> {
    match value.get("type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Whether the object's `type` set contains `label`.
pub fn has_type(value: &Value, label: &str) -> bool {
    type_labels(value).contains(&label)
}

/// Resolve the issuer identifier of a credential or token payload.
///
/// Accepts `issuer` or `iss`, each either a bare string or an object with `id`.
pub fn issuer_id(value: &Value) -> Option<&str> {
    let issuer = value.get("issuer").or_else(|| value.get("iss"))?;
    match issuer {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    }
}

/// Strip a `data:<media-type>,` prefix from an enveloped credential id.
pub fn strip_data_url(id: &str) -> &str {
    if let Some(rest) = id.strip_prefix("data:") {
        if let Some((_, token)) = rest.split_once(',') {
            return token;
        }
    }
    id
}

/// Closed classification of an untyped verification input.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifiableInput {
    /// A compact JWT or SD-JWT.
    Token(String),
    /// An enveloped credential, already unwrapped to its token.
    Enveloped(String),
    /// A JSON-LD credential with an embedded proof.
    Credential(Value),
    /// A JSON-LD presentation with an embedded proof.
    Presentation(Value),
}

impl VerifiableInput {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token(t) | Self::Enveloped(t) if t.contains('~') => "sd-jwt",
            Self::Token(_) => "jwt",
            Self::Enveloped(_) => "enveloped-jwt",
            Self::Credential(_) => "credential",
            Self::Presentation(_) => "presentation",
        }
    }
}

/// Classify an input into the variant that decides its verification path.
pub fn classify(input: &Value) -> Result<VerifiableInput, VerificationError> {
    match input {
        Value::String(s) => {
            let token = s.trim();
            if token.is_empty() {
                return Err(VerificationError::Classification(
                    "empty string is not a token".into(),
                ));
            }
            Ok(VerifiableInput::Token(token.to_string()))
        }
        Value::Object(_) => {
            if let Some(token) = enveloped_token(input)? {
                return Ok(VerifiableInput::Enveloped(token));
            }
            if has_type(input, VERIFIABLE_PRESENTATION) {
                Ok(VerifiableInput::Presentation(input.clone()))
            } else if has_type(input, VERIFIABLE_CREDENTIAL) {
                Ok(VerifiableInput::Credential(input.clone()))
            } else {
                Err(VerificationError::Classification(format!(
                    "type must include {} or {}",
                    VERIFIABLE_CREDENTIAL, VERIFIABLE_PRESENTATION
                )))
            }
        }
        other => Err(VerificationError::Classification(format!(
            "unsupported input: expected a string or an object, got {}",
            json_kind(other)
        ))),
    }
}

fn enveloped_token(input: &Value) -> Result<Option<String>, VerificationError> {
    let wrapper = if has_type(input, ENVELOPED_VERIFIABLE_CREDENTIAL) {
        input
    } else if has_type(input, VERIFIABLE_PRESENTATION) {
        // Presentations verify their own proof; embedded envelopes are
        // unwrapped per credential.
        return Ok(None);
    } else {
        match input.get("verifiableCredential") {
            Some(inner) if has_type(inner, ENVELOPED_VERIFIABLE_CREDENTIAL) => inner,
            _ => return Ok(None),
        }
    };

    let id = wrapper.get("id").and_then(Value::as_str).ok_or_else(|| {
        VerificationError::Classification("enveloped credential has no string id".into())
    })?;
    Ok(Some(strip_data_url(id).to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Caller-supplied parameters for presentation proofs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Expected proof challenge (SD-JWT: key-binding nonce).
    pub challenge: Option<String>,
    /// Expected proof domain (SD-JWT: key-binding audience).
    pub domain: Option<String>,
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// Outcome of checking a single proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofResult {
    pub verified: bool,
    /// The proof object that was checked.
    pub proof: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl ProofResult {
    pub fn passed(proof: Value) -> Self {
        Self {
            verified: true,
            proof,
            error: None,
        }
    }

    pub fn failed(proof: Value, err: &VerificationError) -> Self {
        Self {
            verified: false,
            proof,
            error: Some(err.report()),
        }
    }
}

/// Outcome of checking one `credentialStatus` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntryResult {
    pub verified: bool,
    /// The status entry that was checked.
    pub credential_status: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// Aggregate status outcome: verified iff every entry is verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub verified: bool,
    pub results: Vec<StatusEntryResult>,
}

impl StatusResult {
    /// AND-aggregate per-entry results. An empty set never verifies.
    pub fn from_entries(results: Vec<StatusEntryResult>) -> Self {
        let verified = !results.is_empty() && results.iter().all(|r| r.verified);
        Self { verified, results }
    }
}

/// Result of verifying one credential, presentation, or token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub verified: bool,
    /// Per-proof outcomes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<ProofResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_result: Option<StatusResult>,
    /// Per-credential outcomes for presentations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_results: Option<Vec<VerificationResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    /// Decoded claims of a token input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl VerificationResult {
    /// A passing result with no details.
    pub fn success() -> Self {
        Self {
            verified: true,
            ..Default::default()
        }
    }

    /// A failing result carrying `err`.
    pub fn failure(err: VerificationError) -> Self {
        Self {
            verified: false,
            error: Some(err.report()),
            ..Default::default()
        }
    }

    /// Force the result to fail, keeping the first recorded error.
    pub fn fail_with(&mut self, err: VerificationError) {
        self.verified = false;
        if self.error.is_none() {
            self.error = Some(err.report());
        }
    }

    /// Merge a status outcome; a failed status fails the whole result.
    pub fn attach_status(&mut self, status: StatusResult) {
        if !status.verified {
            let reason = status
                .results
                .iter()
                .find_map(|r| r.error.as_ref().map(|e| e.message.clone()))
                .unwrap_or_else(|| "credential status is set".to_string());
            self.fail_with(VerificationError::Validation(format!(
                "status check failed: {}",
                reason
            )));
        }
        self.status_result = Some(status);
    }

    /// Name of the attached error class, if any.
    pub fn error_name(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.name.as_str())
    }
}

/// Supported status-list schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusScheme {
    RevocationList2020,
    StatusList2021,
    BitstringStatusList,
}

impl StatusScheme {
    /// Resolve a scheme from a `credentialStatus.type` value.
    pub fn from_entry_type(entry_type: &str) -> Option<Self> {
        match entry_type {
            "RevocationList2020Status" => Some(Self::RevocationList2020),
            "StatusList2021Entry" => Some(Self::StatusList2021),
            "BitstringStatusListEntry" => Some(Self::BitstringStatusList),
            _ => None,
        }
    }

    /// The `credentialStatus.type` of entries using this scheme.
    pub fn entry_type(&self) -> &'static str {
        match self {
            Self::RevocationList2020 => "RevocationList2020Status",
            Self::StatusList2021 => "StatusList2021Entry",
            Self::BitstringStatusList => "BitstringStatusListEntry",
        }
    }

    /// Type marker the status-list credential must carry.
    pub fn list_credential_type(&self) -> &'static str {
        match self {
            Self::RevocationList2020 => "RevocationList2020Credential",
            Self::StatusList2021 => "StatusList2021Credential",
            Self::BitstringStatusList => "BitstringStatusListCredential",
        }
    }

    /// Type of the status-list credential's subject.
    pub fn list_type(&self) -> &'static str {
        match self {
            Self::RevocationList2020 => "RevocationList2020",
            Self::StatusList2021 => "StatusList2021",
            Self::BitstringStatusList => "BitstringStatusList",
        }
    }

    /// Entry field holding the bit index.
    pub fn index_field(&self) -> &'static str {
        match self {
            Self::RevocationList2020 => "revocationListIndex",
            _ => "statusListIndex",
        }
    }

    /// Entry field holding the status-list credential URL.
    pub fn list_credential_field(&self) -> &'static str {
        match self {
            Self::RevocationList2020 => "revocationListCredential",
            _ => "statusListCredential",
        }
    }

    /// The 2020 scheme is revocation-only and carries no purpose.
    pub fn has_purpose(&self) -> bool {
        !matches!(self, Self::RevocationList2020)
    }

    /// Bitstring entries are filtered by type; legacy schemes take every entry.
    pub fn filters_entries(&self) -> bool {
        matches!(self, Self::BitstringStatusList)
    }
}

impl fmt::Display for StatusScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entry_type())
    }
}
