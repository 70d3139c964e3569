//! Verification dispatcher.
//!
//! Classifies each input, routes it to the token, SD-JWT or Data Integrity
//! path, and runs status checks once the proof holds. Status-list
//! credentials come back through [`VerifyCredential`], so nested lists are
//! verified with the same rules under a [`VerificationContext`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use veracity_core::{
    classify, issuer_id, ProofResult, VerifiableInput, VerificationError, VerificationResult,
    VerifierConfig, VerifyOptions,
};
use veracity_crypto::KeyMaterial;
use veracity_identity::{split_did_url, DidDocument};
use veracity_loader::{DefaultDocumentLoader, DocumentLoader};

use crate::error::CredentialError;
use crate::linked_data;
use crate::sd_jwt::SdJwtVerifier;
use crate::status::{credential_view, StatusListVerifier, VerificationContext, VerifyCredential};
use crate::suite::{self, Cryptosuite};
use crate::token;

const ASSERTION_METHOD: &str = "assertionMethod";
const AUTHENTICATION: &str = "authentication";

/// The verification engine.
pub struct Verifier {
    loader: Arc<dyn DocumentLoader>,
    status: StatusListVerifier,
    sd_jwt: SdJwtVerifier,
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(loader: Arc<dyn DocumentLoader>, config: &VerifierConfig) -> Self {
        Self {
            status: StatusListVerifier::new(Arc::clone(&loader), config.status.clone()),
            sd_jwt: SdJwtVerifier::new(Arc::clone(&loader)),
            loader,
            config: config.clone(),
        }
    }

    /// Verifier over the standard document loader.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, CredentialError> {
        let loader = DefaultDocumentLoader::from_config(config)?;
        Ok(Self::new(Arc::new(loader), config))
    }

    pub fn loader(&self) -> &Arc<dyn DocumentLoader> {
        &self.loader
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one input under the configured per-item deadline.
    pub async fn verify(&self, input: &Value, options: &VerifyOptions) -> VerificationResult {
        let deadline = self.config.verification.item_timeout();
        let root = VerificationContext::root();
        let verification = self.verify_with_context(input, options, &root);
        match tokio::time::timeout(deadline, verification).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs = deadline.as_secs(), "verification timed out");
                VerificationResult::failure(VerificationError::Timeout(deadline.as_secs()))
            }
        }
    }

    /// Verify every input concurrently. Results keep the input order and a
    /// failing item never affects the others.
    pub async fn verify_batch(
        &self,
        inputs: &[Value],
        options: &VerifyOptions,
    ) -> Vec<VerificationResult> {
        let results = join_all(inputs.iter().map(|input| self.verify(input, options))).await;
        tracing::info!(
            items = results.len(),
            verified = results.iter().filter(|r| r.verified).count(),
            "batch verified"
        );
        results
    }

    async fn dispatch(
        &self,
        input: &Value,
        options: &VerifyOptions,
        ctx: &VerificationContext,
    ) -> VerificationResult {
        let classified = match classify(input) {
            Ok(classified) => classified,
            Err(e) => return VerificationResult::failure(e),
        };
        tracing::debug!(kind = classified.kind(), depth = ctx.depth(), "dispatching");

        match classified {
            VerifiableInput::Token(token) | VerifiableInput::Enveloped(token) => {
                self.verify_token(&token, options, ctx).await
            }
            VerifiableInput::Credential(credential) => {
                self.verify_credential(&credential, ctx).await
            }
            VerifiableInput::Presentation(presentation) => {
                self.verify_presentation(&presentation, options, ctx).await
            }
        }
    }

    async fn verify_token(
        &self,
        token: &str,
        options: &VerifyOptions,
        ctx: &VerificationContext,
    ) -> VerificationResult {
        let mut result = if token.contains('~') {
            self.sd_jwt
                .verify(token, options.domain.as_deref(), options.challenge.as_deref())
                .await
        } else {
            match token::verify_with_issuer(token, self.loader.as_ref()).await {
                Ok(payload) => VerificationResult {
                    payload: Some(payload),
                    ..VerificationResult::success()
                },
                Err(e) => {
                    tracing::debug!(error = %e, "JWT verification failed");
                    VerificationResult::failure(e.into())
                }
            }
        };

        if result.verified {
            if let Some(payload) = result.payload.clone() {
                self.apply_status(&mut result, &credential_view(&payload), ctx)
                    .await;
            }
        }
        result
    }

    async fn verify_credential(
        &self,
        credential: &Value,
        ctx: &VerificationContext,
    ) -> VerificationResult {
        let mut result = self
            .verify_proofs(credential, &VerifyOptions::default(), ASSERTION_METHOD)
            .await;
        if !result.verified {
            return result;
        }
        if let Err(e) = check_validity(credential, Utc::now()) {
            result.fail_with(e.into());
            return result;
        }
        self.apply_status(&mut result, credential, ctx).await;
        result
    }

    async fn verify_presentation(
        &self,
        presentation: &Value,
        options: &VerifyOptions,
        ctx: &VerificationContext,
    ) -> VerificationResult {
        let mut result = self
            .verify_proofs(presentation, options, AUTHENTICATION)
            .await;

        let embedded = embedded_credentials(presentation);
        let inner_options = VerifyOptions::default();
        let credential_results = join_all(
            embedded
                .iter()
                .map(|credential| self.verify_with_context(credential, &inner_options, ctx)),
        )
        .await;

        let failed = credential_results.iter().filter(|r| !r.verified).count();
        if failed > 0 {
            result.fail_with(VerificationError::Validation(format!(
                "{} of {} presented credentials failed verification",
                failed,
                credential_results.len()
            )));
        }
        result.credential_results = Some(credential_results);
        result
    }

    /// Check every proof of `document`; all must pass.
    async fn verify_proofs(
        &self,
        document: &Value,
        options: &VerifyOptions,
        purpose: &str,
    ) -> VerificationResult {
        let proofs = suite::proofs(document);
        if proofs.is_empty() {
            return VerificationResult::failure(
                CredentialError::MissingProof("document has no proof".into()).into(),
            );
        }

        let checks = proofs.into_iter().map(|proof| async move {
            match self.verify_proof(document, &proof, options, purpose).await {
                Ok(()) => ProofResult::passed(proof),
                Err(e) => {
                    tracing::debug!(error = %e, "proof failed");
                    ProofResult::failed(proof, &e.into())
                }
            }
        });
        let results = join_all(checks).await;

        let error = results.iter().find(|r| !r.verified).and_then(|r| r.error.clone());
        VerificationResult {
            verified: error.is_none(),
            results,
            error,
            ..Default::default()
        }
    }

    async fn verify_proof(
        &self,
        document: &Value,
        proof: &Value,
        options: &VerifyOptions,
        purpose: &str,
    ) -> Result<(), CredentialError> {
        let proof_purpose = proof
            .get("proofPurpose")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if proof_purpose != purpose {
            return Err(CredentialError::ProofPurpose(format!(
                "expected {}, proof has '{}'",
                purpose, proof_purpose
            )));
        }
        if purpose == AUTHENTICATION {
            check_challenge(proof, options)?;
            check_domain(proof, options)?;
        }
        let suite = Cryptosuite::for_proof(proof)?;

        let method_url = match proof.get("verificationMethod") {
            Some(Value::String(id)) => id.as_str(),
            Some(method) => method.get("id").and_then(Value::as_str).unwrap_or_default(),
            None => "",
        };
        if method_url.is_empty() {
            return Err(CredentialError::MissingProof(
                "proof has no verificationMethod".into(),
            ));
        }

        let method = self.loader.load(method_url).await?.document;
        let method_id = method
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(method_url);
        if method_id != method_url {
            return Err(CredentialError::ProofPurpose(format!(
                "{} dereferenced to a different method {}",
                method_url, method_id
            )));
        }
        let method_did = split_did_url(method_url).0;
        let controller = method
            .get("controller")
            .and_then(Value::as_str)
            .unwrap_or(method_did);
        if controller != method_did {
            return Err(CredentialError::ProofPurpose(format!(
                "{} is controlled by '{}', not by {}",
                method_url, controller, method_did
            )));
        }

        let controller_document = self.controller_document(controller).await?;
        if !controller_document.has_relationship(purpose, method_id) {
            return Err(CredentialError::ProofPurpose(format!(
                "{} is not authorized for {} by {}",
                method_id, purpose, controller
            )));
        }
        if purpose == ASSERTION_METHOD {
            let issuer = issuer_id(document).unwrap_or_default();
            if issuer != controller {
                return Err(CredentialError::ProofPurpose(format!(
                    "issuer '{}' does not control {}",
                    issuer, method_id
                )));
            }
        }

        match suite {
            Cryptosuite::LinkedData(name) => linked_data::verify_proof(document, proof, name).await,
            _ => {
                let key = KeyMaterial::from_verification_method(&method)?;
                suite::verify_proof(document, proof, &key)
            }
        }
    }

    async fn controller_document(&self, controller: &str) -> Result<DidDocument, CredentialError> {
        if controller.starts_with("did:") {
            return Ok(self.loader.resolve_did(controller).await?);
        }
        let document = self.loader.load(controller).await?.document;
        Ok(DidDocument::from_value(document)?)
    }

    /// Run the status verifier when the credential has `credentialStatus`.
    async fn apply_status(
        &self,
        result: &mut VerificationResult,
        credential: &Value,
        ctx: &VerificationContext,
    ) {
        if credential.get("credentialStatus").is_none() {
            return;
        }
        let outcome = match StatusListVerifier::scheme_for(credential) {
            Ok(scheme) => self.status.check(credential, scheme, ctx, self).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(status) => result.attach_status(status),
            Err(e) => {
                tracing::debug!(error = %e, "credential status invalid");
                result.fail_with(e.into());
            }
        }
    }
}

#[async_trait]
impl VerifyCredential for Verifier {
    async fn verify_with_context(
        &self,
        input: &Value,
        options: &VerifyOptions,
        ctx: &VerificationContext,
    ) -> VerificationResult {
        self.dispatch(input, options, ctx).await
    }
}

fn check_challenge(proof: &Value, options: &VerifyOptions) -> Result<(), CredentialError> {
    let expected = options.challenge.as_deref().ok_or_else(|| {
        CredentialError::Challenge("a challenge is required to verify a presentation".into())
    })?;
    match proof.get("challenge").and_then(Value::as_str) {
        Some(challenge) if challenge == expected => Ok(()),
        Some(challenge) => Err(CredentialError::Challenge(format!(
            "expected '{}', proof has '{}'",
            expected, challenge
        ))),
        None => Err(CredentialError::Challenge("proof has no challenge".into())),
    }
}

fn check_domain(proof: &Value, options: &VerifyOptions) -> Result<(), CredentialError> {
    let expected = options.domain.as_deref();
    let matches = match (proof.get("domain"), expected) {
        (None, None) => true,
        (Some(Value::String(domain)), Some(expected)) => domain == expected,
        (Some(Value::Array(domains)), Some(expected)) => {
            domains.iter().any(|d| d.as_str() == Some(expected))
        }
        _ => false,
    };
    if matches {
        return Ok(());
    }
    Err(CredentialError::Domain(match expected {
        Some(expected) => format!("proof domain does not match '{}'", expected),
        None => "proof has a domain but none was supplied".into(),
    }))
}

/// Reject credentials outside their validity window at `now`.
pub fn check_validity(credential: &Value, now: DateTime<Utc>) -> Result<(), CredentialError> {
    for field in ["validFrom", "issuanceDate"] {
        if let Some(start) = timestamp(credential, field)? {
            if start > now {
                return Err(CredentialError::Validity(format!(
                    "{} {} is in the future",
                    field,
                    start.to_rfc3339()
                )));
            }
        }
    }
    for field in ["validUntil", "expirationDate"] {
        if let Some(end) = timestamp(credential, field)? {
            if end < now {
                return Err(CredentialError::Validity(format!(
                    "expired at {}",
                    end.to_rfc3339()
                )));
            }
        }
    }
    Ok(())
}

fn timestamp(credential: &Value, field: &str) -> Result<Option<DateTime<Utc>>, CredentialError> {
    match credential.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|t| Some(t.with_timezone(&Utc)))
            .map_err(|e| CredentialError::Validity(format!("{} '{}': {}", field, raw, e))),
        Some(_) => Err(CredentialError::Validity(format!("{} must be a string", field))),
    }
}

fn embedded_credentials(presentation: &Value) -> Vec<Value> {
    match presentation.get("verifiableCredential") {
        Some(Value::Array(items)) => items.clone(),
        Some(item) if !item.is_null() => vec![item.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use serde_json::json;
    use veracity_crypto::{encode_multibase, KeyEncoding, KeyType};
    use veracity_identity::{
        did_key_from_key, DidKeyResolver, DidResolver, DidResolverRegistry, IdentityError,
    };
    use veracity_loader::bundled_contexts;
    use veracity_network::{ContextCache, HttpFetcher};

    struct Signer25519 {
        key: SigningKey,
        did: String,
    }

    impl Signer25519 {
        fn generate() -> Self {
            let key = SigningKey::generate(&mut OsRng);
            let material = KeyMaterial::new(
                KeyType::Ed25519,
                key.verifying_key().to_bytes().to_vec(),
                KeyEncoding::Multibase,
            )
            .unwrap();
            Self {
                did: did_key_from_key(&material),
                key,
            }
        }

        fn method_id(&self) -> String {
            format!("{}#{}", self.did, self.did.trim_start_matches("did:key:"))
        }

        fn sign(&self, document: &Value, purpose: &str, extra: Value) -> Value {
            let mut proof = json!({
                "type": "DataIntegrityProof",
                "cryptosuite": "eddsa-jcs-2022",
                "created": "2024-01-01T00:00:00Z",
                "verificationMethod": self.method_id(),
                "proofPurpose": purpose,
            });
            if let (Some(obj), Some(extra)) = (proof.as_object_mut(), extra.as_object()) {
                obj.extend(extra.clone());
            }
            let data = suite::hash_data(document, &proof).unwrap();
            proof["proofValue"] = json!(encode_multibase(&self.key.sign(&data).to_bytes()));
            let mut secured = document.clone();
            secured["proof"] = proof;
            secured
        }
    }

    fn credential(issuer: &str) -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiableCredential"],
            "issuer": issuer,
            "credentialSubject": {"id": "did:example:subject", "memberOf": "ACME"}
        })
    }

    fn presentation(holder: &Signer25519, credentials: Vec<Value>, extra: Value) -> Value {
        let vp = json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "type": ["VerifiablePresentation"],
            "holder": holder.did,
            "verifiableCredential": credentials,
        });
        holder.sign(&vp, AUTHENTICATION, extra)
    }

    fn verifier() -> Verifier {
        Verifier::from_config(&VerifierConfig::default()).unwrap()
    }

    /// Serves one fixed document for `did:example:*`.
    struct StaticResolver(Value);

    #[async_trait]
    impl DidResolver for StaticResolver {
        fn method(&self) -> &'static str {
            "example"
        }

        async fn resolve(&self, _did: &str) -> Result<DidDocument, IdentityError> {
            DidDocument::from_value(self.0.clone())
        }
    }

    fn verifier_with_example_did(document: Value) -> Verifier {
        let config = VerifierConfig::default();
        let registry = DidResolverRegistry::new()
            .with_resolver(Arc::new(DidKeyResolver::new()))
            .with_resolver(Arc::new(StaticResolver(document)));
        let loader = DefaultDocumentLoader::new(
            Arc::new(HttpFetcher::new(&config.loader).unwrap()),
            Arc::new(registry),
            ContextCache::seeded(bundled_contexts()),
            Vec::new(),
        );
        Verifier::new(Arc::new(loader), &config)
    }

    #[tokio::test]
    async fn test_credential_verifies() {
        let issuer = Signer25519::generate();
        let vc = issuer.sign(&credential(&issuer.did), ASSERTION_METHOD, json!({}));
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(result.verified, "{:?}", result.error);
        assert_eq!(result.results.len(), 1);
        assert!(result.status_result.is_none());
    }

    #[tokio::test]
    async fn test_tampered_credential() {
        let issuer = Signer25519::generate();
        let mut vc = issuer.sign(&credential(&issuer.did), ASSERTION_METHOD, json!({}));
        vc["credentialSubject"]["memberOf"] = json!("Mallory Inc");
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert_eq!(result.error_name(), Some("CryptographicFailure"));
    }

    #[tokio::test]
    async fn test_issuer_must_control_key() {
        let issuer = Signer25519::generate();
        let vc = issuer.sign(&credential("did:example:someone-else"), ASSERTION_METHOD, json!({}));
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().message.contains("does not control"));
    }

    #[tokio::test]
    async fn test_method_from_another_did_is_rejected() {
        let victim = Signer25519::generate();
        let attacker = Signer25519::generate();
        let fragment = victim.did.trim_start_matches("did:key:").to_string();
        let attacker_key = attacker.did.trim_start_matches("did:key:").to_string();

        // A foreign document republishing the victim's method id with its own key.
        let verifier = verifier_with_example_did(json!({
            "id": "did:example:evil",
            "verificationMethod": [{
                "id": victim.method_id(),
                "type": "Ed25519VerificationKey2020",
                "controller": victim.did,
                "publicKeyMultibase": attacker_key
            }],
            "assertionMethod": [victim.method_id()]
        }));
        let forged = attacker.sign(
            &credential(&victim.did),
            ASSERTION_METHOD,
            json!({"verificationMethod": format!("did:example:evil#{}", fragment)}),
        );
        let result = verifier.verify(&forged, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_method_controller_must_be_its_did() {
        let victim = Signer25519::generate();
        let attacker = Signer25519::generate();
        let attacker_key = attacker.did.trim_start_matches("did:key:").to_string();

        let verifier = verifier_with_example_did(json!({
            "id": "did:example:evil",
            "verificationMethod": [{
                "id": "did:example:evil#k",
                "type": "Ed25519VerificationKey2020",
                "controller": victim.did,
                "publicKeyMultibase": attacker_key
            }],
            "assertionMethod": ["#k"]
        }));
        let forged = attacker.sign(
            &credential(&victim.did),
            ASSERTION_METHOD,
            json!({"verificationMethod": "did:example:evil#k"}),
        );
        let result = verifier.verify(&forged, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().message.contains("is controlled by"));
    }

    #[tokio::test]
    async fn test_missing_proof() {
        let result = verifier()
            .verify(&credential("did:example:issuer"), &VerifyOptions::default())
            .await;
        assert!(!result.verified);
        assert_eq!(result.error_name(), Some("ValidationError"));
    }

    #[tokio::test]
    async fn test_unsupported_suite() {
        let mut vc = credential("did:example:issuer");
        vc["proof"] = json!({
            "type": "BbsBlsSignature2020",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:issuer#key-1",
            "proofValue": "z3FXQ"
        });
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert_eq!(result.error_name(), Some("CryptographicFailure"));
        assert!(result.error.unwrap().message.contains("BbsBlsSignature2020"));
    }

    #[tokio::test]
    async fn test_linked_data_proof_checked_by_suite_registry() {
        let issuer = Signer25519::generate();
        let mut vc = credential(&issuer.did);
        vc["proof"] = json!({
            "type": "Ed25519Signature2020",
            "created": "2024-01-01T00:00:00Z",
            "proofPurpose": "assertionMethod",
            "verificationMethod": issuer.method_id(),
            "proofValue": "z3FXQjecWufY46yg5abdVZsXqLhxhueuSoZgNSARiKBk9czhSePTFehP8c3PGfb6a22gkfUKods5D2UDeKH"
        });
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert_eq!(result.error_name(), Some("CryptographicFailure"));
        assert!(result.error.unwrap().message.contains("proof rejected"));
    }

    #[tokio::test]
    async fn test_wrong_proof_purpose() {
        let issuer = Signer25519::generate();
        let vc = issuer.sign(&credential(&issuer.did), AUTHENTICATION, json!({}));
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert!(result.error.unwrap().message.contains("assertionMethod"));
    }

    #[tokio::test]
    async fn test_expired_credential() {
        let issuer = Signer25519::generate();
        let mut doc = credential(&issuer.did);
        doc["validUntil"] = json!((Utc::now() - Duration::days(1)).to_rfc3339());
        let vc = issuer.sign(&doc, ASSERTION_METHOD, json!({}));
        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        assert_eq!(result.error_name(), Some("ValidationError"));
    }

    #[tokio::test]
    async fn test_presentation_challenge() {
        let issuer = Signer25519::generate();
        let holder = Signer25519::generate();
        let vc = issuer.sign(&credential(&issuer.did), ASSERTION_METHOD, json!({}));
        let vp = presentation(&holder, vec![vc], json!({"challenge": "12345"}));
        let v = verifier();

        let ok = v.verify(&vp, &VerifyOptions::new().with_challenge("12345")).await;
        assert!(ok.verified, "{:?}", ok.error);
        let inner = ok.credential_results.unwrap();
        assert_eq!(inner.len(), 1);
        assert!(inner[0].verified);

        let wrong = v
            .verify(&vp, &VerifyOptions::new().with_challenge("wrongChallenge"))
            .await;
        assert!(!wrong.verified);

        let missing = v.verify(&vp, &VerifyOptions::default()).await;
        assert!(!missing.verified);
    }

    #[tokio::test]
    async fn test_presentation_domain_without_expected() {
        let holder = Signer25519::generate();
        let vp = presentation(
            &holder,
            Vec::new(),
            json!({"challenge": "c", "domain": "verifier.example"}),
        );
        let v = verifier();

        let without = v.verify(&vp, &VerifyOptions::new().with_challenge("c")).await;
        assert!(!without.verified);
        assert!(without.error.unwrap().message.contains("domain"));

        let with = v
            .verify(
                &vp,
                &VerifyOptions::new()
                    .with_challenge("c")
                    .with_domain("verifier.example"),
            )
            .await;
        assert!(with.verified, "{:?}", with.error);
    }

    #[tokio::test]
    async fn test_presentation_with_failing_credential() {
        let issuer = Signer25519::generate();
        let holder = Signer25519::generate();
        let mut vc = issuer.sign(&credential(&issuer.did), ASSERTION_METHOD, json!({}));
        vc["issuer"] = json!("did:example:forged");
        let vp = presentation(&holder, vec![vc], json!({"challenge": "c"}));
        let result = verifier()
            .verify(&vp, &VerifyOptions::new().with_challenge("c"))
            .await;
        assert!(!result.verified);
        assert!(result.results[0].verified);
        assert!(!result.credential_results.unwrap()[0].verified);
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let issuer = Signer25519::generate();
        let good = issuer.sign(&credential(&issuer.did), ASSERTION_METHOD, json!({}));
        let inputs = vec![good.clone(), json!(42), json!("not-a-token"), good];
        let results = verifier()
            .verify_batch(&inputs, &VerifyOptions::default())
            .await;
        assert_eq!(results.len(), 4);
        assert!(results[0].verified);
        assert_eq!(results[1].error_name(), Some("ClassificationError"));
        assert!(!results[2].verified);
        assert!(results[3].verified);
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let future = (now + Duration::days(1)).to_rfc3339();
        let past = (now - Duration::days(1)).to_rfc3339();

        assert!(check_validity(&json!({"validFrom": past, "validUntil": future}), now).is_ok());
        assert!(check_validity(&json!({"issuanceDate": future}), now).is_err());
        assert!(check_validity(&json!({"expirationDate": past}), now).is_err());
        assert!(check_validity(&json!({"validFrom": "yesterday"}), now).is_err());
    }

    #[test]
    fn test_domain_rules() {
        let opts = VerifyOptions::new().with_domain("a.example");
        assert!(check_domain(&json!({"domain": "a.example"}), &opts).is_ok());
        assert!(check_domain(&json!({"domain": ["b.example", "a.example"]}), &opts).is_ok());
        assert!(check_domain(&json!({}), &opts).is_err());
        assert!(check_domain(&json!({"domain": "a.example"}), &VerifyOptions::default()).is_err());
        assert!(check_domain(&json!({}), &VerifyOptions::default()).is_ok());
    }
}
