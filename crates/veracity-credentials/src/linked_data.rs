//! Linked Data proofs (`Ed25519Signature2020`, `JsonWebSignature2020`,
//! `eddsa-rdfc-2022`, `ecdsa-sd-2023`, ...) verified by the `ssi` suite
//! registry over RDF-canonicalized data.
//!
//! Purpose, controller and challenge checks happen in the dispatcher before
//! a proof gets here; this module only answers whether the signature holds.

use serde_json::Value;
use ssi::claims::data_integrity::{AnySuite, DataIntegrity};
use ssi::claims::vc::{AnyJsonCredential, AnyJsonPresentation};
use ssi::dids::AnyDidMethod;
use ssi::prelude::*;
use veracity_core::types::has_type;

use crate::error::CredentialError;
use crate::suite::unsecured;

/// Verify `proof` alone over `document`. Runs on a blocking thread driven
/// by the current Tokio runtime handle.
pub async fn verify_proof(document: &Value, proof: &Value, suite: &str) -> Result<(), CredentialError> {
    let mut secured = unsecured(document);
    if let Some(obj) = secured.as_object_mut() {
        obj.insert("proof".into(), proof.clone());
    }

    let handle = tokio::runtime::Handle::current();
    let outcome = tokio::task::spawn_blocking(move || handle.block_on(verify_document(secured)))
        .await
        .map_err(|e| CredentialError::ProofRejected(format!("{} verifier stopped: {}", suite, e)))?;

    match outcome {
        Ok(()) => {
            tracing::trace!(%suite, "linked data proof verified");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(%suite, error = %e, "linked data proof rejected");
            Err(e)
        }
    }
}

async fn verify_document(secured: Value) -> Result<(), CredentialError> {
    let params = VerificationParameters::from_resolver(AnyDidMethod::default().into_vm_resolver());

    let verification = if has_type(&secured, "VerifiablePresentation") {
        let presentation: DataIntegrity<AnyJsonPresentation, AnySuite> =
            serde_json::from_value(secured).map_err(malformed)?;
        presentation.verify(&params).await
    } else {
        let credential: DataIntegrity<AnyJsonCredential, AnySuite> =
            serde_json::from_value(secured).map_err(malformed)?;
        credential.verify(&params).await
    };

    match verification {
        Ok(Ok(())) => Ok(()),
        Ok(Err(invalid)) => Err(CredentialError::ProofRejected(invalid.to_string())),
        Err(e) => Err(CredentialError::ProofRejected(e.to_string())),
    }
}

fn malformed(err: serde_json::Error) -> CredentialError {
    CredentialError::ProofRejected(format!("not a linked data document: {}", err))
}
