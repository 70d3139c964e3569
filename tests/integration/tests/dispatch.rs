//! Integration test: routing untyped inputs through the dispatcher.

use serde_json::{json, Value};
use veracity_core::VerifyOptions;
use veracity_credentials::token;
use veracity_crypto::{base64url_encode, sha256_base64url};
use veracity_integration_tests::*;

fn signed_presentation(holder: &impl ProofSigner, issuer: &impl ProofSigner, extra: Value) -> Value {
    let vc = issuer.issue(&credential(issuer.did(), None));
    holder.sign(&presentation(holder.did(), vec![vc]), "authentication", extra)
}

// =========================================================================
// P1: one malformed item never affects the others
// =========================================================================

#[tokio::test]
async fn test_batch_independence() {
    let issuer = Ed25519Signer::generate();
    let good = issuer.issue(&credential(issuer.did(), None));
    let v = verifier();

    let alone = v.verify(&good, &VerifyOptions::default()).await;
    let batch = v
        .verify_batch(
            &[good.clone(), json!({"type": "Unknown"}), good.clone(), json!(null)],
            &VerifyOptions::default(),
        )
        .await;

    assert_eq!(batch.len(), 4);
    assert_eq!(batch[0], alone);
    assert_eq!(batch[2], alone);
    assert_eq!(batch[1].error_name(), Some("ClassificationError"));
    assert_eq!(batch[3].error_name(), Some("ClassificationError"));
}

// =========================================================================
// P4: decoding is pure
// =========================================================================

#[test]
fn test_decode_idempotent() {
    let issuer = P256Signer::generate();
    let jwt = issuer.jwt(&json!({"iss": issuer.did(), "vc": credential(issuer.did(), None)}));
    let first = token::decode(&jwt).unwrap();
    let second = token::decode(&jwt).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.payload["iss"], issuer.did());
}

// =========================================================================
// P5 / E5: presentation challenge and domain
// =========================================================================

#[tokio::test]
async fn test_presentation_challenge() {
    let holder = Ed25519Signer::generate();
    let issuer = P256Signer::generate();
    let vp = signed_presentation(&holder, &issuer, json!({"challenge": "12345"}));
    let v = verifier();

    let ok = v.verify(&vp, &VerifyOptions::new().with_challenge("12345")).await;
    assert!(ok.verified, "{:?}", ok.error);
    assert!(ok.credential_results.expect("credentials checked")[0].verified);

    let wrong = v
        .verify(&vp, &VerifyOptions::new().with_challenge("wrongChallenge"))
        .await;
    assert!(!wrong.verified);
    assert_eq!(wrong.error_name(), Some("ValidationError"));
}

#[tokio::test]
async fn test_presentation_domain_required() {
    let holder = Ed25519Signer::generate();
    let issuer = Ed25519Signer::generate();
    let vp = signed_presentation(
        &holder,
        &issuer,
        json!({"challenge": "abc", "domain": "https://verifier.example"}),
    );

    let result = verifier()
        .verify(&vp, &VerifyOptions::new().with_challenge("abc"))
        .await;
    assert!(!result.verified);
    assert!(!result.results[0].verified);
}

// =========================================================================
// E4: tampering is caught before any status check
// =========================================================================

#[tokio::test]
async fn test_altered_issuance_date() {
    let issuer = Ed25519Signer::generate();
    let mut vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry("https://status.invalid/1", "revocation", 0)),
    ));
    vc["issuanceDate"] = json!("2020-01-01T00:00:00Z");

    let result = verifier().verify(&vc, &VerifyOptions::default()).await;
    assert!(!result.verified);
    assert!(result.error.is_some());
    assert_eq!(result.error_name(), Some("CryptographicFailure"));
    assert!(result.status_result.is_none());
}

// =========================================================================
// Tokens
// =========================================================================

#[tokio::test]
async fn test_jwt_and_enveloped_jwt() {
    let issuer = P256Signer::generate();
    let jwt = issuer.jwt(&json!({"iss": issuer.did(), "vc": credential(issuer.did(), None)}));
    let v = verifier();

    let plain = v.verify(&json!(jwt), &VerifyOptions::default()).await;
    assert!(plain.verified, "{:?}", plain.error);
    assert_eq!(plain.payload.expect("claims")["iss"], issuer.did());

    let enveloped = json!({
        "@context": [CREDENTIALS_V2],
        "type": "EnvelopedVerifiableCredential",
        "id": format!("data:application/vc+jwt,{}", jwt),
    });
    assert!(v.verify(&enveloped, &VerifyOptions::default()).await.verified);
}

#[tokio::test]
async fn test_jwt_from_unknown_issuer_key() {
    let issuer = P256Signer::generate();
    let impostor = P256Signer::generate();
    // Signed by the impostor, claiming the issuer's DID and key.
    let forged = impostor.jws(
        &json!({"alg": "ES256", "typ": "JWT", "kid": issuer.method_id()}),
        &json!({"iss": issuer.did()}),
    );
    let result = verifier().verify(&json!(forged), &VerifyOptions::default()).await;
    assert!(!result.verified);
    assert_eq!(result.error_name(), Some("CryptographicFailure"));
}

#[tokio::test]
async fn test_sd_jwt_with_key_binding() {
    let issuer = P256Signer::generate();
    let holder = P256Signer::generate();

    let disclosure = base64url_encode(br#"["2GLC42sKQveCfGfryNRN9w","given_name","Erika"]"#);
    let issued = issuer.jws(
        &json!({"alg": "ES256", "typ": "vc+sd-jwt", "kid": issuer.method_id()}),
        &json!({
            "iss": issuer.did(),
            "vct": "https://credentials.example/identity_credential",
            "_sd_alg": "sha-256",
            "_sd": [sha256_base64url(disclosure.as_bytes())],
            "family_name": "Mustermann",
            "cnf": {"jwk": holder.public_jwk()},
        }),
    );
    let presented = format!("{}~{}~", issued, disclosure);
    let kb = holder.jws(
        &json!({"alg": "ES256", "typ": "kb+jwt"}),
        &json!({
            "iat": 1718000000,
            "aud": "https://verifier.example",
            "nonce": "12345",
            "sd_hash": sha256_base64url(presented.as_bytes()),
        }),
    );
    let input = json!(format!("{}{}", presented, kb));
    let v = verifier();

    let options = VerifyOptions::new()
        .with_challenge("12345")
        .with_domain("https://verifier.example");
    let result = v.verify(&input, &options).await;
    assert!(result.verified, "{:?}", result.error);
    let claims = result.payload.expect("disclosed claims");
    assert_eq!(claims["given_name"], "Erika");
    assert_eq!(claims["family_name"], "Mustermann");

    let replay = v
        .verify(&input, &VerifyOptions::new().with_challenge("wrongChallenge"))
        .await;
    assert!(!replay.verified);
}

#[tokio::test]
async fn test_sd_jwt_cannot_claim_foreign_issuer() {
    let attacker = P256Signer::generate();
    let forged = attacker.jws(
        &json!({"alg": "ES256", "typ": "vc+sd-jwt", "kid": attacker.method_id()}),
        &json!({"iss": "did:web:gs1.org", "vct": "https://credentials.example/license"}),
    );
    let result = verifier()
        .verify(&json!(format!("{}~", forged)), &VerifyOptions::default())
        .await;
    assert!(!result.verified);
    assert_eq!(result.error_name(), Some("ResolutionError"));
}
