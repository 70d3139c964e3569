//! Integration test: status-list checking across the dispatcher, loader and
//! status verifier, with lists hosted over HTTP.

use serde_json::json;
use std::time::Duration;
use veracity_core::{VerifierConfig, VerifyOptions};
use veracity_integration_tests::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REVOCATION: &str = "revocation";
const SUSPENSION: &str = "suspension";

async fn publish_list(
    server: &MockServer,
    signer: &impl ProofSigner,
    route: &str,
    purpose: &str,
    set_bits: &[usize],
) -> String {
    let url = format!("{}{}", server.uri(), route);
    let list = signer.issue(&status_list_credential(signer.did(), &url, purpose, set_bits));
    host_json(server, route, &list).await;
    url
}

// =========================================================================
// E1 / E2: a single BitstringStatusListEntry at index 0
// =========================================================================

#[tokio::test]
async fn test_clear_bit_verifies() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let list_url = publish_list(&server, &issuer, "/status/1", REVOCATION, &[]).await;

    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry(&list_url, REVOCATION, 0)),
    ));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(result.verified, "{:?}", result.error);
    let status = result.status_result.expect("status checked");
    assert!(status.verified);
    assert_eq!(status.results.len(), 1);
}

#[tokio::test]
async fn test_set_bit_fails() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let list_url = publish_list(&server, &issuer, "/status/1", REVOCATION, &[0]).await;

    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry(&list_url, REVOCATION, 0)),
    ));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    assert_eq!(result.error_name(), Some("ValidationError"));
    let status = result.status_result.expect("status checked");
    assert!(!status.verified);
    assert!(status.results[0].error.is_some());
    // The proof itself held.
    assert!(result.results[0].verified);
}

// =========================================================================
// P2: flipping a bit 0 → 1 flips the status result
// =========================================================================

#[tokio::test]
async fn test_flipping_bit_revokes() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let list_url = publish_list(&server, &issuer, "/status/flip", REVOCATION, &[3]).await;
    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry(&list_url, REVOCATION, 42)),
    ));

    let before = verifier().verify(&vc, &VerifyOptions::default()).await;
    assert!(before.verified, "{:?}", before.error);

    server.reset().await;
    publish_list(&server, &issuer, "/status/flip", REVOCATION, &[3, 42]).await;

    let after = verifier().verify(&vc, &VerifyOptions::default()).await;
    assert!(!after.verified);
    assert!(!after.status_result.expect("status checked").verified);
}

// =========================================================================
// P3: a status list from a different issuer never verifies
// =========================================================================

#[tokio::test]
async fn test_foreign_status_list_issuer() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let other = Ed25519Signer::generate();

    for set_bits in [&[][..], &[7][..]] {
        server.reset().await;
        let list_url = publish_list(&server, &other, "/status/foreign", REVOCATION, set_bits).await;
        let vc = issuer.issue(&credential(
            issuer.did(),
            Some(bitstring_entry(&list_url, REVOCATION, 7)),
        ));

        let result = verifier().verify(&vc, &VerifyOptions::default()).await;
        assert!(!result.verified);
        let status = result.status_result.expect("status checked");
        let message = &status.results[0].error.as_ref().expect("entry error").message;
        assert!(message.contains("issuer mismatch"), "{}", message);
    }
}

#[tokio::test]
async fn test_foreign_issuer_allowed_when_configured() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let other = Ed25519Signer::generate();
    let list_url = publish_list(&server, &other, "/status/foreign", REVOCATION, &[]).await;
    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry(&list_url, REVOCATION, 7)),
    ));

    let mut config = VerifierConfig::default();
    config.status.verify_matching_issuers = false;
    let result = verifier_with(config)
        .verify(&vc, &VerifyOptions::default())
        .await;
    assert!(result.verified, "{:?}", result.error);
}

// =========================================================================
// E3: revocation and suspension entries, both clear
// =========================================================================

#[tokio::test]
async fn test_revocation_and_suspension_entries() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let revocation = publish_list(&server, &issuer, "/status/revocation", REVOCATION, &[11, 13]).await;
    let suspension = publish_list(&server, &issuer, "/status/suspension", SUSPENSION, &[4, 6]).await;

    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(json!([
            bitstring_entry(&revocation, REVOCATION, 12),
            bitstring_entry(&suspension, SUSPENSION, 5),
        ])),
    ));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(result.verified, "{:?}", result.error);
    let status = result.status_result.expect("status checked");
    assert!(status.verified);
    assert_eq!(status.results.len(), 2);
    assert!(status.results.iter().all(|r| r.verified));
}

#[tokio::test]
async fn test_one_suspended_entry_fails_aggregate() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let revocation = publish_list(&server, &issuer, "/status/revocation", REVOCATION, &[]).await;
    let suspension = publish_list(&server, &issuer, "/status/suspension", SUSPENSION, &[5]).await;

    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(json!([
            bitstring_entry(&revocation, REVOCATION, 12),
            bitstring_entry(&suspension, SUSPENSION, 5),
        ])),
    ));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    let status = result.status_result.expect("status checked");
    assert!(status.results[0].verified);
    assert!(!status.results[1].verified);
}

// =========================================================================
// Recursion: status lists are verified like any other credential
// =========================================================================

#[tokio::test]
async fn test_tampered_status_list_fails_entry() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let url = format!("{}/status/tampered", server.uri());
    let mut list = issuer.issue(&status_list_credential(issuer.did(), &url, REVOCATION, &[9]));
    list["credentialSubject"]["encodedList"] = json!(encoded_list(16 * 1024, &[]));
    host_json(&server, "/status/tampered", &list).await;

    let vc = issuer.issue(&credential(issuer.did(), Some(bitstring_entry(&url, REVOCATION, 9))));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    let status = result.status_result.expect("status checked");
    let message = &status.results[0].error.as_ref().expect("entry error").message;
    assert!(message.contains("failed verification"), "{}", message);
}

#[tokio::test]
async fn test_self_referencing_status_list_terminates() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let url = format!("{}/status/loop", server.uri());

    let mut list = status_list_credential(issuer.did(), &url, REVOCATION, &[]);
    list["credentialStatus"] = bitstring_entry(&url, REVOCATION, 1);
    host_json(&server, "/status/loop", &issuer.issue(&list)).await;

    let vc = issuer.issue(&credential(issuer.did(), Some(bitstring_entry(&url, REVOCATION, 0))));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    assert!(!result.status_result.expect("status checked").verified);
}

#[tokio::test]
async fn test_unreachable_status_list() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let url = format!("{}/status/missing", server.uri());

    let vc = issuer.issue(&credential(issuer.did(), Some(bitstring_entry(&url, REVOCATION, 0))));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    let status = result.status_result.expect("status checked");
    assert!(status.results[0]
        .error
        .as_ref()
        .expect("entry error")
        .message
        .contains("could not be loaded"));
}

#[tokio::test]
async fn test_malformed_entry_fails_before_fetch() {
    let issuer = Ed25519Signer::generate();
    let mut entry = bitstring_entry("https://status.invalid/lists/1", REVOCATION, 0);
    entry["statusListIndex"] = json!("not-a-number");

    let vc = issuer.issue(&credential(issuer.did(), Some(entry)));
    let result = verifier().verify(&vc, &VerifyOptions::default()).await;

    assert!(!result.verified);
    assert_eq!(result.error_name(), Some("ValidationError"));
    assert!(result.status_result.is_none());
}

// =========================================================================
// JWT credentials carry status in their `vc` claim
// =========================================================================

#[tokio::test]
async fn test_jwt_credential_status() {
    let server = MockServer::start().await;
    let issuer = P256Signer::generate();
    let list_url = publish_list(&server, &issuer, "/status/jwt", REVOCATION, &[2]).await;

    let claims = |index: u64| {
        json!({
            "iss": issuer.did(),
            "sub": "did:example:holder",
            "vc": credential(issuer.did(), Some(bitstring_entry(&list_url, REVOCATION, index))),
        })
    };

    let good = verifier()
        .verify(&json!(issuer.jwt(&claims(1))), &VerifyOptions::default())
        .await;
    assert!(good.verified, "{:?}", good.error);
    assert!(good.status_result.expect("status checked").verified);

    let revoked = verifier()
        .verify(&json!(issuer.jwt(&claims(2))), &VerifyOptions::default())
        .await;
    assert!(!revoked.verified);
}

// =========================================================================
// Per-item deadline: a list that answers too slowly fails the item
// =========================================================================

#[tokio::test]
async fn test_slow_status_list_times_out() {
    let server = MockServer::start().await;
    let issuer = Ed25519Signer::generate();
    let list_url = format!("{}/status/slow", server.uri());
    let list = issuer.issue(&status_list_credential(issuer.did(), &list_url, REVOCATION, &[]));
    Mock::given(method("GET"))
        .and(path("/status/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(serde_json::to_vec(&list).unwrap(), "application/json")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let vc = issuer.issue(&credential(
        issuer.did(),
        Some(bitstring_entry(&list_url, REVOCATION, 0)),
    ));
    let mut config = VerifierConfig::default();
    config.verification.item_timeout_secs = 1;
    let v = verifier_with(config);

    let results = v
        .verify_batch(&[vc, json!(42)], &VerifyOptions::default())
        .await;
    assert!(!results[0].verified);
    assert_eq!(results[0].error_name(), Some("TimeoutError"));
    assert_eq!(results[1].error_name(), Some("ClassificationError"));
}
