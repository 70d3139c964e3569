//! Shared fixtures for the cross-crate verification scenarios.

use ed25519_dalek::Signer as _;
use flate2::write::GzEncoder;
use flate2::Compression;
use p256::ecdsa::signature::Signer as _;
use p256::pkcs8::EncodePrivateKey;
use rand::rngs::OsRng;
use serde_json::{json, Value};
use std::io::Write;
use veracity_core::VerifierConfig;
use veracity_credentials::{suite, Verifier};
use veracity_crypto::{base64url_encode, encode_multibase, KeyEncoding, KeyMaterial, KeyType};
use veracity_identity::did_key_from_key;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";

/// A signer that can attach Data Integrity proofs.
pub trait ProofSigner {
    fn did(&self) -> &str;
    fn method_id(&self) -> String;
    fn cryptosuite(&self) -> &'static str;
    fn sign_bytes(&self, data: &[u8]) -> Vec<u8>;

    /// Secure `document` with a proof for `purpose`; `extra` is merged into
    /// the proof before signing (challenge, domain).
    fn sign(&self, document: &Value, purpose: &str, extra: Value) -> Value {
        let mut proof = json!({
            "type": "DataIntegrityProof",
            "cryptosuite": self.cryptosuite(),
            "created": "2024-06-01T00:00:00Z",
            "verificationMethod": self.method_id(),
            "proofPurpose": purpose,
        });
        if let (Some(obj), Some(extra)) = (proof.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        let data = suite::hash_data(document, &proof).expect("hashable document");
        proof["proofValue"] = json!(encode_multibase(&self.sign_bytes(&data)));

        let mut secured = document.clone();
        secured["proof"] = proof;
        secured
    }

    fn issue(&self, document: &Value) -> Value {
        self.sign(document, "assertionMethod", json!({}))
    }
}

/// Ed25519 signer identified by a `did:key`.
pub struct Ed25519Signer {
    key: ed25519_dalek::SigningKey,
    did: String,
}

impl Ed25519Signer {
    pub fn generate() -> Self {
        let key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let material = KeyMaterial::new(
            KeyType::Ed25519,
            key.verifying_key().to_bytes().to_vec(),
            KeyEncoding::Multibase,
        )
        .expect("32-byte key");
        Self {
            did: did_key_from_key(&material),
            key,
        }
    }
}

impl ProofSigner for Ed25519Signer {
    fn did(&self) -> &str {
        &self.did
    }

    fn method_id(&self) -> String {
        format!("{}#{}", self.did, self.did.trim_start_matches("did:key:"))
    }

    fn cryptosuite(&self) -> &'static str {
        "eddsa-jcs-2022"
    }

    fn sign_bytes(&self, data: &[u8]) -> Vec<u8> {
        self.key.sign(data).to_bytes().to_vec()
    }
}

/// P-256 signer identified by a `did:jwk`; also signs ES256 JWTs.
pub struct P256Signer {
    key: p256::ecdsa::SigningKey,
    did: String,
}

impl P256Signer {
    pub fn generate() -> Self {
        let key = p256::ecdsa::SigningKey::random(&mut OsRng);
        let jwk = public_jwk(&key);
        let did = format!(
            "did:jwk:{}",
            base64url_encode(&serde_json::to_vec(&jwk).expect("serializable JWK"))
        );
        Self { key, did }
    }

    pub fn public_jwk(&self) -> Value {
        public_jwk(&self.key)
    }

    /// Sign `claims` as an ES256 JWT whose `kid` is this signer's method.
    pub fn jwt(&self, claims: &Value) -> String {
        let der = self.key.to_pkcs8_der().expect("PKCS#8 encoding");
        let mut header = jsonwebtoken::Header::new(jsonwebtoken::Algorithm::ES256);
        header.kid = Some(self.method_id());
        jsonwebtoken::encode(
            &header,
            claims,
            &jsonwebtoken::EncodingKey::from_ec_der(der.as_bytes()),
        )
        .expect("JWT encoding")
    }

    /// Sign a raw JWS with an arbitrary header (SD-JWT and KB-JWT).
    pub fn jws(&self, header: &Value, payload: &Value) -> String {
        let input = format!(
            "{}.{}",
            base64url_encode(&serde_json::to_vec(header).expect("header")),
            base64url_encode(&serde_json::to_vec(payload).expect("payload"))
        );
        format!("{}.{}", input, base64url_encode(&self.sign_bytes(input.as_bytes())))
    }
}

impl ProofSigner for P256Signer {
    fn did(&self) -> &str {
        &self.did
    }

    fn method_id(&self) -> String {
        format!("{}#0", self.did)
    }

    fn cryptosuite(&self) -> &'static str {
        "ecdsa-jcs-2019"
    }

    fn sign_bytes(&self, data: &[u8]) -> Vec<u8> {
        let signature: p256::ecdsa::Signature = self.key.sign(data);
        signature.to_bytes().to_vec()
    }
}

fn public_jwk(key: &p256::ecdsa::SigningKey) -> Value {
    let point = key.verifying_key().to_encoded_point(false);
    json!({
        "kty": "EC",
        "crv": "P-256",
        "x": base64url_encode(point.x().expect("uncompressed point")),
        "y": base64url_encode(point.y().expect("uncompressed point")),
    })
}

/// An unsigned credential from `issuer`, with optional status entries.
pub fn credential(issuer: &str, status: Option<Value>) -> Value {
    let mut vc = json!({
        "@context": [CREDENTIALS_V2],
        "id": "urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5",
        "type": ["VerifiableCredential"],
        "issuer": issuer,
        "validFrom": "2024-01-01T00:00:00Z",
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "alumniOf": "Example University"
        }
    });
    if let Some(status) = status {
        vc["credentialStatus"] = status;
    }
    vc
}

/// An unsigned presentation wrapping `credentials`.
pub fn presentation(holder: &str, credentials: Vec<Value>) -> Value {
    json!({
        "@context": [CREDENTIALS_V2],
        "type": ["VerifiablePresentation"],
        "holder": holder,
        "verifiableCredential": credentials,
    })
}

pub fn bitstring_entry(list_url: &str, purpose: &str, index: u64) -> Value {
    json!({
        "id": format!("{}#{}", list_url, index),
        "type": "BitstringStatusListEntry",
        "statusPurpose": purpose,
        "statusListIndex": index.to_string(),
        "statusListCredential": list_url,
    })
}

/// GZIP + base64url bitstring of `len_bytes` bytes with `set_bits` set.
pub fn encoded_list(len_bytes: usize, set_bits: &[usize]) -> String {
    let mut bytes = vec![0u8; len_bytes];
    for &i in set_bits {
        bytes[i / 8] |= 0x80 >> (i % 8);
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&bytes).expect("in-memory write");
    base64url_encode(&encoder.finish().expect("in-memory gzip"))
}

/// An unsigned `BitstringStatusListCredential`.
pub fn status_list_credential(
    issuer: &str,
    list_url: &str,
    purpose: &str,
    set_bits: &[usize],
) -> Value {
    json!({
        "@context": [CREDENTIALS_V2],
        "id": list_url,
        "type": ["VerifiableCredential", "BitstringStatusListCredential"],
        "issuer": issuer,
        "validFrom": "2024-01-01T00:00:00Z",
        "credentialSubject": {
            "id": format!("{}#list", list_url),
            "type": "BitstringStatusList",
            "statusPurpose": purpose,
            "encodedList": encoded_list(16 * 1024, set_bits),
        }
    })
}

/// Serve `body` as JSON at `route` on `server`.
pub async fn host_json(server: &MockServer, route: &str, body: &Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(serde_json::to_vec(body).expect("JSON body"), "application/json"),
        )
        .mount(server)
        .await;
}

/// A verifier with a fresh document cache.
pub fn verifier() -> Verifier {
    verifier_with(VerifierConfig::default())
}

pub fn verifier_with(config: VerifierConfig) -> Verifier {
    Verifier::from_config(&config).expect("default loader")
}
