//! JSON-LD contexts shipped with the binary so well-known URLs never hit
//! the network.

use serde_json::Value;

pub const CREDENTIALS_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";
pub const DID_V1: &str = "https://www.w3.org/ns/did/v1";
pub const DATA_INTEGRITY_V2: &str = "https://w3id.org/security/data-integrity/v2";
pub const STATUS_LIST_2021_V1: &str = "https://w3id.org/vc/status-list/2021/v1";
pub const REVOCATION_LIST_2020_V1: &str = "https://w3id.org/vc-revocation-list-2020/v1";
pub const JWS_2020_V1: &str = "https://w3id.org/security/suites/jws-2020/v1";
pub const ED25519_2020_V1: &str = "https://w3id.org/security/suites/ed25519-2020/v1";
pub const MULTIKEY_V1: &str = "https://w3id.org/security/multikey/v1";

const BUNDLED: &[(&str, &str)] = &[
    (CREDENTIALS_V1, include_str!("contexts/credentials-v1.jsonld")),
    (CREDENTIALS_V2, include_str!("contexts/credentials-v2.jsonld")),
    (DID_V1, include_str!("contexts/did-v1.jsonld")),
    (DATA_INTEGRITY_V2, include_str!("contexts/data-integrity-v2.jsonld")),
    (STATUS_LIST_2021_V1, include_str!("contexts/status-list-2021-v1.jsonld")),
    (REVOCATION_LIST_2020_V1, include_str!("contexts/revocation-list-2020-v1.jsonld")),
    (JWS_2020_V1, include_str!("contexts/jws-2020-v1.jsonld")),
    (ED25519_2020_V1, include_str!("contexts/ed25519-2020-v1.jsonld")),
    (MULTIKEY_V1, include_str!("contexts/multikey-v1.jsonld")),
];

/// Parsed bundled contexts as `(url, document)` pairs.
pub fn bundled_contexts() -> Vec<(String, Value)> {
    BUNDLED
        .iter()
        .filter_map(|(url, raw)| match serde_json::from_str(raw) {
            Ok(document) => Some((url.to_string(), document)),
            Err(e) => {
                tracing::warn!(%url, error = %e, "skipping malformed bundled context");
                None
            }
        })
        .collect()
}
