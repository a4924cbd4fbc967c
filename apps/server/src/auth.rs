use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::AuthClient;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed token before it is rejected (24 hours).
const MAX_TOKEN_AGE_SECS: i64 = 86400;

/// Validates a signed client token and extracts the client identity.
///
/// The identity provider in front of this API signs a JSON payload
/// `{"id": ..., "name": ..., "issued_at": <unix secs>}` with HMAC-SHA256
/// over the shared `AUTH_SECRET`. Token format:
/// `<hex(payload)>.<hex(signature)>`.
pub fn validate_token(token: &str, secret: &str) -> Option<AuthClient> {
    let (payload_hex, sig_hex) = token.split_once('.')?;
    let payload = hex::decode(payload_hex).ok()?;
    let signature = hex::decode(sig_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(&payload);
    if mac.verify_slice(&signature).is_err() {
        tracing::warn!("client token signature mismatch");
        return None;
    }

    let client: AuthClient = serde_json::from_slice(&payload).ok()?;
    if client.id.is_empty() {
        return None;
    }

    // Reject stale tokens to limit replay.
    let age = chrono::Utc::now().timestamp() - client.issued_at;
    if age > MAX_TOKEN_AGE_SECS {
        tracing::warn!("client token expired: issued_at={}, age={}s", client.issued_at, age);
        return None;
    }

    Some(client)
}

/// Extract the client from the Authorization header.
/// Header format: `Signed <token>`.
pub fn extract_client_from_header(auth_header: &str, secret: &str) -> Option<AuthClient> {
    let token = auth_header.strip_prefix("Signed ")?;
    validate_token(token, secret)
}

/// Check whether the authenticated client is the configured administrator.
pub fn is_admin(client: &AuthClient, admin_client_id: &str) -> bool {
    client.id == admin_client_id
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    /// Build a token the way the upstream provider would.
    fn sign(payload: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        let sig = hex::encode(mac.finalize().into_bytes());
        format!("{}.{}", hex::encode(payload.as_bytes()), sig)
    }

    fn fresh_payload(id: &str, name: &str) -> String {
        format!(
            r#"{{"id":"{}","name":"{}","issued_at":{}}}"#,
            id,
            name,
            chrono::Utc::now().timestamp()
        )
    }

    #[test]
    fn test_valid_token_roundtrip() {
        let token = sign(&fresh_payload("client-7", "Carla"), SECRET);
        let client = validate_token(&token, SECRET).unwrap();
        assert_eq!(client.id, "client-7");
        assert_eq!(client.name, "Carla");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = sign(&fresh_payload("client-7", "Carla"), "other-secret");
        assert!(validate_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = sign(&fresh_payload("client-7", "Carla"), SECRET);
        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = hex::encode(fresh_payload("admin", "Eve").as_bytes());
        let forged = format!("{}.{}", forged_payload, sig);
        assert!(validate_token(&forged, SECRET).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued_at = chrono::Utc::now().timestamp() - MAX_TOKEN_AGE_SECS - 60;
        let payload = format!(r#"{{"id":"client-7","name":"Carla","issued_at":{}}}"#, issued_at);
        let token = sign(&payload, SECRET);
        assert!(validate_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_empty_id_rejected() {
        let token = sign(&fresh_payload("", "Nadie"), SECRET);
        assert!(validate_token(&token, SECRET).is_none());
    }

    #[test]
    fn test_malformed_token_rejected() {
        assert!(validate_token("not-a-token", SECRET).is_none());
        assert!(validate_token("zzzz.zzzz", SECRET).is_none());
        assert!(validate_token("", SECRET).is_none());
    }

    #[test]
    fn test_header_prefix_required() {
        let token = sign(&fresh_payload("client-7", "Carla"), SECRET);
        assert!(extract_client_from_header(&format!("Signed {}", token), SECRET).is_some());
        assert!(extract_client_from_header(&token, SECRET).is_none());
        assert!(extract_client_from_header(&format!("Bearer {}", token), SECRET).is_none());
    }

    #[test]
    fn test_is_admin_matches_configured_id() {
        let token = sign(&fresh_payload("owner-1", "Dora"), SECRET);
        let client = validate_token(&token, SECRET).unwrap();
        assert!(is_admin(&client, "owner-1"));
        assert!(!is_admin(&client, "owner-2"));
    }
}
