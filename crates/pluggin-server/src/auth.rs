//! Session tokens and the admin gate.
//!
//! A token is `base64url(user_id \n email \n expires_at) . base64url(hmac)`,
//! keyed by the configured session secret. Verification recomputes the MAC
//! (constant-time compare via `Mac::verify_slice`) and then checks expiry.
//! Authorization is a role-table lookup, never an email comparison.

use crate::AppState;
use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use pluggin_api::{ApiError, ApiErrorCode};
use pluggin_model::Role;
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionClaims {
    pub user_id: String,
    pub email: String,
    pub expires_at: i64,
}

pub(crate) fn mint_session_token(secret: &str, claims: &SessionClaims) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(
        "{}\n{}\n{}",
        claims.user_id, claims.email, claims.expires_at
    ));
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{payload}.{signature}")
}

pub(crate) fn verify_session_token(secret: &str, token: &str, now: i64) -> Option<SessionClaims> {
    let (payload, signature) = token.split_once('.')?;
    let signature_bytes = URL_SAFE_NO_PAD.decode(signature).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature_bytes).ok()?;

    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let mut parts = decoded.splitn(3, '\n');
    let user_id = parts.next()?.to_string();
    let email = parts.next()?.to_string();
    let expires_at: i64 = parts.next()?.parse().ok()?;
    if user_id.is_empty() || email.is_empty() || expires_at <= now {
        return None;
    }
    Some(SessionClaims {
        user_id,
        email,
        expires_at,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 401 for a missing/expired/forged token, 403 for a valid token whose
/// subject lacks the admin role.
pub(crate) async fn require_admin(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionClaims, ApiError> {
    let Some(secret) = state.api.session_secret.as_deref().filter(|s| !s.is_empty()) else {
        return Err(ApiError::new(
            ApiErrorCode::Unauthorized,
            "admin surface is not configured",
            json!({}),
            "req-unknown",
        ));
    };
    let Some(token) = bearer_token(headers) else {
        return Err(ApiError::new(
            ApiErrorCode::Unauthorized,
            "missing bearer token",
            json!({}),
            "req-unknown",
        ));
    };
    let Some(claims) = verify_session_token(secret, token, pluggin_core::unix_now_secs()) else {
        return Err(ApiError::new(
            ApiErrorCode::Unauthorized,
            "invalid or expired session token",
            json!({}),
            "req-unknown",
        ));
    };
    let is_admin = state
        .store
        .has_role(claims.user_id.clone(), Role::Admin)
        .await
        .map_err(|e| ApiError::internal(format!("role lookup failed: {e}")))?;
    if !is_admin {
        return Err(ApiError::new(
            ApiErrorCode::Forbidden,
            "admin role required",
            json!({}),
            "req-unknown",
        ));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(expires_at: i64) -> SessionClaims {
        SessionClaims {
            user_id: "u-1".to_string(),
            email: "buyer@example.com".to_string(),
            expires_at,
        }
    }

    #[test]
    fn token_round_trips() {
        let token = mint_session_token("secret", &claims(i64::MAX));
        let verified = verify_session_token("secret", &token, 1_700_000_000).expect("verify");
        assert_eq!(verified.user_id, "u-1");
        assert_eq!(verified.email, "buyer@example.com");
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = mint_session_token("secret", &claims(i64::MAX));
        let mut forged = token.clone();
        forged.replace_range(0..1, if token.starts_with('A') { "B" } else { "A" });
        assert!(verify_session_token("secret", &forged, 0).is_none());
        assert!(verify_session_token("other-secret", &token, 0).is_none());
        assert!(verify_session_token("secret", "not-a-token", 0).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = mint_session_token("secret", &claims(100));
        assert!(verify_session_token("secret", &token, 99).is_some());
        assert!(verify_session_token("secret", &token, 100).is_none());
    }
}
