// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local bearer-token sanity check.
//!
//! The signature is never verified here (the backend does that); this only
//! weeds out tokens that are obviously dead so they never hit the network.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Claims the dashboard cares about. All optional: the backend owns the format,
/// so a claim of an unexpected type is ignored rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject, either a string or a numeric user id
    pub sub: Option<String>,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: Option<i64>,
    /// Issued at (Unix timestamp, seconds)
    pub iat: Option<i64>,
    pub user_type: Option<String>,
}

/// Result of the local token check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(TokenClaims),
    Malformed,
    Expired { expired_at: i64 },
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid(_))
    }
}

/// Check a bearer token's shape and embedded expiry against `now`.
pub fn check_token(token: &str, now: DateTime<Utc>) -> TokenStatus {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return TokenStatus::Malformed;
    }

    let Some(claims) = decode_claims(segments[1]) else {
        return TokenStatus::Malformed;
    };

    match claims.exp {
        Some(exp) if exp < now.timestamp() => TokenStatus::Expired { expired_at: exp },
        _ => TokenStatus::Valid(claims),
    }
}

fn decode_claims(payload: &str) -> Option<TokenClaims> {
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    let claims = value.as_object()?;

    Some(TokenClaims {
        sub: claims.get("sub").and_then(claim_string),
        exp: claims.get("exp").and_then(numeric_date),
        iat: claims.get("iat").and_then(numeric_date),
        user_type: claims.get("user_type").and_then(claim_string),
    })
}

fn claim_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// JWT NumericDate: seconds since the epoch, possibly fractional.
fn numeric_date(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_token(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_800_000_000, 0).unwrap()
    }

    #[test]
    fn test_valid_token() {
        let token = make_token(r#"{"sub":"42","exp":1800000100,"user_type":"hospital"}"#);
        match check_token(&token, now()) {
            TokenStatus::Valid(claims) => {
                assert_eq!(claims.sub.as_deref(), Some("42"));
                assert_eq!(claims.user_type.as_deref(), Some("hospital"));
            }
            other => panic!("expected valid token, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_count() {
        assert_eq!(check_token("", now()), TokenStatus::Malformed);
        assert_eq!(check_token("abc", now()), TokenStatus::Malformed);
        assert_eq!(check_token("a.b", now()), TokenStatus::Malformed);
        assert_eq!(check_token("a.b.c.d", now()), TokenStatus::Malformed);
        assert_eq!(check_token("a..c", now()), TokenStatus::Malformed);
    }

    #[test]
    fn test_payload_must_be_json_object() {
        assert_eq!(check_token("x.!!!.y", now()), TokenStatus::Malformed);
        assert_eq!(check_token(&make_token("[1,2]"), now()), TokenStatus::Malformed);
        assert_eq!(check_token(&make_token("not json"), now()), TokenStatus::Malformed);
    }

    #[test]
    fn test_expired_token() {
        let token = make_token(r#"{"exp":1799999999}"#);
        assert_eq!(
            check_token(&token, now()),
            TokenStatus::Expired {
                expired_at: 1_799_999_999
            }
        );
    }

    #[test]
    fn test_expiry_boundary_is_still_valid() {
        let token = make_token(r#"{"exp":1800000000}"#);
        assert!(check_token(&token, now()).is_valid());
    }

    #[test]
    fn test_missing_exp_is_valid() {
        assert!(check_token(&make_token(r#"{"sub":"7"}"#), now()).is_valid());
    }

    #[test]
    fn test_numeric_subject_is_valid() {
        let token = make_token(r#"{"sub":42,"exp":1800003600,"user_type":"hospital"}"#);
        match check_token(&token, now()) {
            TokenStatus::Valid(claims) => {
                assert_eq!(claims.sub.as_deref(), Some("42"));
                assert_eq!(claims.exp, Some(1_800_003_600));
            }
            other => panic!("expected valid token, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_exp() {
        let token = make_token(r#"{"sub":"42","exp":1800003600.5}"#);
        match check_token(&token, now()) {
            TokenStatus::Valid(claims) => assert_eq!(claims.exp, Some(1_800_003_600)),
            other => panic!("expected valid token, got {:?}", other),
        }

        let token = make_token(r#"{"exp":1799999999.25}"#);
        assert_eq!(
            check_token(&token, now()),
            TokenStatus::Expired {
                expired_at: 1_799_999_999
            }
        );
    }

    #[test]
    fn test_unexpected_claim_types_are_ignored() {
        let token = make_token(r#"{"sub":{"id":42},"exp":"soon","user_type":["hospital"]}"#);
        assert_eq!(
            check_token(&token, now()),
            TokenStatus::Valid(TokenClaims::default())
        );
    }

    #[test]
    fn test_padded_payload_tolerated() {
        let payload = base64::engine::general_purpose::URL_SAFE.encode(r#"{"sub":"1"}"#);
        let token = format!("h.{}.s", payload);
        assert!(check_token(&token, now()).is_valid());
    }
}
