//! Bearer tokens: compact HS256 JWTs carrying `{userId, role, iat, exp}`.
//!
//! Verification checks the algorithm, then the signature, then expiry, so a
//! tampered token is always reported as invalid even if it is also stale.
//! There is no revocation list.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

use crate::store::Role;
use crate::types::{AccountId, Error, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated subject attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: AccountId,
    pub role: Role,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens with a shared secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CredentialVerifier {
    pub fn new(secret: impl AsRef<[u8]>, ttl: std::time::Duration) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(Error::validation("JWT secret cannot be empty"));
        }
        let ttl = Duration::from_std(ttl)
            .map_err(|e| Error::validation(format!("token ttl out of range: {}", e)))?;
        Ok(Self {
            secret: secret.to_vec(),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::internal(format!("hmac key: {}", e)))
    }

    pub fn issue(&self, account_id: &AccountId, role: Role) -> Result<IssuedToken> {
        self.issue_at(account_id, role, Utc::now())
    }

    pub fn issue_at(
        &self,
        account_id: &AccountId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            user_id: account_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{}.{}", signing_input, signature),
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> Result<AuthContext> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AuthContext> {
        let mut parts = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(Error::token_invalid("malformed token")),
            };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(Error::token_invalid(format!(
                "unsupported algorithm: {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| Error::token_invalid("signature is not base64url"))?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::token_invalid("signature mismatch"))?;

        let claims: Claims = decode_segment(payload_b64)?;
        if now.timestamp() >= claims.exp {
            return Err(Error::TokenExpired);
        }

        let account_id = AccountId::from_string(claims.user_id)
            .map_err(|e| Error::token_invalid(e.to_string()))?;
        Ok(AuthContext {
            account_id,
            role: claims.role,
        })
    }

    /// Verify the value of an `Authorization` header.
    pub fn verify_header(&self, header: Option<&str>) -> Result<AuthContext> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::unauthenticated("No token provided. Authorization denied."))?;
        self.verify(token)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| Error::token_invalid("segment is not base64url"))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::token_invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new("test-secret", StdDuration::from_secs(24 * 3600)).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let v = verifier();
        let id = AccountId::new();
        let issued = v.issue(&id, Role::Admin).unwrap();

        let ctx = v.verify(&issued.token).unwrap();
        assert_eq!(ctx.account_id, id);
        assert!(ctx.is_admin());
    }

    #[test]
    fn test_claims_use_user_id_key() {
        let issued = verifier().issue(&AccountId::new(), Role::User).unwrap();
        let payload = issued.token.split('.').nth(1).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert!(json.get("userId").is_some());
        assert_eq!(json["role"], "user");
        assert_eq!(
            json["exp"].as_i64().unwrap() - json["iat"].as_i64().unwrap(),
            24 * 3600
        );
    }

    #[test]
    fn test_expired_token() {
        let v = verifier();
        let issued_at = Utc::now() - Duration::hours(25);
        let issued = v.issue_at(&AccountId::new(), Role::User, issued_at).unwrap();

        assert!(matches!(v.verify(&issued.token), Err(Error::TokenExpired)));
    }

    #[test]
    fn test_token_valid_until_window_ends() {
        let v = verifier();
        let now = Utc::now();
        let issued = v.issue_at(&AccountId::new(), Role::User, now).unwrap();

        assert!(v.verify_at(&issued.token, now + Duration::hours(23)).is_ok());
        assert!(matches!(
            v.verify_at(&issued.token, now + Duration::hours(24)),
            Err(Error::TokenExpired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let other = CredentialVerifier::new("other", StdDuration::from_secs(60)).unwrap();
        let issued = other.issue(&AccountId::new(), Role::User).unwrap();

        assert!(matches!(
            verifier().verify(&issued.token),
            Err(Error::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_forged_expired_token_is_invalid_not_expired() {
        let other = CredentialVerifier::new("other", StdDuration::from_secs(60)).unwrap();
        let issued = other
            .issue_at(&AccountId::new(), Role::User, Utc::now() - Duration::days(2))
            .unwrap();

        assert!(matches!(
            verifier().verify(&issued.token),
            Err(Error::TokenInvalid(_))
        ));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let v = verifier();
        let issued = v.issue(&AccountId::new(), Role::User).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let forged_claims = Claims {
            user_id: AccountId::new().to_string(),
            role: Role::Admin,
            iat: 0,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(v.verify(&forged), Err(Error::TokenInvalid(_))));
    }

    #[test]
    fn test_alg_none_is_rejected() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"userId":"x","role":"admin","iat":0,"exp":9999999999}"#);
        let token = format!("{}.{}.", header, payload);

        assert!(matches!(verifier().verify(&token), Err(Error::TokenInvalid(_))));
    }

    #[test]
    fn test_malformed_tokens() {
        let v = verifier();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(matches!(v.verify(token), Err(Error::TokenInvalid(_))), "{token}");
        }
    }

    #[test]
    fn test_verify_header() {
        let v = verifier();
        let issued = v.issue(&AccountId::new(), Role::User).unwrap();

        assert!(matches!(
            v.verify_header(None),
            Err(Error::Unauthenticated(_))
        ));
        assert!(matches!(
            v.verify_header(Some(&issued.token)),
            Err(Error::Unauthenticated(_))
        ));
        assert!(matches!(
            v.verify_header(Some("Bearer ")),
            Err(Error::Unauthenticated(_))
        ));
        assert!(v
            .verify_header(Some(&format!("Bearer {}", issued.token)))
            .is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(CredentialVerifier::new("", StdDuration::from_secs(60)).is_err());
    }
}
