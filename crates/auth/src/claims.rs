use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orgadmin_core::UserId;

/// Session token claims (transport-agnostic).
///
/// Tokens are issued by the external sign-in flow; this system only verifies
/// them and maps `sub` to a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the signed-in user.
    pub sub: UserId,

    /// Issued-at timestamp (seconds since epoch on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration timestamp (seconds since epoch on the wire).
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,
}

impl SessionClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub,
            iat: issued_at,
            exp: issued_at + ttl,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("malformed or badly signed token: {0}")]
    Malformed(String),

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate session claims against `now`.
///
/// Signature verification happens in [`SessionTokenCodec::verify`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// HS256 signer/verifier for session tokens.
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionTokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done by `validate_claims` with an explicit clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn sign(&self, claims: &SessionClaims) -> Result<String, TokenValidationError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))
    }

    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

impl core::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionTokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn verify_accepts_fresh_token() {
        let codec = SessionTokenCodec::new(b"secret");
        let claims = SessionClaims::new(UserId::new(), at(1_000), Duration::minutes(10));
        let token = codec.sign(&claims).unwrap();

        let decoded = codec.verify(&token, at(1_060)).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn verify_rejects_other_secret() {
        let claims = SessionClaims::new(UserId::new(), at(1_000), Duration::minutes(10));
        let token = SessionTokenCodec::new(b"a").sign(&claims).unwrap();

        let err = SessionTokenCodec::new(b"b").verify(&token, at(1_060)).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn time_window_is_enforced() {
        let claims = SessionClaims::new(UserId::new(), at(1_000), Duration::seconds(60));
        assert_eq!(validate_claims(&claims, at(999)), Err(TokenValidationError::NotYetValid));
        assert_eq!(validate_claims(&claims, at(1_060)), Err(TokenValidationError::Expired));
        assert_eq!(validate_claims(&claims, at(1_059)), Ok(()));

        let inverted = SessionClaims { exp: at(900), ..claims };
        assert_eq!(
            validate_claims(&inverted, at(950)),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
