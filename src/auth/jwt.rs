use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::claims::Claims;
use crate::state::AppState;

/// Why a token failed verification. Expired and structurally invalid
/// tokens are distinct outcomes; neither is ever conflated with a subject.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Signature expired. Please log in again.")]
    Expired,
    #[error("Invalid token. Please log in again.")]
    Invalid,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: TimeDuration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let auth = &state.config.auth;
        Self {
            encoding: EncodingKey::from_secret(auth.secret_key.as_bytes()),
            decoding: DecodingKey::from_secret(auth.secret_key.as_bytes()),
            ttl: TimeDuration::seconds(auth.token_ttl_seconds),
        }
    }
}

impl JwtKeys {
    /// Issue a signed bearer token with the user id as subject.
    pub fn sign(&self, user_id: i32) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: (now + self.ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "auth token signed");
        Ok(token)
    }

    /// Verify signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        debug!(user_id = data.claims.sub, "auth token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRef;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    #[tokio::test]
    async fn sign_and_verify_returns_subject() {
        let keys = make_keys();
        let token = keys.sign(7).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, 7);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn expired_token_is_a_distinct_outcome() {
        let keys = make_keys();
        let past = OffsetDateTime::now_utc() - TimeDuration::seconds(120);
        let claims = Claims {
            sub: 7,
            iat: (past - TimeDuration::seconds(60)).unix_timestamp() as usize,
            exp: past.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_not_expired() {
        let keys = make_keys();
        assert_eq!(keys.verify("not-a-token"), Err(TokenError::Invalid));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let keys = make_keys();
        let token = keys.sign(7).expect("sign");
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"other-secret"),
            decoding: DecodingKey::from_secret(b"other-secret"),
            ttl: TimeDuration::seconds(3600),
        };
        assert_eq!(other.verify(&token), Err(TokenError::Invalid));
    }
}
