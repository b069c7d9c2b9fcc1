use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::ids::IdInput;
use crate::state::AppState;
use crate::users::repo::User;

/// Extractor gating a route on a valid bearer token that resolves to a
/// known user. Registration and login stay reachable without it.
pub struct CurrentUser(pub User);

const MISSING_CREDENTIALS: &str = "Please provide your credentials.";
const MALFORMED_BEARER: &str = "Bearer token malformed.";
const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized(MISSING_CREDENTIALS.into()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized(MALFORMED_BEARER.into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "bearer token rejected");
            ApiError::Unauthorized(INVALID_CREDENTIALS.into())
        })?;

        let user = User::get_by_id(&state.db, &IdInput::from(claims.sub))
            .await?
            .ok_or_else(|| {
                warn!(user_id = claims.sub, "token subject does not exist");
                ApiError::Unauthorized(INVALID_CREDENTIALS.into())
            })?;

        Ok(CurrentUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/expense/");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        builder.body(()).expect("request").into_parts().0
    }

    async fn rejection(value: Option<&str>) -> ApiError {
        let state = AppState::fake();
        let mut parts = parts_with_auth(value);
        CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should be rejected")
    }

    fn reason(err: ApiError) -> String {
        match err {
            ApiError::Unauthorized(reason) => reason,
            other => panic!("expected Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_header_asks_for_credentials() {
        assert_eq!(reason(rejection(None).await), MISSING_CREDENTIALS);
    }

    #[tokio::test]
    async fn header_without_bearer_scheme_is_malformed() {
        assert_eq!(reason(rejection(Some("Token abc")).await), MALFORMED_BEARER);
    }

    #[tokio::test]
    async fn bare_scheme_without_token_is_malformed() {
        assert_eq!(reason(rejection(Some("Bearer ")).await), MALFORMED_BEARER);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        assert_eq!(
            reason(rejection(Some("Bearer not-a-jwt")).await),
            INVALID_CREDENTIALS
        );
    }
}
