//! Identity extractors for axum.
//!
//! - `AuthenticatedUser` - end user resolved by the `UserIdentityValidator`
//!   in router state, from the header that validator names
//! - `AuthenticatedAdmin` - operator identified by `X-Admin-Id` and proven
//!   by `Authorization: Bearer <admin token>`
//!
//! The admin token is compared in constant time.
//!
//! # Example
//!
//! ```ignore
//! async fn approve(admin: AuthenticatedAdmin) -> impl IntoResponse {
//!     format!("acting as {}", admin.admin_id)
//! }
//! ```

use axum::{
    extract::FromRef,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::adapters::http::error::ErrorResponse;
use crate::domain::foundation::{AdminId, UserId};
use crate::ports::UserIdentityValidator;

pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// End user identity validator, pulled from router state.
#[derive(Clone)]
pub struct IdentityProvider(pub Arc<dyn UserIdentityValidator>);

/// Shared admin bearer token, pulled from router state.
#[derive(Clone)]
pub struct AdminToken(pub SecretString);

impl AdminToken {
    /// Constant-time comparison against a presented token.
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.expose_secret();
        if expected.is_empty() {
            return false;
        }
        expected.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

/// End user making the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Operator making an admin request.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedAdmin {
    pub admin_id: AdminId,
}

/// Rejection for the identity extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Identity header absent or malformed.
    Unauthenticated,
    /// Admin bearer token absent or wrong.
    InvalidAdminToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let message = match self {
            AuthRejection::Unauthenticated => "Authentication is required",
            AuthRejection::InvalidAdminToken => "Invalid admin credentials",
        };
        let body = ErrorResponse::new("AUTHENTICATION_FAILED", message);
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

fn positive_id(parts: &Parts, header: &str) -> Option<i64> {
    parts
        .headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    IdentityProvider: FromRef<S>,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let IdentityProvider(validator) = IdentityProvider::from_ref(state);
            let credential = parts
                .headers
                .get(validator.credential_header())
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or(AuthRejection::Unauthenticated)?;

            match validator.validate(credential).await {
                Ok(user_id) => Ok(AuthenticatedUser { user_id }),
                Err(err) => {
                    tracing::warn!(error = %err, "user credential rejected");
                    Err(AuthRejection::Unauthenticated)
                }
            }
        })
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedAdmin
where
    S: Send + Sync,
    AdminToken: FromRef<S>,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = AdminToken::from_ref(state);
            let presented = bearer(parts).ok_or(AuthRejection::InvalidAdminToken)?;
            if !token.matches(presented) {
                tracing::warn!("admin request with invalid token");
                return Err(AuthRejection::InvalidAdminToken);
            }

            positive_id(parts, ADMIN_ID_HEADER)
                .map(|id| AuthenticatedAdmin {
                    admin_id: AdminId::new(id),
                })
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::{sign_init_data, TelegramInitDataValidator, TrustedHeaderValidator};
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    #[derive(Clone)]
    struct TestState(AdminToken, IdentityProvider);

    impl FromRef<TestState> for AdminToken {
        fn from_ref(state: &TestState) -> Self {
            state.0.clone()
        }
    }

    impl FromRef<TestState> for IdentityProvider {
        fn from_ref(state: &TestState) -> Self {
            state.1.clone()
        }
    }

    fn state() -> TestState {
        TestState(
            AdminToken(SecretString::new("a".repeat(32))),
            IdentityProvider(Arc::new(TrustedHeaderValidator)),
        )
    }

    fn telegram_state(bot_token: &str) -> TestState {
        let validator = TelegramInitDataValidator::new(SecretString::new(bot_token.to_string()));
        TestState(
            AdminToken(SecretString::new("a".repeat(32))),
            IdentityProvider(Arc::new(validator)),
        )
    }

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn user_header_is_parsed() {
        let mut parts = parts(&[("X-User-Id", " 42 ")]);
        let user = AuthenticatedUser::from_request_parts(&mut parts, &state()).await.unwrap();
        assert_eq!(user.user_id, UserId::new(42));
    }

    #[tokio::test]
    async fn missing_or_bad_user_header_is_rejected() {
        for headers in [vec![], vec![("X-User-Id", "abc")], vec![("X-User-Id", "0")]] {
            let mut parts = parts(&headers);
            let err = AuthenticatedUser::from_request_parts(&mut parts, &state()).await.unwrap_err();
            assert_eq!(err, AuthRejection::Unauthenticated);
        }
    }

    #[tokio::test]
    async fn signed_init_data_identifies_user() {
        let init_data = sign_init_data("bot:token", &[("user", r#"{"id":77}"#)]);
        let mut parts = parts(&[("X-Telegram-Init-Data", init_data.as_str())]);

        let user = AuthenticatedUser::from_request_parts(&mut parts, &telegram_state("bot:token"))
            .await
            .unwrap();

        assert_eq!(user.user_id, UserId::new(77));
    }

    #[tokio::test]
    async fn forwarded_user_id_is_ignored_when_init_data_is_required() {
        let forged = sign_init_data("other:token", &[("user", r#"{"id":77}"#)]);
        for headers in [
            vec![("X-User-Id", "77")],
            vec![("X-User-Id", "77"), ("X-Telegram-Init-Data", forged.as_str())],
        ] {
            let mut parts = parts(&headers);
            let err = AuthenticatedUser::from_request_parts(&mut parts, &telegram_state("bot:token"))
                .await
                .unwrap_err();
            assert_eq!(err, AuthRejection::Unauthenticated);
        }
    }

    #[tokio::test]
    async fn admin_requires_matching_token() {
        let token = format!("Bearer {}", "a".repeat(32));
        let mut ok = parts(&[("X-Admin-Id", "7"), ("Authorization", &token)]);
        let admin = AuthenticatedAdmin::from_request_parts(&mut ok, &state()).await.unwrap();
        assert_eq!(admin.admin_id, AdminId::new(7));

        let mut wrong = parts(&[("X-Admin-Id", "7"), ("Authorization", "Bearer nope")]);
        let err = AuthenticatedAdmin::from_request_parts(&mut wrong, &state()).await.unwrap_err();
        assert_eq!(err, AuthRejection::InvalidAdminToken);
    }

    #[test]
    fn empty_configured_token_never_matches() {
        let token = AdminToken(SecretString::new(String::new()));
        assert!(!token.matches(""));
    }
}
