// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication and role-gating middleware.
//!
//! `require_auth` verifies the token and attaches the caller's [`Principal`]
//! to the request. `require_role` runs after it and checks the principal's
//! role against a set bound when the route is registered:
//!
//! ```ignore
//! Router::new()
//!     .route("/api/stripe/subscription-status", get(status))
//!     .route_layer(middleware::from_fn_with_state(
//!         authorize([Role::LdManager]),
//!         require_role,
//!     ))
//!     .route_layer(middleware::from_fn_with_state(state, require_auth));
//! ```

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{Principal, Role};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Middleware that requires a valid bearer token for a known user.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::NoToken)?;

    let principal =
        resolve_principal(token, &state.config.jwt_signing_key, state.users.as_ref()).await?;

    tracing::debug!(user_id = principal.id, role = %principal.role, "Request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the credential from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Verify `token` and resolve its subject to a principal.
///
/// Every failure collapses to one of the 401 variants; the underlying cause
/// is only logged.
pub async fn resolve_principal<S>(
    token: &str,
    signing_key: &[u8],
    users: &S,
) -> Result<Principal, AppError>
where
    S: UserStore + ?Sized,
{
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| {
        tracing::warn!(error = %e, "Token verification failed");
        AppError::TokenFailed
    })?;

    let user_id: u64 = token_data.claims.sub.parse().map_err(|_| {
        tracing::warn!("Token subject is not a user ID");
        AppError::TokenFailed
    })?;

    match users.find_principal(user_id).await {
        Ok(Some(principal)) => Ok(principal),
        Ok(None) => {
            tracing::warn!(user_id, "Token subject has no matching user");
            Err(AppError::UserNotFound)
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "User lookup failed during authentication");
            Err(AppError::TokenFailed)
        }
    }
}

/// Roles permitted on a route.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Check an (optional) authenticated principal against this set.
    pub fn check(&self, principal: Option<&Principal>) -> Result<(), AppError> {
        match principal {
            Some(p) if self.contains(p.role) => Ok(()),
            Some(p) => {
                tracing::warn!(user_id = p.id, role = %p.role, "Role not authorized");
                Err(AppError::RoleNotAuthorized)
            }
            None => Err(AppError::RoleNotAuthorized),
        }
    }
}

/// Build the role set for [`require_role`].
pub fn authorize<I>(roles: I) -> AllowedRoles
where
    I: IntoIterator<Item = Role>,
{
    AllowedRoles(roles.into_iter().collect())
}

/// Middleware that rejects principals whose role is not allowed (403).
pub async fn require_role(
    State(allowed): State<AllowedRoles>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    allowed.check(request.extensions().get::<Principal>())?;
    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
///
/// Issuance normally happens in the auth service; this exists for tests and
/// local tooling that need a token the middleware accepts.
pub fn create_jwt(user_id: u64, signing_key: &[u8], ttl_secs: usize) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::models::{SubscriptionStatus, UserRecord};
    use axum::http::HeaderValue;

    const KEY: &[u8] = b"unit_test_signing_key_32_bytes!!";

    fn store_with(role: Role) -> MemoryUserStore {
        MemoryUserStore::from_records([UserRecord {
            id: 42,
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            role,
            organization_id: None,
            subscription_status: Some(SubscriptionStatus::Active),
            password_hash: "hash".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }])
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_resolve_principal_found() {
        let users = store_with(Role::LdManager);
        let token = create_jwt(42, KEY, 3600).unwrap();

        let principal = resolve_principal(&token, KEY, &users).await.unwrap();
        assert_eq!(principal.id, 42);
        assert_eq!(principal.role, Role::LdManager);
    }

    #[tokio::test]
    async fn test_resolve_principal_wrong_key_skips_lookup() {
        let users = store_with(Role::LdManager);
        let token = create_jwt(42, b"some_other_key_that_is_long_enough", 3600).unwrap();

        let err = resolve_principal(&token, KEY, &users).await.unwrap_err();
        assert!(matches!(err, AppError::TokenFailed));
        assert_eq!(users.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_resolve_principal_unknown_user() {
        let users = MemoryUserStore::new();
        let token = create_jwt(42, KEY, 3600).unwrap();

        let err = resolve_principal(&token, KEY, &users).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn test_lookup_failure_reports_token_failed() {
        let users = crate::db::FirestoreDb::new_mock();
        let token = create_jwt(42, KEY, 3600).unwrap();

        let err = resolve_principal(&token, KEY, &users).await.unwrap_err();
        assert!(matches!(err, AppError::TokenFailed));
    }

    #[test]
    fn test_allowed_roles_check() {
        let allowed = authorize([Role::LdManager, Role::Admin]);
        let mut principal = store_with(Role::LdManager)
            .remove(42)
            .unwrap()
            .into_principal();

        assert!(allowed.check(Some(&principal)).is_ok());

        principal.role = Role::Employee;
        assert!(matches!(
            allowed.check(Some(&principal)),
            Err(AppError::RoleNotAuthorized)
        ));
        assert!(matches!(
            allowed.check(None),
            Err(AppError::RoleNotAuthorized)
        ));
    }
}
