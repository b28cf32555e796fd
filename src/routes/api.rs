// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::Result;
use crate::middleware::auth::{authorize, require_role};
use crate::models::{Principal, Role, SubscriptionStatus};
use crate::AppState;
use axum::{middleware, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes; role
/// gates are applied here, per route group.
pub fn routes() -> Router<Arc<AppState>> {
    let any_user = Router::new().route("/api/auth/me", get(get_me));

    let managers = Router::new()
        .route(
            "/api/stripe/subscription-status",
            get(get_subscription_status),
        )
        .route_layer(middleware::from_fn_with_state(
            authorize([Role::LdManager]),
            require_role,
        ));

    let employees = Router::new()
        .route("/api/employees/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(
            authorize([Role::Employee]),
            require_role,
        ));

    any_user.merge(managers).merge(employees)
}

/// Get the caller's profile. The password hash never reaches this point.
async fn get_me(Extension(principal): Extension<Principal>) -> Result<Json<Principal>> {
    Ok(Json(principal))
}

/// Subscription status response.
#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SubscriptionStatusResponse {
    pub status: SubscriptionStatus,
}

async fn get_subscription_status(
    Extension(principal): Extension<Principal>,
) -> Result<Json<SubscriptionStatusResponse>> {
    let status = principal.subscription_status.unwrap_or_default();
    tracing::debug!(user_id = principal.id, status = %status, "Subscription status requested");
    Ok(Json(SubscriptionStatusResponse { status }))
}
