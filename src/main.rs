// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Curriculum-Auth API Server
//!
//! Serves the authenticated profile and billing-status endpoints behind the
//! bearer-token authorizer.

use curriculum_auth::{
    config::{Config, UserStoreKind},
    db::{FirestoreDb, MemoryUserStore, UserStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Curriculum-Auth API");

    let users: Arc<dyn UserStore> = match config.user_store {
        UserStoreKind::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await
                .expect("Failed to connect to Firestore"),
        ),
        UserStoreKind::Memory => {
            tracing::warn!("Using in-memory user store; no users will resolve");
            Arc::new(MemoryUserStore::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        users,
    });

    // Build router
    let app = curriculum_auth::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("curriculum_auth=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
