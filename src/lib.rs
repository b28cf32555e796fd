// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Curriculum-Auth: authentication and session plumbing for the curriculum
//! platform.
//!
//! The server half ([`middleware`], [`routes`]) verifies bearer tokens and
//! gates routes by role. The client half ([`session`]) keeps the logged-in
//! user, token and subscription status in sync with durable storage.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;

use config::Config;
use db::UserStore;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
}
