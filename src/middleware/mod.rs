// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, role gating).

pub mod auth;

pub use auth::{authorize, require_auth, require_role, AllowedRoles};
