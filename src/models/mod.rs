// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models shared by the server and the session client.

pub mod user;

pub use user::{Principal, Role, SubscriptionStatus, UserRecord};
