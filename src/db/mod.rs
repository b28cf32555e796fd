// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer: user lookups for the request authorizer.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryUserStore;

use crate::error::AppError;
use crate::models::Principal;
use async_trait::async_trait;
use std::sync::Arc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Resolves token subjects to principals.
///
/// Implementations must never return the stored password hash; the
/// [`Principal`] type has no field for it.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by ID. `Ok(None)` when no such user exists.
    async fn find_principal(&self, user_id: u64) -> Result<Option<Principal>, AppError>;
}

#[async_trait]
impl<S: UserStore + ?Sized> UserStore for Arc<S> {
    async fn find_principal(&self, user_id: u64) -> Result<Option<Principal>, AppError> {
        (**self).find_principal(user_id).await
    }
}
