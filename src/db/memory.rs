// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory user store for tests and local development.

use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{Principal, UserRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// User store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: DashMap<u64, UserRecord>,
    lookups: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.insert(record.id, record);
    }

    pub fn remove(&self, user_id: u64) -> Option<UserRecord> {
        self.users.remove(&user_id).map(|(_, record)| record)
    }

    /// Number of `find_principal` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_principal(&self, user_id: u64) -> Result<Option<Principal>, AppError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .users
            .get(&user_id)
            .map(|entry| entry.value().clone().into_principal()))
    }
}
