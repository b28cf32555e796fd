// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session state.
//!
//! [`SessionStore`] is the single source of truth for who is logged in, the
//! bearer token they hold, and their subscription status. It is built from
//! three collaborators: a [`SessionApi`] for the backend, a
//! [`SessionStorage`] that survives restarts, and a [`Navigator`].

pub mod api;
pub mod navigation;
pub mod storage;
pub mod store;

pub use api::{
    ApiError, AuthPayload, EmployeeAuthPayload, EmployeeCredentials, EmployeeProfile,
    HttpSessionApi, LoginCredentials, RegisterManagerRequest, SessionApi,
};
pub use navigation::{Destination, Navigator, RecordingNavigator, Route, RouteName};
pub use storage::{open_configured, FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::{FetchOutcome, SessionStore};

/// Session action failures, as surfaced to the UI.
///
/// Messages are user-facing; diagnostic detail is only logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Missing, rejected or expired credential.
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid session, insufficient role.
    #[error("{0}")]
    Forbidden(String),

    /// Input rejected before contacting the backend.
    #[error("{0}")]
    Invalid(String),

    /// Backend or transport failure.
    #[error("{0}")]
    Service(String),
}

impl SessionError {
    /// Classify an API failure, attaching the message shown to the user.
    pub fn from_api(err: &ApiError, message: impl Into<String>) -> Self {
        let message = message.into();
        if err.is_unauthorized() {
            SessionError::Unauthenticated(message)
        } else if err.is_forbidden() {
            SessionError::Forbidden(message)
        } else {
            SessionError::Service(message)
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SessionError::Unauthenticated(m)
            | SessionError::Forbidden(m)
            | SessionError::Invalid(m)
            | SessionError::Service(m) => m,
        }
    }
}
