// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation collaborator used after session transitions.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Routes the session store knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteName {
    Landing,
    Login,
    LdDashboard,
}

impl RouteName {
    pub fn path(&self) -> &'static str {
        match self {
            RouteName::Landing => "/",
            RouteName::Login => "/login",
            RouteName::LdDashboard => "/ld/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        [RouteName::Landing, RouteName::Login, RouteName::LdDashboard]
            .into_iter()
            .find(|r| r.path() == path)
    }
}

/// Where to go next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Named(RouteName),
    Path(String),
}

/// Snapshot of the current location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub name: Option<RouteName>,
    pub path: String,
    /// Pending `?redirect=` target, set when a guard bounced the user to login.
    pub redirect: Option<String>,
}

impl Route {
    pub fn named(name: RouteName) -> Self {
        Self {
            name: Some(name),
            path: name.path().to_string(),
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    /// Login and landing are reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self.name, Some(RouteName::Login | RouteName::Landing))
    }
}

impl From<Destination> for Route {
    fn from(destination: Destination) -> Self {
        match destination {
            Destination::Named(name) => Route::named(name),
            Destination::Path(path) => Route {
                name: RouteName::from_path(&path),
                path,
                redirect: None,
            },
        }
    }
}

pub trait Navigator: Send + Sync {
    fn current_route(&self) -> Route;
    fn push(&self, destination: Destination);
}

/// Routes kept by [`RecordingNavigator`], current route included.
pub const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
struct History {
    routes: VecDeque<Route>,
    pushes: usize,
}

/// Navigator that keeps a bounded in-memory history; used headless and in
/// tests. Only the last [`HISTORY_LIMIT`] routes are retained.
#[derive(Debug)]
pub struct RecordingNavigator {
    history: Mutex<History>,
}

impl RecordingNavigator {
    pub fn starting_at(route: Route) -> Self {
        Self {
            history: Mutex::new(History {
                routes: VecDeque::from([route]),
                pushes: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retained routes, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.lock().routes.iter().cloned().collect()
    }

    /// Number of `push` calls so far, including routes no longer retained.
    pub fn push_count(&self) -> usize {
        self.lock().pushes
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::starting_at(Route::named(RouteName::Landing))
    }
}

impl Navigator for RecordingNavigator {
    fn current_route(&self) -> Route {
        self.lock()
            .routes
            .back()
            .cloned()
            .unwrap_or_else(|| Route::named(RouteName::Landing))
    }

    fn push(&self, destination: Destination) {
        let route = Route::from(destination);
        tracing::debug!(path = %route.path, "Navigating");

        let mut history = self.lock();
        if history.routes.len() == HISTORY_LIMIT {
            history.routes.pop_front();
        }
        history.routes.push_back(route);
        history.pushes += 1;
    }
}
