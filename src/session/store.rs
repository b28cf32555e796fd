// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: in-memory session state mirrored to durable storage.
//!
//! Token and user are committed and cleared together. The only window where
//! one exists without the other is a startup hydration that found a token
//! but no user; [`SessionStore::init`] repairs that by fetching the user.

use super::api::{EmployeeCredentials, LoginCredentials, RegisterManagerRequest, SessionApi};
use super::navigation::{Destination, Navigator, RouteName};
use super::storage::{keys, SessionStorage};
use super::SessionError;
use crate::models::{Principal, Role, SubscriptionStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use validator::Validate;

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
const EMPLOYEE_LOGIN_FAILED: &str = "Employee login failed.";
const PROFILE_FAILED: &str = "Could not load your profile. Please try again.";
const SUBSCRIPTION_FAILED: &str = "Could not refresh your subscription status.";
const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
const INVALID_FORM: &str = "Please check the form and try again.";

/// Result of [`SessionStore::fetch_current_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Principal and status were refreshed from the backend.
    Refreshed,
    /// Nothing to do: no session, another fetch in flight, or the session
    /// changed while the request was pending.
    Skipped,
    /// The session was invalid and has been cleared.
    LoggedOut,
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<Principal>,
    subscription_status: SubscriptionStatus,
    is_loading: bool,
    error: Option<String>,
}

impl SessionState {
    fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Releases the in-flight flag when the fetch finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Subscription status implied by a freshly fetched principal.
fn derive_status(user: &Principal) -> SubscriptionStatus {
    match user.role {
        Role::LdManager => user.subscription_status.unwrap_or_default(),
        Role::Employee => SubscriptionStatus::NotApplicable,
        Role::Admin => SubscriptionStatus::Inactive,
    }
}

/// Client-side session context.
pub struct SessionStore<A, S, N> {
    api: A,
    storage: S,
    navigator: N,
    state: Mutex<SessionState>,
    fetching_current_user: AtomicBool,
}

impl<A, S, N> SessionStore<A, S, N>
where
    A: SessionApi,
    S: SessionStorage,
    N: Navigator,
{
    /// Build a store, hydrating whatever session the storage holds.
    ///
    /// An unreadable user entry is treated as absent.
    pub fn open(api: A, storage: S, navigator: N) -> Self {
        let token = storage.get(keys::TOKEN);
        let user = storage
            .get(keys::USER)
            .and_then(|raw| match serde_json::from_str::<Principal>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding unreadable stored user");
                    None
                }
            });
        let subscription_status = storage
            .get(keys::SUBSCRIPTION_STATUS)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();

        tracing::debug!(
            has_token = token.is_some(),
            has_user = user.is_some(),
            status = %subscription_status,
            "Session hydrated"
        );

        Self {
            api,
            storage,
            navigator,
            state: Mutex::new(SessionState {
                token,
                user,
                subscription_status,
                ..SessionState::default()
            }),
            fetching_current_user: AtomicBool::new(false),
        }
    }

    /// Startup reconciliation; see [`Self::check_auth_status`].
    pub async fn init(&self) -> Result<(), SessionError> {
        self.check_auth_status().await
    }

    /// Give the collaborators back. Durable storage keeps the last commit.
    pub fn teardown(self) -> (A, S, N) {
        (self.api, self.storage, self.navigator)
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    // ─── Read Model ──────────────────────────────────────────────

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn has_active_subscription(&self) -> bool {
        self.state().subscription_status.is_active()
    }

    pub fn is_ld_manager(&self) -> bool {
        self.has_role(Role::LdManager)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.state()
            .user
            .as_ref()
            .is_some_and(|user| user.has_role(role))
    }

    pub fn current_user(&self) -> Option<Principal> {
        self.state().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        self.state().subscription_status
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // ─── Actions ─────────────────────────────────────────────────

    /// Log in an L&D manager and go to the requested page or the dashboard.
    ///
    /// Any failure leaves the store logged out.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(), SessionError> {
        if let Err(e) = credentials.validate() {
            tracing::debug!(error = %e, "Login form rejected");
            self.clear_session();
            return Err(self.fail(SessionError::Invalid(INVALID_FORM.to_string())));
        }

        self.begin_request();
        let result = self.api.login(credentials).await;

        let outcome = match result {
            Ok(payload) => {
                let status = payload.user.subscription_status.unwrap_or_default();
                tracing::info!(
                    user_id = payload.user.id,
                    role = %payload.user.role,
                    "Login successful"
                );
                self.commit(payload.token, payload.user, status);

                let destination = self
                    .navigator
                    .current_route()
                    .redirect
                    .map(Destination::Path)
                    .unwrap_or(Destination::Named(RouteName::LdDashboard));
                self.navigator.push(destination);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Login failed");
                self.clear_session();
                Err(self.fail(SessionError::from_api(
                    &e,
                    e.server_message().unwrap_or(LOGIN_FAILED),
                )))
            }
        };

        self.end_request();
        outcome
    }

    /// Create an L&D manager account and land on the dashboard.
    ///
    /// Never honors a pending redirect.
    pub async fn register_manager(
        &self,
        request: &RegisterManagerRequest,
    ) -> Result<(), SessionError> {
        if let Err(e) = request.validate() {
            tracing::debug!(error = %e, "Registration form rejected");
            return Err(self.fail(SessionError::Invalid(INVALID_FORM.to_string())));
        }

        self.begin_request();
        let result = self.api.register(request).await;

        let outcome = match result {
            Ok(payload) => {
                let status = payload.user.subscription_status.unwrap_or_default();
                tracing::info!(user_id = payload.user.id, "Registration successful");
                self.commit(payload.token, payload.user, status);
                self.navigator.push(Destination::Named(RouteName::LdDashboard));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Registration failed");
                Err(self.fail(SessionError::from_api(
                    &e,
                    e.server_message().unwrap_or(REGISTRATION_FAILED),
                )))
            }
        };

        self.end_request();
        outcome
    }

    /// Log in an employee. Employees are not billable, so the status is
    /// fixed to `N/A` and never fetched.
    pub async fn login_employee(
        &self,
        credentials: &EmployeeCredentials,
    ) -> Result<(), SessionError> {
        if let Err(e) = credentials.validate() {
            tracing::debug!(error = %e, "Employee login form rejected");
            return Err(self.fail(SessionError::Invalid(INVALID_FORM.to_string())));
        }

        self.begin_request();
        let result = self.api.login_employee(credentials).await;

        let outcome = match result {
            Ok(payload) => {
                let user = payload.profile.into_principal();
                tracing::info!(user_id = user.id, "Employee login successful");
                self.commit(payload.token, user, SubscriptionStatus::NotApplicable);
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Employee login failed");
                Err(self.fail(SessionError::from_api(
                    &e,
                    e.server_message().unwrap_or(EMPLOYEE_LOGIN_FAILED),
                )))
            }
        };

        self.end_request();
        outcome
    }

    /// Drop the session and go to the login page, unless already on a
    /// public page. Safe to call repeatedly.
    pub fn logout(&self) {
        tracing::info!("Logging out");
        self.clear_session();

        if !self.navigator.current_route().is_public() {
            self.navigator.push(Destination::Named(RouteName::Login));
        }
    }

    /// Re-resolve the principal with the stored token.
    ///
    /// Overlapping calls collapse into one backend request. A rejected
    /// token, or a cached user with no token, ends the session.
    pub async fn fetch_current_user(&self) -> Result<FetchOutcome, SessionError> {
        let (token, has_user) = {
            let state = self.state();
            (state.token.clone(), state.user.is_some())
        };

        let Some(token) = token else {
            if has_user {
                tracing::warn!("Cached user without a token; ending session");
                self.logout();
                return Ok(FetchOutcome::LoggedOut);
            }
            return Ok(FetchOutcome::Skipped);
        };

        let Some(_in_flight) = InFlight::acquire(&self.fetching_current_user) else {
            tracing::debug!("Current-user fetch already in flight");
            return Ok(FetchOutcome::Skipped);
        };

        self.begin_request();
        let result = self.api.get_me(&token).await;
        self.end_request();

        match result {
            Ok(user) => {
                if self.state().token.as_deref() != Some(token.as_str()) {
                    tracing::debug!("Session changed during fetch; discarding profile");
                    return Ok(FetchOutcome::Skipped);
                }
                let status = derive_status(&user);
                tracing::debug!(user_id = user.id, status = %status, "Current user refreshed");
                self.store_user(user, status);
                Ok(FetchOutcome::Refreshed)
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Stored token rejected; ending session");
                self.logout();
                Ok(FetchOutcome::LoggedOut)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch current user");
                Err(self.fail(SessionError::from_api(&e, PROFILE_FAILED)))
            }
        }
    }

    /// Repair a half-present session: fetch the user for a lone token, or
    /// log out a user with no token.
    pub async fn check_auth_status(&self) -> Result<(), SessionError> {
        let (has_token, has_user) = {
            let state = self.state();
            (state.token.is_some(), state.user.is_some())
        };

        match (has_token, has_user) {
            (true, false) => self.fetch_current_user().await.map(|_| ()),
            (false, true) => {
                tracing::warn!("Stored user without a token; ending session");
                self.logout();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Pull the billing status from the backend and mirror it into the user.
    ///
    /// A response that arrives after logout or a new login is dropped.
    pub async fn update_subscription_status(&self) -> Result<(), SessionError> {
        let token = {
            let state = self.state();
            state.user.as_ref().and(state.token.clone())
        };
        let Some(token) = token else {
            return Ok(());
        };

        let result = self.api.get_subscription_status(&token).await;

        if !self.holds_token(&token) {
            tracing::debug!("Session changed during billing check; discarding status");
            return Ok(());
        }

        match result {
            Ok(status) => {
                tracing::info!(status = %status, "Subscription status updated");
                self.apply_subscription_status(status);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("Stored token rejected during billing check; ending session");
                self.logout();
                Err(SessionError::Unauthenticated(SESSION_EXPIRED.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to update subscription status");
                Err(self.fail(SessionError::from_api(
                    &e,
                    e.server_message().unwrap_or(SUBSCRIPTION_FAILED),
                )))
            }
        }
    }

    /// Optimistically mark the subscription active after the payment
    /// provider reported a completed checkout.
    pub fn set_subscription_success(&self) {
        if !self.is_authenticated() {
            tracing::warn!("Checkout completed without a session; ignoring");
            return;
        }
        tracing::info!("Marking subscription active after checkout");
        self.apply_subscription_status(SubscriptionStatus::Active);
    }

    // ─── Internals ───────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the session is still the one that issued a request with `token`.
    fn holds_token(&self, token: &str) -> bool {
        let state = self.state();
        state.user.is_some() && state.token.as_deref() == Some(token)
    }

    fn begin_request(&self) {
        let mut state = self.state();
        state.is_loading = true;
        state.error = None;
    }

    fn end_request(&self) {
        self.state().is_loading = false;
    }

    /// Record a failure's message for the UI and hand the error back.
    fn fail(&self, err: SessionError) -> SessionError {
        self.state().error = Some(err.message().to_string());
        err
    }

    fn commit(&self, token: String, mut user: Principal, status: SubscriptionStatus) {
        user.subscription_status = Some(status);
        let user_json = serde_json::to_string(&user);
        {
            let mut state = self.state();
            state.token = Some(token.clone());
            state.user = Some(user);
            state.subscription_status = status;
        }

        self.persist(keys::TOKEN, &token);
        self.persist_user(user_json);
        self.persist(keys::SUBSCRIPTION_STATUS, status.as_str());
    }

    fn store_user(&self, mut user: Principal, status: SubscriptionStatus) {
        user.subscription_status = Some(status);
        let user_json = serde_json::to_string(&user);
        {
            let mut state = self.state();
            state.user = Some(user);
            state.subscription_status = status;
        }

        self.persist_user(user_json);
        self.persist(keys::SUBSCRIPTION_STATUS, status.as_str());
    }

    fn apply_subscription_status(&self, status: SubscriptionStatus) {
        let user_json = {
            let mut state = self.state();
            state.subscription_status = status;
            state.user.as_mut().map(|user| {
                user.subscription_status = Some(status);
                serde_json::to_string(user)
            })
        };

        self.persist(keys::SUBSCRIPTION_STATUS, status.as_str());
        if let Some(user_json) = user_json {
            self.persist_user(user_json);
        }
    }

    fn clear_session(&self) {
        {
            let mut state = self.state();
            state.token = None;
            state.user = None;
            state.subscription_status = SubscriptionStatus::Inactive;
        }

        for key in keys::ALL {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear session storage");
            }
        }
    }

    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to persist session data");
        }
    }

    fn persist_user(&self, user_json: serde_json::Result<String>) {
        match user_json {
            Ok(json) => self.persist(keys::USER, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user for storage"),
        }
    }
}
