// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use curriculum_auth::config::Config;
use curriculum_auth::db::{FirestoreDb, MemoryUserStore};
use curriculum_auth::models::{Principal, Role, SubscriptionStatus, UserRecord};
use curriculum_auth::routes::create_router;
use curriculum_auth::session::{
    ApiError, AuthPayload, EmployeeAuthPayload, EmployeeCredentials, LoginCredentials,
    RegisterManagerRequest, SessionApi,
};
use curriculum_auth::AppState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MANAGER_ID: u64 = 1001;
pub const EMPLOYEE_ID: u64 = 1002;
pub const ADMIN_ID: u64 = 1003;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A stored user row with a password hash that must never leak.
#[allow(dead_code)]
pub fn user_record(id: u64, role: Role, status: Option<SubscriptionStatus>) -> UserRecord {
    UserRecord {
        id,
        name: format!("User {}", id),
        email: format!("user{}@example.com", id),
        role,
        organization_id: Some(77),
        subscription_status: status,
        password_hash: "$2b$10$do-not-leak".to_string(),
        created_at: "2026-01-15T10:00:00Z".to_string(),
    }
}

/// Create a test app backed by an in-memory user store holding one manager,
/// one employee and one admin.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryUserStore>) {
    let config = Config::test_default();
    let users = Arc::new(MemoryUserStore::from_records([
        user_record(MANAGER_ID, Role::LdManager, Some(SubscriptionStatus::Active)),
        user_record(EMPLOYEE_ID, Role::Employee, None),
        user_record(ADMIN_ID, Role::Admin, None),
    ]));

    let state = Arc::new(AppState {
        config,
        users: users.clone(),
    });

    (create_router(state.clone()), state, users)
}

/// Create a test JWT token valid for a day.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: u64, signing_key: &[u8]) -> String {
    curriculum_auth::middleware::auth::create_jwt(user_id, signing_key, 86400)
        .expect("Failed to create JWT")
}

/// Serve `app` on an ephemeral local port and return its base URL.
#[allow(dead_code)]
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[allow(dead_code)]
pub fn manager_principal() -> Principal {
    user_record(MANAGER_ID, Role::LdManager, Some(SubscriptionStatus::Trialing)).into_principal()
}

#[allow(dead_code)]
pub fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: None,
    }
}

#[allow(dead_code)]
pub fn unauthorized(message: &str) -> ApiError {
    ApiError::Status {
        status: 401,
        message: Some(message.to_string()),
    }
}

/// Scripted [`SessionApi`] that counts calls.
#[allow(dead_code)]
pub struct FakeApi {
    pub login: Mutex<Result<AuthPayload, ApiError>>,
    pub register: Mutex<Result<AuthPayload, ApiError>>,
    pub employee: Mutex<Result<EmployeeAuthPayload, ApiError>>,
    pub me: Mutex<Result<Principal, ApiError>>,
    pub status: Mutex<Result<SubscriptionStatus, ApiError>>,
    pub me_delay: Option<Duration>,
    pub status_delay: Option<Duration>,
    pub me_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            login: Mutex::new(Err(server_error())),
            register: Mutex::new(Err(server_error())),
            employee: Mutex::new(Err(server_error())),
            me: Mutex::new(Err(server_error())),
            status: Mutex::new(Err(server_error())),
            me_delay: None,
            status_delay: None,
            me_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
        }
    }
}

#[allow(dead_code)]
impl FakeApi {
    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionApi for FakeApi {
    async fn login(&self, _credentials: &LoginCredentials) -> Result<AuthPayload, ApiError> {
        self.login.lock().unwrap().clone()
    }

    async fn register(&self, _request: &RegisterManagerRequest) -> Result<AuthPayload, ApiError> {
        self.register.lock().unwrap().clone()
    }

    async fn login_employee(
        &self,
        _credentials: &EmployeeCredentials,
    ) -> Result<EmployeeAuthPayload, ApiError> {
        self.employee.lock().unwrap().clone()
    }

    async fn get_me(&self, _token: &str) -> Result<Principal, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.me_delay {
            tokio::time::sleep(delay).await;
        }
        self.me.lock().unwrap().clone()
    }

    async fn get_subscription_status(&self, _token: &str) -> Result<SubscriptionStatus, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.status_delay {
            tokio::time::sleep(delay).await;
        }
        self.status.lock().unwrap().clone()
    }
}
