// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth and billing API client used by the session store.
//!
//! Handles:
//! - Manager login and registration
//! - Employee login
//! - Current-user lookup with the stored token
//! - Subscription status lookup

use crate::config::ClientConfig;
use crate::models::{Principal, Role, SubscriptionStatus};
use crate::routes::api::SubscriptionStatusResponse;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::Validate;

/// Manager login form.
#[derive(Clone, Serialize, Validate)]
pub struct LoginCredentials {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// New L&D manager account.
#[derive(Clone, Serialize, Validate)]
pub struct RegisterManagerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub organization_name: String,
}

/// Employee login form.
#[derive(Clone, Serialize, Validate)]
pub struct EmployeeCredentials {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login/registration response: the token plus the user fields, flattened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
    #[serde(flatten)]
    pub user: Principal,
}

/// Employee login response. Carries no role or billing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeAuthPayload {
    pub token: String,
    #[serde(flatten)]
    pub profile: EmployeeProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub organization_id: Option<u64>,
}

impl EmployeeProfile {
    /// Employees are never billable.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            name: self.name,
            email: self.email,
            role: Role::Employee,
            organization_id: self.organization_id,
            subscription_status: Some(SubscriptionStatus::NotApplicable),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    /// The server rejected the credential; the session cannot be repaired locally.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ApiError::Status { status: 403, .. })
    }

    /// User-facing message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Backend operations the session store depends on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, ApiError>;

    async fn register(&self, request: &RegisterManagerRequest) -> Result<AuthPayload, ApiError>;

    async fn login_employee(
        &self,
        credentials: &EmployeeCredentials,
    ) -> Result<EmployeeAuthPayload, ApiError>;

    async fn get_me(&self, token: &str) -> Result<Principal, ApiError>;

    async fn get_subscription_status(&self, token: &str) -> Result<SubscriptionStatus, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`SessionApi`] over HTTP.
#[derive(Clone)]
pub struct HttpSessionApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        check_response_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        if status.as_u16() == 401 {
            tracing::debug!("Backend rejected session token (401)");
        }

        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, ApiError> {
        self.post_json("/api/auth/login", credentials).await
    }

    async fn register(&self, request: &RegisterManagerRequest) -> Result<AuthPayload, ApiError> {
        self.post_json("/api/auth/register", request).await
    }

    async fn login_employee(
        &self,
        credentials: &EmployeeCredentials,
    ) -> Result<EmployeeAuthPayload, ApiError> {
        self.post_json("/api/auth/employee/login", credentials).await
    }

    async fn get_me(&self, token: &str) -> Result<Principal, ApiError> {
        self.get_json("/api/auth/me", token).await
    }

    async fn get_subscription_status(&self, token: &str) -> Result<SubscriptionStatus, ApiError> {
        let response: SubscriptionStatusResponse = self
            .get_json("/api/stripe/subscription-status", token)
            .await?;
        Ok(response.status)
    }
}
