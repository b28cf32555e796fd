// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.
//!
//! [`UserRecord`] is what the persistence layer holds. [`Principal`] is the
//! same user with the password hash stripped, and is the only form that is
//! ever attached to a request or sent to a client.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// L&D manager; owns the organization's subscription.
    LdManager,
    /// Employee of a customer organization.
    Employee,
    /// Platform operator.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::LdManager => "ld_manager",
            Role::Employee => "employee",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Billing state of a billable account.
///
/// Provider states this crate does not know decode as [`Inactive`], so a
/// new upstream status never locks a user out.
///
/// [`Inactive`]: SubscriptionStatus::Inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
    /// Not a billable entity (employees).
    #[serde(rename = "N/A")]
    NotApplicable,
    #[default]
    #[serde(other)]
    Inactive,
}

impl SubscriptionStatus {
    /// Active and trialing subscriptions unlock paid features.
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Unpaid => "unpaid",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Inactive => "inactive",
            SubscriptionStatus::NotApplicable => "N/A",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = std::convert::Infallible;

    /// Same mapping as deserialization: unknown strings are `Inactive`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "active" => SubscriptionStatus::Active,
            "trialing" => SubscriptionStatus::Trialing,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            "unpaid" => SubscriptionStatus::Unpaid,
            "incomplete" => SubscriptionStatus::Incomplete,
            "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
            "paused" => SubscriptionStatus::Paused,
            "N/A" => SubscriptionStatus::NotApplicable,
            _ => SubscriptionStatus::Inactive,
        })
    }
}

/// User row stored in Firestore (or the in-memory store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// Numeric user ID (also used as document ID)
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Tenant the user belongs to
    #[serde(default)]
    pub organization_id: Option<u64>,
    #[serde(default)]
    pub subscription_status: Option<SubscriptionStatus>,
    /// Never leaves the persistence layer.
    pub password_hash: String,
    /// When the account was created (RFC 3339)
    pub created_at: String,
}

impl UserRecord {
    /// Strip the secret fields, yielding the request-safe view.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            organization_id: self.organization_id,
            subscription_status: self.subscription_status,
        }
    }
}

/// Authenticated identity attached to requests and cached by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Principal {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub organization_id: Option<u64>,
    #[serde(default)]
    pub subscription_status: Option<SubscriptionStatus>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
