//! Database models for users and roles.

use crate::db::errors::Result;
use crate::db::validation;
use crate::types::{RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    /// Already hashed by the caller; this layer never sees plaintext passwords.
    pub password_hash: String,
    pub enrolled: Option<String>,
    pub role_id: Option<RoleId>,
}

impl UserCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("username", &self.username, 100)?;
        validation::required("email", &self.email, 100)?;
        validation::required("password_hash", &self.password_hash, 255)?;
        validation::optional("enrolled", self.enrolled.as_deref(), 50)
    }
}

/// Database request for updating a user
///
/// `None` leaves a field unchanged. For nullable columns, `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub enrolled: Option<Option<String>>,
    pub role_id: Option<Option<RoleId>>,
}

impl UserUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(username) = &self.username {
            validation::required("username", username, 100)?;
        }
        if let Some(email) = &self.email {
            validation::required("email", email, 100)?;
        }
        if let Some(password_hash) = &self.password_hash {
            validation::required("password_hash", password_hash, 255)?;
        }
        validation::optional("enrolled", self.enrolled.as_ref().and_then(|e| e.as_deref()), 50)
    }
}

/// Database response for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDBResponse {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub enrolled: Option<String>,
    pub role_id: Option<RoleId>,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating a role
#[derive(Debug, Clone)]
pub struct UserRoleCreateDBRequest {
    pub role_name: String,
}

impl UserRoleCreateDBRequest {
    pub fn new(role_name: impl Into<String>) -> Self {
        Self { role_name: role_name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        validation::required("role_name", &self.role_name, 50)
    }
}

/// Database request for renaming a role
#[derive(Debug, Clone, Default)]
pub struct UserRoleUpdateDBRequest {
    pub role_name: Option<String>,
}

impl UserRoleUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        match &self.role_name {
            Some(name) => validation::required("role_name", name, 50),
            None => Ok(()),
        }
    }
}

/// Database response for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRoleDBResponse {
    pub role_id: RoleId,
    pub role_name: String,
}
