//! Database models for applications, their user assignments and configuration documents.

use crate::db::errors::Result;
use crate::db::validation;
use crate::types::{ApplicationId, ConfigId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database request for creating a new application
#[derive(Debug, Clone)]
pub struct ApplicationCreateDBRequest {
    pub application_name: String,
    pub description: Option<String>,
}

impl ApplicationCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("application_name", &self.application_name, 100)?;
        validation::optional("description", self.description.as_deref(), 255)
    }
}

/// Database request for updating an application
#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdateDBRequest {
    pub application_name: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
}

impl ApplicationUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.application_name {
            validation::required("application_name", name, 100)?;
        }
        validation::optional("description", self.description.as_ref().and_then(|d| d.as_deref()), 255)
    }
}

/// Database response for an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationDBResponse {
    pub application_id: ApplicationId,
    pub application_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database request for assigning a user a role within an application
#[derive(Debug, Clone)]
pub struct ApplicationUserCreateDBRequest {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub role_in_app: String,
}

impl ApplicationUserCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("role_in_app", &self.role_in_app, 50)
    }
}

/// Database request for changing an existing assignment
#[derive(Debug, Clone)]
pub struct ApplicationUserUpdateDBRequest {
    pub role_in_app: String,
}

impl ApplicationUserUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("role_in_app", &self.role_in_app, 50)
    }
}

/// Database response for an application role assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationUserDBResponse {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub role_in_app: String,
    pub assigned_at: DateTime<Utc>,
}

/// Database request for attaching a configuration document to an application
#[derive(Debug, Clone)]
pub struct ConfigurationCreateDBRequest {
    pub application_id: ApplicationId,
    pub document_name: String,
    pub document_type: String,
    pub document_path: String,
    pub version: Option<String>,
}

impl ConfigurationCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::required("document_name", &self.document_name, 100)?;
        validation::required("document_type", &self.document_type, 255)?;
        validation::required("document_path", &self.document_path, 255)?;
        validation::optional("version", self.version.as_deref(), 20)
    }
}

/// Database request for updating a configuration document
///
/// The owning application cannot be changed; documents are moved by re-uploading.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationUpdateDBRequest {
    pub document_name: Option<String>,
    pub document_type: Option<String>,
    pub document_path: Option<String>,
    pub version: Option<Option<String>>,
}

impl ConfigurationUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.document_name {
            validation::required("document_name", name, 100)?;
        }
        if let Some(document_type) = &self.document_type {
            validation::required("document_type", document_type, 255)?;
        }
        if let Some(path) = &self.document_path {
            validation::required("document_path", path, 255)?;
        }
        validation::optional("version", self.version.as_ref().and_then(|v| v.as_deref()), 20)
    }
}

/// Database response for a configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConfigurationDBResponse {
    pub config_id: ConfigId,
    pub application_id: ApplicationId,
    pub document_name: String,
    pub document_type: String,
    pub document_path: String,
    pub version: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}
