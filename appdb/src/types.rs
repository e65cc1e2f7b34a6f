//! Common type definitions shared by the models and repositories.
//!
//! # ID Types
//!
//! Every table uses a database-generated integer key. The aliases below keep
//! signatures readable and make it obvious which table a key belongs to:
//!
//! - [`UserId`], [`RoleId`], [`ApplicationId`], [`ConfigId`]
//! - [`CustomerId`], [`DepartmentId`], [`CustomerDepartmentId`], [`DepartmentApplicationId`]
//! - [`GitConnectionId`], [`JiraConnectionId`]
//! - [`SessionId`], [`MessageId`] (messages use a 64-bit key)
//!
//! # Enumerated columns
//!
//! Columns restricted by a check constraint are modelled as Rust enums that map to the
//! exact strings the constraint accepts: [`GitAuthType`], [`JiraAuthType`] and
//! [`MessageSender`]. Parsing an unknown value yields [`DbError::Validation`].

use crate::db::errors::DbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Type aliases for IDs
pub type UserId = i32;
pub type RoleId = i32;
pub type ApplicationId = i32;
pub type ConfigId = i32;
pub type CustomerId = i32;
pub type DepartmentId = i32;
pub type CustomerDepartmentId = i32;
pub type DepartmentApplicationId = i32;
pub type GitConnectionId = i32;
pub type JiraConnectionId = i32;
pub type SessionId = i32;
pub type MessageId = i64;

/// Composite key of an application role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationUserKey {
    pub application_id: ApplicationId,
    pub user_id: UserId,
}

impl ApplicationUserKey {
    pub fn new(application_id: ApplicationId, user_id: UserId) -> Self {
        Self { application_id, user_id }
    }
}

impl fmt::Display for ApplicationUserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.application_id, self.user_id)
    }
}

/// How a git connection authenticates against the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GitAuthType {
    Https,
    Ssh,
}

impl GitAuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GitAuthType::Https => "HTTPS",
            GitAuthType::Ssh => "SSH",
        }
    }
}

impl FromStr for GitAuthType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTPS" => Ok(GitAuthType::Https),
            "SSH" => Ok(GitAuthType::Ssh),
            other => Err(DbError::Validation {
                field: "auth_type".to_string(),
                message: format!("unknown git auth type '{other}', expected HTTPS or SSH"),
            }),
        }
    }
}

impl fmt::Display for GitAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a JIRA connection authenticates against the issue tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JiraAuthType {
    #[default]
    ApiToken,
    Oauth,
}

impl JiraAuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JiraAuthType::ApiToken => "API_TOKEN",
            JiraAuthType::Oauth => "OAUTH",
        }
    }
}

impl FromStr for JiraAuthType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "API_TOKEN" => Ok(JiraAuthType::ApiToken),
            "OAUTH" => Ok(JiraAuthType::Oauth),
            other => Err(DbError::Validation {
                field: "auth_type".to_string(),
                message: format!("unknown JIRA auth type '{other}', expected API_TOKEN or OAUTH"),
            }),
        }
    }
}

impl fmt::Display for JiraAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a discovery query message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    User,
    Assistant,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSender::User => "user",
            MessageSender::Assistant => "assistant",
        }
    }
}

impl FromStr for MessageSender {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageSender::User),
            "assistant" => Ok(MessageSender::Assistant),
            other => Err(DbError::Validation {
                field: "sender".to_string(),
                message: format!("unknown sender '{other}', expected user or assistant"),
            }),
        }
    }
}

impl fmt::Display for MessageSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction for list operations that accept a caller-chosen sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}
