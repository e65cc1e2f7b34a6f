//! Database models for discovery query sessions and their messages.

use crate::db::errors::Result;
use crate::db::validation;
use crate::types::{ApplicationId, MessageId, MessageSender, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database request for opening a session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub user_id: UserId,
    /// Optional scope; sessions may exist without an application.
    pub application_id: Option<ApplicationId>,
    pub title: String,
    pub is_favorite: bool,
}

impl SessionCreateDBRequest {
    pub fn new(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            user_id,
            application_id: None,
            title: title.into(),
            is_favorite: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validation::not_blank("title", &self.title)
    }
}

/// Database request for updating a session
#[derive(Debug, Clone, Default)]
pub struct SessionUpdateDBRequest {
    pub title: Option<String>,
    pub is_favorite: Option<bool>,
    /// `Some(None)` detaches the session from its application
    pub application_id: Option<Option<ApplicationId>>,
}

impl SessionUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => validation::not_blank("title", title),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub application_id: Option<ApplicationId>,
    pub title: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for appending a message to a session
#[derive(Debug, Clone)]
pub struct MessageCreateDBRequest {
    pub session_id: SessionId,
    pub sender: MessageSender,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
}

/// Database request for editing a message
#[derive(Debug, Clone, Default)]
pub struct MessageUpdateDBRequest {
    pub content: Option<String>,
    /// `Some(None)` clears the metadata
    pub metadata: Option<Option<serde_json::Value>>,
}

/// Database response for a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDBResponse {
    pub id: MessageId,
    pub session_id: SessionId,
    pub sender: MessageSender,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
