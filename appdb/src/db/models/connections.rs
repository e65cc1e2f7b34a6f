//! Database models for source-control (git) and issue-tracker (JIRA) connections.
//!
//! Credentials travel in plaintext only inside the request types ([`GitAuth`], [`JiraAuth`]);
//! the repositories encrypt them before they are bound to a query. Responses carry
//! [`EncryptedSecret`] values and hand plaintext back only through the `credentials` methods,
//! which need the caller's [`SecretCipher`].
//!
//! The auth enums make mixed credentials unrepresentable: an HTTPS connection cannot carry an
//! SSH key and an API-token JIRA connection cannot carry OAuth client details. The schema
//! enforces the same rule with check constraints for writes that bypass these types.

use crate::crypto::{EncryptedSecret, SecretCipher};
use crate::db::errors::Result;
use crate::db::validation;
use crate::types::{ApplicationId, GitAuthType, GitConnectionId, JiraAuthType, JiraConnectionId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Credentials for a git remote, in plaintext.
#[derive(Clone, PartialEq, Eq)]
pub enum GitAuth {
    /// HTTPS, optionally with a username and personal access token. Public repositories need
    /// neither.
    Https {
        username: Option<String>,
        access_token: Option<String>,
    },
    /// SSH with a private key and optional passphrase.
    Ssh { ssh_key: String, ssh_passphrase: Option<String> },
}

impl GitAuth {
    pub fn auth_type(&self) -> GitAuthType {
        match self {
            GitAuth::Https { .. } => GitAuthType::Https,
            GitAuth::Ssh { .. } => GitAuthType::Ssh,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            GitAuth::Https { username, access_token } => {
                validation::optional("username", username.as_deref(), 100)?;
                if let Some(token) = access_token {
                    validation::not_blank("access_token", token)?;
                }
                Ok(())
            }
            GitAuth::Ssh { ssh_key, .. } => validation::not_blank("ssh_key", ssh_key),
        }
    }

    /// Column values in table order: (username, access_token, ssh_key, ssh_passphrase)
    pub(crate) fn seal(&self, cipher: &dyn SecretCipher) -> Result<SealedGitAuth> {
        let seal = |value: &Option<String>| -> Result<Option<EncryptedSecret>> {
            value.as_deref().map(|v| EncryptedSecret::seal(cipher, v)).transpose().map_err(Into::into)
        };

        Ok(match self {
            GitAuth::Https { username, access_token } => SealedGitAuth {
                auth_type: GitAuthType::Https,
                username: username.clone(),
                access_token: seal(access_token)?,
                ssh_key: None,
                ssh_passphrase: None,
            },
            GitAuth::Ssh { ssh_key, ssh_passphrase } => SealedGitAuth {
                auth_type: GitAuthType::Ssh,
                username: None,
                access_token: None,
                ssh_key: Some(EncryptedSecret::seal(cipher, ssh_key)?),
                ssh_passphrase: seal(ssh_passphrase)?,
            },
        })
    }
}

impl fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitAuth::Https { username, access_token } => f
                .debug_struct("Https")
                .field("username", username)
                .field("access_token", &access_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            GitAuth::Ssh { ssh_passphrase, .. } => f
                .debug_struct("Ssh")
                .field("ssh_key", &"<redacted>")
                .field("ssh_passphrase", &ssh_passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Encrypted form of [`GitAuth`], ready to bind.
#[derive(Debug)]
pub(crate) struct SealedGitAuth {
    pub auth_type: GitAuthType,
    pub username: Option<String>,
    pub access_token: Option<EncryptedSecret>,
    pub ssh_key: Option<EncryptedSecret>,
    pub ssh_passphrase: Option<EncryptedSecret>,
}

/// Database request for creating a git connection
#[derive(Debug, Clone)]
pub struct GitConnectionCreateDBRequest {
    pub application_id: ApplicationId,
    pub repo_url: String,
    pub auth: GitAuth,
    /// Defaults to `main` when not given
    pub default_branch: Option<String>,
}

impl GitConnectionCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::not_blank("repo_url", &self.repo_url)?;
        if let Some(branch) = &self.default_branch {
            validation::required("default_branch", branch, 50)?;
        }
        self.auth.validate()
    }
}

/// Database request for updating a git connection
///
/// Supplying `auth` replaces every credential column, so switching between HTTPS and SSH
/// never leaves stale material from the previous mode behind.
#[derive(Debug, Clone, Default)]
pub struct GitConnectionUpdateDBRequest {
    pub repo_url: Option<String>,
    pub default_branch: Option<String>,
    pub auth: Option<GitAuth>,
}

impl GitConnectionUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.repo_url {
            validation::not_blank("repo_url", url)?;
        }
        if let Some(branch) = &self.default_branch {
            validation::required("default_branch", branch, 50)?;
        }
        match &self.auth {
            Some(auth) => auth.validate(),
            None => Ok(()),
        }
    }
}

/// Database response for a git connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitConnectionDBResponse {
    pub git_id: GitConnectionId,
    pub application_id: ApplicationId,
    pub repo_url: String,
    pub auth_type: GitAuthType,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<EncryptedSecret>,
    #[serde(skip_serializing)]
    pub ssh_key: Option<EncryptedSecret>,
    #[serde(skip_serializing)]
    pub ssh_passphrase: Option<EncryptedSecret>,
    pub default_branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GitConnectionDBResponse {
    /// Decrypt the stored credentials.
    pub fn credentials(&self, cipher: &dyn SecretCipher) -> Result<GitAuth> {
        let reveal = |value: &Option<EncryptedSecret>| -> Result<Option<String>> {
            value.as_ref().map(|v| v.reveal(cipher)).transpose().map_err(Into::into)
        };

        Ok(match self.auth_type {
            GitAuthType::Https => GitAuth::Https {
                username: self.username.clone(),
                access_token: reveal(&self.access_token)?,
            },
            GitAuthType::Ssh => GitAuth::Ssh {
                ssh_key: reveal(&self.ssh_key)?.unwrap_or_default(),
                ssh_passphrase: reveal(&self.ssh_passphrase)?,
            },
        })
    }
}

/// Credentials for a JIRA instance, in plaintext.
#[derive(Clone, PartialEq, Eq)]
pub enum JiraAuth {
    /// Basic auth with the connection's `jira_email` and an API token.
    ApiToken { api_token: Option<String> },
    /// OAuth client credentials.
    OAuth { client_id: String, client_secret: Option<String> },
}

impl JiraAuth {
    pub fn auth_type(&self) -> JiraAuthType {
        match self {
            JiraAuth::ApiToken { .. } => JiraAuthType::ApiToken,
            JiraAuth::OAuth { .. } => JiraAuthType::Oauth,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            JiraAuth::ApiToken { api_token } => match api_token {
                Some(token) => validation::not_blank("jira_api_token", token),
                None => Ok(()),
            },
            JiraAuth::OAuth { client_id, .. } => validation::not_blank("oauth_client_id", client_id),
        }
    }

    pub(crate) fn seal(&self, cipher: &dyn SecretCipher) -> Result<SealedJiraAuth> {
        let seal = |value: &Option<String>| -> Result<Option<EncryptedSecret>> {
            value.as_deref().map(|v| EncryptedSecret::seal(cipher, v)).transpose().map_err(Into::into)
        };

        Ok(match self {
            JiraAuth::ApiToken { api_token } => SealedJiraAuth {
                auth_type: JiraAuthType::ApiToken,
                jira_api_token: seal(api_token)?,
                oauth_client_id: None,
                oauth_client_secret: None,
            },
            JiraAuth::OAuth { client_id, client_secret } => SealedJiraAuth {
                auth_type: JiraAuthType::Oauth,
                jira_api_token: None,
                oauth_client_id: Some(client_id.clone()),
                oauth_client_secret: seal(client_secret)?,
            },
        })
    }
}

impl Default for JiraAuth {
    fn default() -> Self {
        JiraAuth::ApiToken { api_token: None }
    }
}

impl fmt::Debug for JiraAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JiraAuth::ApiToken { api_token } => f
                .debug_struct("ApiToken")
                .field("api_token", &api_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            JiraAuth::OAuth { client_id, client_secret } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &client_secret.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Encrypted form of [`JiraAuth`], ready to bind.
#[derive(Debug)]
pub(crate) struct SealedJiraAuth {
    pub auth_type: JiraAuthType,
    pub jira_api_token: Option<EncryptedSecret>,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<EncryptedSecret>,
}

/// Database request for creating a JIRA connection
#[derive(Debug, Clone)]
pub struct JiraConnectionCreateDBRequest {
    pub application_id: ApplicationId,
    pub jira_base_url: String,
    pub project_key: String,
    pub jira_email: Option<String>,
    pub auth: JiraAuth,
}

impl JiraConnectionCreateDBRequest {
    pub fn validate(&self) -> Result<()> {
        validation::http_url("jira_base_url", &self.jira_base_url)?;
        validation::required("project_key", &self.project_key, 50)?;
        validation::optional("jira_email", self.jira_email.as_deref(), 150)?;
        self.auth.validate()
    }
}

/// Database request for updating a JIRA connection
#[derive(Debug, Clone, Default)]
pub struct JiraConnectionUpdateDBRequest {
    pub jira_base_url: Option<String>,
    pub project_key: Option<String>,
    /// `Some(None)` clears the email
    pub jira_email: Option<Option<String>>,
    /// Replaces every credential column when present
    pub auth: Option<JiraAuth>,
}

impl JiraConnectionUpdateDBRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.jira_base_url {
            validation::http_url("jira_base_url", url)?;
        }
        if let Some(key) = &self.project_key {
            validation::required("project_key", key, 50)?;
        }
        validation::optional("jira_email", self.jira_email.as_ref().and_then(|e| e.as_deref()), 150)?;
        match &self.auth {
            Some(auth) => auth.validate(),
            None => Ok(()),
        }
    }
}

/// Database response for a JIRA connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JiraConnectionDBResponse {
    pub jira_id: JiraConnectionId,
    pub application_id: ApplicationId,
    pub jira_base_url: String,
    pub project_key: String,
    pub auth_type: JiraAuthType,
    pub jira_email: Option<String>,
    #[serde(skip_serializing)]
    pub jira_api_token: Option<EncryptedSecret>,
    pub oauth_client_id: Option<String>,
    #[serde(skip_serializing)]
    pub oauth_client_secret: Option<EncryptedSecret>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JiraConnectionDBResponse {
    /// Decrypt the stored credentials.
    pub fn credentials(&self, cipher: &dyn SecretCipher) -> Result<JiraAuth> {
        let reveal = |value: &Option<EncryptedSecret>| -> Result<Option<String>> {
            value.as_ref().map(|v| v.reveal(cipher)).transpose().map_err(Into::into)
        };

        Ok(match self.auth_type {
            JiraAuthType::ApiToken => JiraAuth::ApiToken {
                api_token: reveal(&self.jira_api_token)?,
            },
            JiraAuthType::Oauth => JiraAuth::OAuth {
                client_id: self.oauth_client_id.clone().unwrap_or_default(),
                client_secret: reveal(&self.oauth_client_secret)?,
            },
        })
    }
}
