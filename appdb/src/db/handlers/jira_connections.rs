//! Database repository for JIRA connections.
//!
//! Like [`GitConnections`](super::GitConnections), this repository borrows the caller's
//! [`SecretCipher`]. The API token and the OAuth client secret are encrypted before they are
//! bound; the OAuth client id and the account email are stored as given.

use crate::crypto::{EncryptedSecret, SecretCipher};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::connections::{JiraConnectionCreateDBRequest, JiraConnectionDBResponse, JiraConnectionUpdateDBRequest},
    validation,
};
use crate::types::{ApplicationId, JiraConnectionId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing JIRA connections
#[derive(Debug, Clone)]
pub struct JiraConnectionFilter {
    pub skip: i64,
    pub limit: i64,
    pub application_id: Option<ApplicationId>,
    pub project_key: Option<String>,
}

impl JiraConnectionFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            application_id: None,
            project_key: None,
        }
    }

    pub fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }
}

#[derive(Debug, FromRow)]
struct JiraConnection {
    jira_id: JiraConnectionId,
    application_id: ApplicationId,
    jira_base_url: String,
    project_key: String,
    auth_type: String,
    jira_email: Option<String>,
    jira_api_token: Option<EncryptedSecret>,
    oauth_client_id: Option<String>,
    oauth_client_secret: Option<EncryptedSecret>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JiraConnection> for JiraConnectionDBResponse {
    type Error = DbError;

    fn try_from(row: JiraConnection) -> Result<Self> {
        Ok(Self {
            jira_id: row.jira_id,
            application_id: row.application_id,
            jira_base_url: row.jira_base_url,
            project_key: row.project_key,
            auth_type: row.auth_type.parse()?,
            jira_email: row.jira_email,
            jira_api_token: row.jira_api_token,
            oauth_client_id: row.oauth_client_id,
            oauth_client_secret: row.oauth_client_secret,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct JiraConnections<'c> {
    db: &'c mut PgConnection,
    cipher: &'c dyn SecretCipher,
}

#[async_trait::async_trait]
impl<'c> Repository for JiraConnections<'c> {
    type CreateRequest = JiraConnectionCreateDBRequest;
    type UpdateRequest = JiraConnectionUpdateDBRequest;
    type Response = JiraConnectionDBResponse;
    type Id = JiraConnectionId;
    type Filter = JiraConnectionFilter;

    #[instrument(skip(self, request), fields(application_id = request.application_id, project_key = %request.project_key), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;
        let sealed = request.auth.seal(self.cipher)?;

        let row = sqlx::query_as::<_, JiraConnection>(
            r#"
            INSERT INTO jira_connections (
                application_id, jira_base_url, project_key, auth_type, jira_email,
                jira_api_token, oauth_client_id, oauth_client_secret
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(request.application_id)
        .bind(&request.jira_base_url)
        .bind(&request.project_key)
        .bind(sealed.auth_type.as_str())
        .bind(&request.jira_email)
        .bind(&sealed.jira_api_token)
        .bind(&sealed.oauth_client_id)
        .bind(&sealed.oauth_client_secret)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, JiraConnection>("SELECT * FROM jira_connections WHERE jira_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM jira_connections WHERE 1=1");

        if let Some(application_id) = filter.application_id {
            query.push(" AND application_id = ");
            query.push_bind(application_id);
        }

        if let Some(ref project_key) = filter.project_key {
            query.push(" AND project_key = ");
            query.push_bind(project_key.clone());
        }

        query.push(" ORDER BY jira_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let rows = query.build_query_as::<JiraConnection>().fetch_all(&mut *self.db).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM jira_connections WHERE jira_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(replaces_auth = request.auth.is_some()), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        request.validate()?;
        let sealed = request.auth.as_ref().map(|auth| auth.seal(self.cipher)).transpose()?;

        let row = sqlx::query_as::<_, JiraConnection>(
            r#"
            UPDATE jira_connections SET
                jira_base_url = COALESCE($2, jira_base_url),
                project_key = COALESCE($3, project_key),
                jira_email = CASE WHEN $4::boolean THEN $5 ELSE jira_email END,
                auth_type = CASE WHEN $6::boolean THEN $7 ELSE auth_type END,
                jira_api_token = CASE WHEN $6::boolean THEN $8 ELSE jira_api_token END,
                oauth_client_id = CASE WHEN $6::boolean THEN $9 ELSE oauth_client_id END,
                oauth_client_secret = CASE WHEN $6::boolean THEN $10 ELSE oauth_client_secret END
            WHERE jira_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.jira_base_url)
        .bind(&request.project_key)
        .bind(request.jira_email.is_some())
        .bind(request.jira_email.clone().flatten())
        .bind(sealed.is_some())
        .bind(sealed.as_ref().map(|s| s.auth_type.as_str()))
        .bind(sealed.as_ref().and_then(|s| s.jira_api_token.clone()))
        .bind(sealed.as_ref().and_then(|s| s.oauth_client_id.clone()))
        .bind(sealed.as_ref().and_then(|s| s.oauth_client_secret.clone()))
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }
}

impl<'c> JiraConnections<'c> {
    pub fn new(db: &'c mut PgConnection, cipher: &'c dyn SecretCipher) -> Self {
        Self { db, cipher }
    }

    /// The application's JIRA connection, the oldest one if there are several.
    #[instrument(skip(self), err)]
    pub async fn get_for_application(&mut self, application_id: ApplicationId) -> Result<Option<JiraConnectionDBResponse>> {
        let row = sqlx::query_as::<_, JiraConnection>(
            "SELECT * FROM jira_connections WHERE application_id = $1 ORDER BY jira_id LIMIT 1",
        )
        .bind(application_id)
        .fetch_optional(&mut *self.db)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
