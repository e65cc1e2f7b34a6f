//! Database repository for applications.
//!
//! Deleting an application removes everything that belongs to it in the same statement:
//! configurations, user assignments, git and JIRA connections and department links
//! (`ON DELETE CASCADE`). Discovery sessions scoped to it are kept and detached
//! (`ON DELETE SET NULL`).

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::applications::{ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationUpdateDBRequest},
    validation,
};
use crate::types::ApplicationId;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing applications
#[derive(Debug, Clone)]
pub struct ApplicationFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring match on the application name
    pub search: Option<String>,
}

impl ApplicationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

pub struct Applications<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Applications<'c> {
    type CreateRequest = ApplicationCreateDBRequest;
    type UpdateRequest = ApplicationUpdateDBRequest;
    type Response = ApplicationDBResponse;
    type Id = ApplicationId;
    type Filter = ApplicationFilter;

    #[instrument(skip(self, request), fields(application_name = %request.application_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let application = sqlx::query_as::<_, ApplicationDBResponse>(
            "INSERT INTO applications (application_name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&request.application_name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(application)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let application = sqlx::query_as::<_, ApplicationDBResponse>("SELECT * FROM applications WHERE application_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(application)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM applications WHERE 1=1");

        if let Some(ref search) = filter.search {
            query.push(" AND LOWER(application_name) LIKE ");
            query.push_bind(validation::contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }

        query.push(" ORDER BY application_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let applications = query.build_query_as::<ApplicationDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(applications)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM applications WHERE application_id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        request.validate()?;

        let application = sqlx::query_as::<_, ApplicationDBResponse>(
            r#"
            UPDATE applications SET
                application_name = COALESCE($2, application_name),
                description = CASE
                    WHEN $3::boolean THEN $4
                    ELSE description
                END
            WHERE application_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.application_name)
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(application)
    }
}

impl<'c> Applications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
