//! Database repository for application role assignments.
//!
//! Rows are keyed by the `(application_id, user_id)` pair, so a user holds at most one role
//! per application. Assigning the same pair twice fails with a unique violation on
//! `application_users_pkey`; change the role with `update` instead.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::applications::{ApplicationUserCreateDBRequest, ApplicationUserDBResponse, ApplicationUserUpdateDBRequest},
    validation,
};
use crate::types::{ApplicationId, ApplicationUserKey, UserId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing role assignments
#[derive(Debug, Clone)]
pub struct ApplicationUserFilter {
    pub skip: i64,
    pub limit: i64,
    pub application_id: Option<ApplicationId>,
    pub user_id: Option<UserId>,
}

impl ApplicationUserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            application_id: None,
            user_id: None,
        }
    }

    pub fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

pub struct ApplicationUsers<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for ApplicationUsers<'c> {
    type CreateRequest = ApplicationUserCreateDBRequest;
    type UpdateRequest = ApplicationUserUpdateDBRequest;
    type Response = ApplicationUserDBResponse;
    type Id = ApplicationUserKey;
    type Filter = ApplicationUserFilter;

    #[instrument(skip(self, request), fields(application_id = request.application_id, user_id = request.user_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let assignment = sqlx::query_as::<_, ApplicationUserDBResponse>(
            r#"
            INSERT INTO application_users (application_id, user_id, role_in_app)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.application_id)
        .bind(request.user_id)
        .bind(&request.role_in_app)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(self), fields(key = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let assignment = sqlx::query_as::<_, ApplicationUserDBResponse>(
            "SELECT * FROM application_users WHERE application_id = $1 AND user_id = $2",
        )
        .bind(id.application_id)
        .bind(id.user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM application_users WHERE 1=1");

        if let Some(application_id) = filter.application_id {
            query.push(" AND application_id = ");
            query.push_bind(application_id);
        }

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }

        query.push(" ORDER BY application_id, user_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let assignments = query
            .build_query_as::<ApplicationUserDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(assignments)
    }

    #[instrument(skip(self), fields(key = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM application_users WHERE application_id = $1 AND user_id = $2")
            .bind(id.application_id)
            .bind(id.user_id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(key = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        request.validate()?;

        let assignment = sqlx::query_as::<_, ApplicationUserDBResponse>(
            r#"
            UPDATE application_users SET role_in_app = $3
            WHERE application_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id.application_id)
        .bind(id.user_id)
        .bind(&request.role_in_app)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(assignment)
    }
}

impl<'c> ApplicationUsers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
