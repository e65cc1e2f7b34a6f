//! Database repository for user roles.
//!
//! A role that is still assigned to a user cannot be deleted: `users.role_id` references
//! `user_roles` with `ON DELETE RESTRICT`, so the delete fails with a foreign key violation.
//! Reassign or clear the users' roles first.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserRoleCreateDBRequest, UserRoleDBResponse, UserRoleUpdateDBRequest},
    validation,
};
use crate::types::RoleId;
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing roles
#[derive(Debug, Clone)]
pub struct UserRoleFilter {
    pub skip: i64,
    pub limit: i64,
}

impl UserRoleFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct UserRoles<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for UserRoles<'c> {
    type CreateRequest = UserRoleCreateDBRequest;
    type UpdateRequest = UserRoleUpdateDBRequest;
    type Response = UserRoleDBResponse;
    type Id = RoleId;
    type Filter = UserRoleFilter;

    #[instrument(skip(self, request), fields(role_name = %request.role_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let role = sqlx::query_as::<_, UserRoleDBResponse>("INSERT INTO user_roles (role_name) VALUES ($1) RETURNING *")
            .bind(&request.role_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(role)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let role = sqlx::query_as::<_, UserRoleDBResponse>("SELECT * FROM user_roles WHERE role_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(role)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let roles = sqlx::query_as::<_, UserRoleDBResponse>("SELECT * FROM user_roles ORDER BY role_id LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roles)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM user_roles WHERE role_id = $1")
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

        let role = sqlx::query_as::<_, UserRoleDBResponse>(
            "UPDATE user_roles SET role_name = COALESCE($2, role_name) WHERE role_id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&request.role_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(role)
    }
}

impl<'c> UserRoles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Number of users currently holding the role
    #[instrument(skip(self), err)]
    pub async fn count_users(&mut self, id: RoleId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role_id = $1")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
