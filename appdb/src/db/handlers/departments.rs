//! Database repository for departments.
//!
//! Departments are shared between customers and applications. Both link tables reference
//! them with `ON DELETE RESTRICT`, so a department still linked on either side cannot be
//! deleted.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{DepartmentCreateDBRequest, DepartmentDBResponse, DepartmentUpdateDBRequest},
    validation,
};
use crate::types::DepartmentId;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing departments
#[derive(Debug, Clone)]
pub struct DepartmentFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl DepartmentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }
}

pub struct Departments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Departments<'c> {
    type CreateRequest = DepartmentCreateDBRequest;
    type UpdateRequest = DepartmentUpdateDBRequest;
    type Response = DepartmentDBResponse;
    type Id = DepartmentId;
    type Filter = DepartmentFilter;

    #[instrument(skip(self, request), fields(department_name = %request.department_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let department = sqlx::query_as::<_, DepartmentDBResponse>("INSERT INTO departments (department_name) VALUES ($1) RETURNING *")
            .bind(&request.department_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(department)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let department = sqlx::query_as::<_, DepartmentDBResponse>("SELECT * FROM departments WHERE department_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(department)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM departments WHERE 1=1");

        if let Some(ref search) = filter.search {
            query.push(" AND LOWER(department_name) LIKE ");
            query.push_bind(validation::contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }

        query.push(" ORDER BY department_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let departments = query.build_query_as::<DepartmentDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(departments)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM departments WHERE department_id = $1")
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

        let department = sqlx::query_as::<_, DepartmentDBResponse>(
            "UPDATE departments SET department_name = COALESCE($2, department_name) WHERE department_id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&request.department_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(department)
    }
}

impl<'c> Departments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
