//! Database repository for department/application links.
//!
//! Deleting an application removes its links (`ON DELETE CASCADE`); deleting a department
//! that is still linked fails (`ON DELETE RESTRICT`).

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{
        DepartmentApplicationCreateDBRequest, DepartmentApplicationDBResponse, DepartmentApplicationUpdateDBRequest,
    },
    validation,
};
use crate::types::{ApplicationId, DepartmentApplicationId, DepartmentId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing department/application links
#[derive(Debug, Clone)]
pub struct DepartmentApplicationFilter {
    pub skip: i64,
    pub limit: i64,
    pub department_id: Option<DepartmentId>,
    pub application_id: Option<ApplicationId>,
}

impl DepartmentApplicationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            department_id: None,
            application_id: None,
        }
    }

    pub fn for_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }
}

pub struct DepartmentApplications<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for DepartmentApplications<'c> {
    type CreateRequest = DepartmentApplicationCreateDBRequest;
    type UpdateRequest = DepartmentApplicationUpdateDBRequest;
    type Response = DepartmentApplicationDBResponse;
    type Id = DepartmentApplicationId;
    type Filter = DepartmentApplicationFilter;

    #[instrument(skip(self, request), fields(department_id = request.department_id, application_id = request.application_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let link = sqlx::query_as::<_, DepartmentApplicationDBResponse>(
            "INSERT INTO department_applications (department_id, application_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(request.department_id)
        .bind(request.application_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(link)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let link = sqlx::query_as::<_, DepartmentApplicationDBResponse>("SELECT * FROM department_applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(link)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM department_applications WHERE 1=1");

        if let Some(department_id) = filter.department_id {
            query.push(" AND department_id = ");
            query.push_bind(department_id);
        }

        if let Some(application_id) = filter.application_id {
            query.push(" AND application_id = ");
            query.push_bind(application_id);
        }

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let links = query
            .build_query_as::<DepartmentApplicationDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(links)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM department_applications WHERE id = $1")
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
        let link = sqlx::query_as::<_, DepartmentApplicationDBResponse>(
            r#"
            UPDATE department_applications SET
                department_id = COALESCE($2, department_id),
                application_id = COALESCE($3, application_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.department_id)
        .bind(request.application_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(link)
    }
}

impl<'c> DepartmentApplications<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
