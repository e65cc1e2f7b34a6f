//! Database repository for customer/department links.
//!
//! Each `(customer_id, department_id)` pair appears at most once
//! (`customer_departments_pair_key`). Both sides are `ON DELETE RESTRICT`: a customer or
//! department cannot be deleted while a link to it exists.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{
        CustomerDepartmentCreateDBRequest, CustomerDepartmentDBResponse, CustomerDepartmentUpdateDBRequest,
    },
    validation,
};
use crate::types::{CustomerDepartmentId, CustomerId, DepartmentId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing customer/department links
#[derive(Debug, Clone)]
pub struct CustomerDepartmentFilter {
    pub skip: i64,
    pub limit: i64,
    pub customer_id: Option<CustomerId>,
    pub department_id: Option<DepartmentId>,
}

impl CustomerDepartmentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            customer_id: None,
            department_id: None,
        }
    }

    pub fn for_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn for_department(mut self, department_id: DepartmentId) -> Self {
        self.department_id = Some(department_id);
        self
    }
}

pub struct CustomerDepartments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for CustomerDepartments<'c> {
    type CreateRequest = CustomerDepartmentCreateDBRequest;
    type UpdateRequest = CustomerDepartmentUpdateDBRequest;
    type Response = CustomerDepartmentDBResponse;
    type Id = CustomerDepartmentId;
    type Filter = CustomerDepartmentFilter;

    #[instrument(skip(self, request), fields(customer_id = request.customer_id, department_id = request.department_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let link = sqlx::query_as::<_, CustomerDepartmentDBResponse>(
            "INSERT INTO customer_departments (customer_id, department_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(request.customer_id)
        .bind(request.department_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(link)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let link = sqlx::query_as::<_, CustomerDepartmentDBResponse>("SELECT * FROM customer_departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(link)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM customer_departments WHERE 1=1");

        if let Some(customer_id) = filter.customer_id {
            query.push(" AND customer_id = ");
            query.push_bind(customer_id);
        }

        if let Some(department_id) = filter.department_id {
            query.push(" AND department_id = ");
            query.push_bind(department_id);
        }

        query.push(" ORDER BY id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let links = query
            .build_query_as::<CustomerDepartmentDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(links)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM customer_departments WHERE id = $1")
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
        let link = sqlx::query_as::<_, CustomerDepartmentDBResponse>(
            r#"
            UPDATE customer_departments SET
                customer_id = COALESCE($2, customer_id),
                department_id = COALESCE($3, department_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.customer_id)
        .bind(request.department_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(link)
    }
}

impl<'c> CustomerDepartments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
