//! Database repository for customers.
//!
//! A customer linked to any department cannot be deleted (`ON DELETE RESTRICT` on
//! `customer_departments`); remove the links first.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{CustomerCreateDBRequest, CustomerDBResponse, CustomerUpdateDBRequest},
    validation,
};
use crate::types::CustomerId;
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing customers
#[derive(Debug, Clone)]
pub struct CustomerFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
}

impl CustomerFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }
}

pub struct Customers<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Customers<'c> {
    type CreateRequest = CustomerCreateDBRequest;
    type UpdateRequest = CustomerUpdateDBRequest;
    type Response = CustomerDBResponse;
    type Id = CustomerId;
    type Filter = CustomerFilter;

    #[instrument(skip(self, request), fields(customer_name = %request.customer_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let customer = sqlx::query_as::<_, CustomerDBResponse>("INSERT INTO customers (customer_name) VALUES ($1) RETURNING *")
            .bind(&request.customer_name)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(customer)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>("SELECT * FROM customers WHERE customer_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(customer)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM customers WHERE 1=1");

        if let Some(ref search) = filter.search {
            query.push(" AND LOWER(customer_name) LIKE ");
            query.push_bind(validation::contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }

        query.push(" ORDER BY customer_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let customers = query.build_query_as::<CustomerDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(customers)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
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

        let customer = sqlx::query_as::<_, CustomerDBResponse>(
            "UPDATE customers SET customer_name = COALESCE($2, customer_name) WHERE customer_id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&request.customer_name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(customer)
    }
}

impl<'c> Customers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
