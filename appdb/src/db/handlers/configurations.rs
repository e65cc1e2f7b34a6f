//! Database repository for application configuration documents.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::applications::{ConfigurationCreateDBRequest, ConfigurationDBResponse, ConfigurationUpdateDBRequest},
    validation,
};
use crate::types::{ApplicationId, ConfigId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing configuration documents
#[derive(Debug, Clone)]
pub struct ConfigurationFilter {
    pub skip: i64,
    pub limit: i64,
    pub application_id: Option<ApplicationId>,
    pub document_type: Option<String>,
}

impl ConfigurationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            application_id: None,
            document_type: None,
        }
    }

    pub fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }
}

pub struct Configurations<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Configurations<'c> {
    type CreateRequest = ConfigurationCreateDBRequest;
    type UpdateRequest = ConfigurationUpdateDBRequest;
    type Response = ConfigurationDBResponse;
    type Id = ConfigId;
    type Filter = ConfigurationFilter;

    #[instrument(skip(self, request), fields(application_id = request.application_id, document_name = %request.document_name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let config = sqlx::query_as::<_, ConfigurationDBResponse>(
            r#"
            INSERT INTO configurations (application_id, document_name, document_type, document_path, version)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.application_id)
        .bind(&request.document_name)
        .bind(&request.document_type)
        .bind(&request.document_path)
        .bind(&request.version)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(config)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let config = sqlx::query_as::<_, ConfigurationDBResponse>("SELECT * FROM configurations WHERE config_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(config)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM configurations WHERE 1=1");

        if let Some(application_id) = filter.application_id {
            query.push(" AND application_id = ");
            query.push_bind(application_id);
        }

        if let Some(ref document_type) = filter.document_type {
            query.push(" AND document_type = ");
            query.push_bind(document_type.clone());
        }

        query.push(" ORDER BY config_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let configs = query.build_query_as::<ConfigurationDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(configs)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM configurations WHERE config_id = $1")
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

        let config = sqlx::query_as::<_, ConfigurationDBResponse>(
            r#"
            UPDATE configurations SET
                document_name = COALESCE($2, document_name),
                document_type = COALESCE($3, document_type),
                document_path = COALESCE($4, document_path),
                version = CASE
                    WHEN $5::boolean THEN $6
                    ELSE version
                END
            WHERE config_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.document_name)
        .bind(&request.document_type)
        .bind(&request.document_path)
        .bind(request.version.is_some())
        .bind(request.version.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(config)
    }
}

impl<'c> Configurations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_application;
    use sqlx::PgPool;

    fn document(application_id: ApplicationId, name: &str, document_type: &str) -> ConfigurationCreateDBRequest {
        ConfigurationCreateDBRequest {
            application_id,
            document_name: name.to_string(),
            document_type: document_type.to_string(),
            document_path: format!("/configs/{name}.{document_type}"),
            version: Some("1.0.0".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_then_read_round_trips(pool: PgPool) {
        let app = create_test_application(&pool, "Billing").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Configurations::new(&mut conn);

        let request = document(app.application_id, "deploy", "yaml");
        let created = repo.create(&request).await.unwrap();
        let read = repo.get_by_id(created.config_id).await.unwrap().unwrap();

        assert_eq!(read, created);
        assert_eq!(read.application_id, request.application_id);
        assert_eq!(read.document_name, request.document_name);
        assert_eq!(read.document_type, request.document_type);
        assert_eq!(read.document_path, request.document_path);
        assert_eq!(read.version, request.version);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_application_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let err = Configurations::new(&mut conn).create(&document(999, "deploy", "yaml")).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_version_rejected(pool: PgPool) {
        let app = create_test_application(&pool, "Billing").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut request = document(app.application_id, "deploy", "yaml");
        request.version = Some("1".repeat(21));

        let err = Configurations::new(&mut conn).create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::Validation { ref field, .. } if field == "version"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_unpatched_fields(pool: PgPool) {
        let app = create_test_application(&pool, "Billing").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Configurations::new(&mut conn);
        let created = repo.create(&document(app.application_id, "deploy", "yaml")).await.unwrap();

        let updated = repo
            .update(
                created.config_id,
                &ConfigurationUpdateDBRequest {
                    document_path: Some("/configs/v2/deploy.yaml".to_string()),
                    version: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.document_path, "/configs/v2/deploy.yaml");
        assert_eq!(updated.version, None);
        assert_eq!(updated.document_name, "deploy");
        assert_eq!(updated.uploaded_at, created.uploaded_at);

        assert!(matches!(
            repo.update(created.config_id + 1, &ConfigurationUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_by_application_and_type(pool: PgPool) {
        let billing = create_test_application(&pool, "Billing").await;
        let search = create_test_application(&pool, "Search").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Configurations::new(&mut conn);
        repo.create(&document(billing.application_id, "deploy", "yaml")).await.unwrap();
        repo.create(&document(billing.application_id, "runbook", "md")).await.unwrap();
        repo.create(&document(search.application_id, "deploy", "yaml")).await.unwrap();

        let billing_docs = repo
            .list(&ConfigurationFilter::new(0, 10).for_application(billing.application_id))
            .await
            .unwrap();
        assert_eq!(billing_docs.len(), 2);

        let yaml_docs = repo.list(&ConfigurationFilter::new(0, 10).with_document_type("yaml")).await.unwrap();
        assert_eq!(yaml_docs.len(), 2);

        let billing_yaml = repo
            .list(
                &ConfigurationFilter::new(0, 10)
                    .for_application(billing.application_id)
                    .with_document_type("yaml"),
            )
            .await
            .unwrap();
        assert_eq!(billing_yaml.len(), 1);
        assert_eq!(billing_yaml[0].document_name, "deploy");
    }
}
