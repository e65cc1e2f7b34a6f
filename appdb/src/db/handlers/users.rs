//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    validation,
};
use crate::types::{RoleId, UserId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub role_id: Option<RoleId>,
    /// Case-insensitive substring search on username and email
    pub search: Option<String>,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            role_id: None,
            search: None,
        }
    }

    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        // user_id and created_at come from the database
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (username, email, password_hash, enrolled, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.enrolled)
        .bind(request.role_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE user_id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM users WHERE 1=1");

        if let Some(role_id) = filter.role_id {
            query.push(" AND role_id = ");
            query.push_bind(role_id);
        }

        if let Some(ref search) = filter.search {
            let search_pattern = validation::contains_pattern(search);
            query.push(" AND (LOWER(username) LIKE ");
            query.push_bind(search_pattern.clone());
            query.push(" ESCAPE '\\' OR LOWER(email) LIKE ");
            query.push_bind(search_pattern);
            query.push(" ESCAPE '\\')");
        }

        query.push(" ORDER BY user_id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let users = query.build_query_as::<UserDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(users)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        // Role assignments and discovery sessions go with the user (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
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

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                enrolled = CASE
                    WHEN $5::boolean THEN $6
                    ELSE enrolled
                END,
                role_id = CASE
                    WHEN $7::boolean THEN $8
                    ELSE role_id
                END
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(request.enrolled.is_some())
        .bind(request.enrolled.clone().flatten())
        .bind(request.role_id.is_some())
        .bind(request.role_id.flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::UserRoles;
    use crate::db::models::users::UserRoleCreateDBRequest;
    use crate::test_utils::{create_test_application, create_test_user, user_request};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&user_request("testuser")).await.unwrap();

        assert!(user.user_id > 0);
        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "testuser@example.com");
        assert_eq!(user.role_id, None);
        assert_eq!(user.enrolled, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&user_request("dup")).await.unwrap();
        let err = repo.create(&user_request("dup")).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(err.constraint(), Some("users_email_key"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_role_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let mut request = user_request("orphan");
        request.role_id = Some(9999);
        let err = repo.create(&request).await.unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_input_never_reaches_database(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let mut request = user_request("toolong");
        request.username = "u".repeat(101);
        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::Validation { ref field, .. } if field == "username"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_email_and_missing_user(pool: PgPool) {
        let created = create_test_user(&pool, "emailuser").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let found = repo.get_by_email("emailuser@example.com").await.unwrap().unwrap();
        assert_eq!(found, created);

        assert!(repo.get_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.get_by_id(created.user_id + 1000).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_assigns_and_clears_role(pool: PgPool) {
        let user = create_test_user(&pool, "roleuser").await;

        let mut conn = pool.acquire().await.unwrap();
        let role = UserRoles::new(&mut conn).create(&UserRoleCreateDBRequest::new("admin")).await.unwrap();

        let mut repo = Users::new(&mut conn);
        let updated = repo
            .update(
                user.user_id,
                &UserUpdateDBRequest {
                    role_id: Some(Some(role.role_id)),
                    enrolled: Some(Some("2026-Q1".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role_id, Some(role.role_id));
        assert_eq!(updated.enrolled.as_deref(), Some("2026-Q1"));
        // Untouched fields are preserved
        assert_eq!(updated.username, "roleuser");
        assert_eq!(updated.created_at, user.created_at);

        // An empty patch changes nothing
        let unchanged = repo.update(user.user_id, &UserUpdateDBRequest::default()).await.unwrap();
        assert_eq!(unchanged, updated);

        let cleared = repo
            .update(
                user.user_id,
                &UserUpdateDBRequest {
                    role_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.role_id, None);
        assert_eq!(cleared.enrolled.as_deref(), Some("2026-Q1"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete_missing_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let err = repo.update(42, &UserUpdateDBRequest::default()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        let err = repo.delete(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_cascades_to_assignments(pool: PgPool) {
        let user = create_test_user(&pool, "leaver").await;
        let app = create_test_application(&pool, "Billing").await;

        sqlx::query("INSERT INTO application_users (application_id, user_id, role_in_app) VALUES ($1, $2, 'owner')")
            .bind(app.application_id)
            .bind(user.user_id)
            .execute(&pool)
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        Users::new(&mut conn).delete(user.user_id).await.unwrap();

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM application_users WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_pages(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let role = UserRoles::new(&mut conn).create(&UserRoleCreateDBRequest::new("viewer")).await.unwrap();

        let mut repo = Users::new(&mut conn);
        for name in ["anna", "bob", "carla", "dave"] {
            let mut request = user_request(name);
            if name.contains('a') {
                request.role_id = Some(role.role_id);
            }
            repo.create(&request).await.unwrap();
        }

        let first_page = repo.list(&UserFilter::new(0, 2)).await.unwrap();
        let second_page = repo.list(&UserFilter::new(2, 2)).await.unwrap();
        let names: Vec<_> = first_page.iter().chain(second_page.iter()).map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["anna", "bob", "carla", "dave"]);

        // Restarting the sequence yields the same window
        assert_eq!(repo.list(&UserFilter::new(0, 2)).await.unwrap(), first_page);

        let viewers = repo.list(&UserFilter::new(0, 10).with_role(role.role_id)).await.unwrap();
        assert_eq!(viewers.len(), 3);

        let search = repo.list(&UserFilter::new(0, 10).with_search("BO")).await.unwrap();
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].username, "bob");

        let err = repo.list(&UserFilter::new(0, 0)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }));
    }
}
