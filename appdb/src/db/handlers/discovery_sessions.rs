//! Database repository for discovery query sessions.
//!
//! Sessions belong to a user and are removed with them. The application scope is optional and
//! is cleared, not cascaded, when the application goes away. Deleting a session removes its
//! messages.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::discovery::{SessionCreateDBRequest, SessionDBResponse, SessionUpdateDBRequest},
    validation,
};
use crate::types::{ApplicationId, SessionId, SortDirection, UserId};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Column a session listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionSort {
    #[default]
    Id,
    CreatedAt,
    UpdatedAt,
}

impl SessionSort {
    fn column(&self) -> &'static str {
        match self {
            SessionSort::Id => "id",
            SessionSort::CreatedAt => "created_at",
            SessionSort::UpdatedAt => "updated_at",
        }
    }
}

/// Filter for listing sessions
#[derive(Debug, Clone)]
pub struct SessionFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
    pub application_id: Option<ApplicationId>,
    pub favorites_only: bool,
    /// Case-insensitive substring match on the title
    pub search: Option<String>,
    pub sort: SessionSort,
    pub direction: SortDirection,
}

impl SessionFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            user_id: None,
            application_id: None,
            favorites_only: false,
            search: None,
            sort: SessionSort::default(),
            direction: SortDirection::default(),
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn for_application(mut self, application_id: ApplicationId) -> Self {
        self.application_id = Some(application_id);
        self
    }

    pub fn favorites(mut self) -> Self {
        self.favorites_only = true;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Most recently active first
    pub fn recent_first(mut self) -> Self {
        self.sort = SessionSort::UpdatedAt;
        self.direction = SortDirection::Desc;
        self
    }
}

pub struct Sessions<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Sessions<'c> {
    type CreateRequest = SessionCreateDBRequest;
    type UpdateRequest = SessionUpdateDBRequest;
    type Response = SessionDBResponse;
    type Id = SessionId;
    type Filter = SessionFilter;

    #[instrument(skip(self, request), fields(user_id = request.user_id, application_id = ?request.application_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        request.validate()?;

        let session = sqlx::query_as::<_, SessionDBResponse>(
            r#"
            INSERT INTO discovery_query_sessions (user_id, application_id, title, is_favorite)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.application_id)
        .bind(&request.title)
        .bind(request.is_favorite)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(session)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let session = sqlx::query_as::<_, SessionDBResponse>("SELECT * FROM discovery_query_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(session)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip, user_id = ?filter.user_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM discovery_query_sessions WHERE 1=1");

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ");
            query.push_bind(user_id);
        }

        if let Some(application_id) = filter.application_id {
            query.push(" AND application_id = ");
            query.push_bind(application_id);
        }

        if filter.favorites_only {
            query.push(" AND is_favorite");
        }

        if let Some(ref search) = filter.search {
            query.push(" AND LOWER(title) LIKE ");
            query.push_bind(validation::contains_pattern(search));
            query.push(" ESCAPE '\\'");
        }

        // Sort column and direction come from enums, never from caller strings
        let direction = filter.direction.as_sql();
        query.push(format!(" ORDER BY {} {direction}, id {direction} LIMIT ", filter.sort.column()));
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let sessions = query.build_query_as::<SessionDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(sessions)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM discovery_query_sessions WHERE id = $1")
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

        let session = sqlx::query_as::<_, SessionDBResponse>(
            r#"
            UPDATE discovery_query_sessions SET
                title = COALESCE($2, title),
                is_favorite = COALESCE($3, is_favorite),
                application_id = CASE
                    WHEN $4::boolean THEN $5
                    ELSE application_id
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(request.is_favorite)
        .bind(request.application_id.is_some())
        .bind(request.application_id.flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(session)
    }
}

impl<'c> Sessions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
