//! Database repository for discovery query messages.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::discovery::{MessageCreateDBRequest, MessageDBResponse, MessageUpdateDBRequest},
    validation,
};
use crate::types::{MessageId, MessageSender, SessionId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing messages. Results are in conversation order (creation time, then id).
#[derive(Debug, Clone)]
pub struct MessageFilter {
    pub skip: i64,
    pub limit: i64,
    pub session_id: Option<SessionId>,
    pub sender: Option<MessageSender>,
}

impl MessageFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            session_id: None,
            sender: None,
        }
    }

    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

#[derive(Debug, FromRow)]
struct Message {
    id: MessageId,
    session_id: SessionId,
    sender: String,
    content: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<Message> for MessageDBResponse {
    type Error = DbError;

    fn try_from(row: Message) -> Result<Self> {
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            sender: row.sender.parse()?,
            content: row.content,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

pub struct Messages<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Messages<'c> {
    type CreateRequest = MessageCreateDBRequest;
    type UpdateRequest = MessageUpdateDBRequest;
    type Response = MessageDBResponse;
    type Id = MessageId;
    type Filter = MessageFilter;

    #[instrument(skip(self, request), fields(session_id = request.session_id, sender = %request.sender), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let row = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO discovery_query_messages (session_id, sender, content, metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.session_id)
        .bind(request.sender.as_str())
        .bind(&request.content)
        .bind(&request.metadata)
        .fetch_one(&mut *self.db)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let row = sqlx::query_as::<_, Message>("SELECT * FROM discovery_query_messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip, session_id = ?filter.session_id), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        validation::page(filter.skip, filter.limit)?;

        let mut query = QueryBuilder::new("SELECT * FROM discovery_query_messages WHERE 1=1");

        if let Some(session_id) = filter.session_id {
            query.push(" AND session_id = ");
            query.push_bind(session_id);
        }

        if let Some(sender) = filter.sender {
            query.push(" AND sender = ");
            query.push_bind(sender.as_str());
        }

        query.push(" ORDER BY created_at, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let rows = query.build_query_as::<Message>().fetch_all(&mut *self.db).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM discovery_query_messages WHERE id = $1")
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
        let row = sqlx::query_as::<_, Message>(
            r#"
            UPDATE discovery_query_messages SET
                content = COALESCE($2, content),
                metadata = CASE
                    WHEN $3::boolean THEN $4
                    ELSE metadata
                END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.content)
        .bind(request.metadata.is_some())
        .bind(request.metadata.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        row.try_into()
    }
}

impl<'c> Messages<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Number of messages in a session
    #[instrument(skip(self), err)]
    pub async fn count_for_session(&mut self, session_id: SessionId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discovery_query_messages WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
