use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::store::{Conversation, Message, MessageRole, StoreError};

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Conversation {0} not found")]
    NotFound(Uuid),

    #[error("Invalid message role: {0}")]
    InvalidMessageRole(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for ConversationError {
    fn from(err: sqlx::Error) -> Self {
        ConversationError::Store(StoreError::Sqlx(err))
    }
}

/// Append-only persistence for tutoring dialogues. Messages are never
/// updated or deleted; corrections arrive as new messages.
pub struct ConversationService {
    pool: PgPool,
}

impl ConversationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_conversation(
        &self,
        user_id: Uuid,
        chapter_id: Option<String>,
        title: Option<String>,
    ) -> Result<Conversation, ConversationError> {
        // created_at == updated_at at creation
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id,
            chapter_id,
            title,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO conversations (id, user_id, chapter_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(conversation.id)
        .bind(conversation.user_id)
        .bind(&conversation.chapter_id)
        .bind(&conversation.title)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(conversation)
    }

    pub async fn get_conversation(
        &self,
        id: Uuid,
    ) -> Result<Option<Conversation>, ConversationError> {
        let row = sqlx::query(
            "SELECT id, user_id, chapter_id, title, created_at, updated_at \
             FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Conversation {
            id: r.get("id"),
            user_id: r.get("user_id"),
            chapter_id: r.get("chapter_id"),
            title: r.get("title"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Append one immutable message. Runs in a transaction that locks the
    /// parent conversation row, so appends to the same conversation are
    /// serialized: the new `created_at` is clamped to never precede the
    /// previous message, `seq` increments per insertion, and the parent's
    /// `updated_at` becomes the new message's `created_at`. An abandoned call
    /// (cancelled before commit) leaves nothing behind.
    pub async fn append_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<Message, ConversationError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(conversation_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ConversationError::NotFound(conversation_id));
        }

        let last = sqlx::query(
            "SELECT created_at, seq FROM messages \
             WHERE conversation_id = $1 ORDER BY created_at DESC, seq DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|r| (r.get::<DateTime<Utc>, _>("created_at"), r.get::<i64, _>("seq")));

        let (created_at, seq) = next_position(last, Utc::now());

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            metadata: metadata.unwrap_or_else(|| serde_json::json!({})),
            created_at,
            seq,
        };

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, metadata, created_at, seq)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.metadata)
        .bind(message.created_at)
        .bind(message.seq)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(message.created_at)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(message)
    }

    /// Messages of one conversation in log order.
    pub async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<Message>, ConversationError> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, role, content, metadata, created_at, seq \
             FROM messages WHERE conversation_id = $1 ORDER BY created_at, seq",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for r in rows {
            let role_str: String = r.get("role");
            let role = MessageRole::parse(&role_str)
                .ok_or_else(|| ConversationError::InvalidMessageRole(role_str))?;
            messages.push(Message {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                role,
                content: r.get("content"),
                metadata: r.get("metadata"),
                created_at: r.get("created_at"),
                seq: r.get("seq"),
            });
        }

        Ok(messages)
    }
}

/// Timestamp and sequence for the next message, given the newest existing
/// message. The timestamp never moves backwards relative to the log tail.
fn next_position(
    last: Option<(DateTime<Utc>, i64)>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, i64) {
    match last {
        Some((last_at, last_seq)) => (now.max(last_at), last_seq + 1),
        None => (now, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn first_message_starts_the_sequence() {
        let now = Utc::now();
        assert_eq!(next_position(None, now), (now, 0));
    }

    #[test]
    fn timestamps_never_move_backwards() {
        let now = Utc::now();
        let ahead = now + Duration::seconds(5);

        // A skewed clock cannot reorder the log.
        assert_eq!(next_position(Some((ahead, 3)), now), (ahead, 4));
        // A normal clock moves the log forward.
        let behind = now - Duration::seconds(5);
        assert_eq!(next_position(Some((behind, 3)), now), (now, 4));
    }

    #[test]
    fn sequence_breaks_timestamp_ties_by_insertion() {
        let t = Utc::now();
        let (t1, s1) = next_position(Some((t, 0)), t);
        let (t2, s2) = next_position(Some((t1, s1)), t);
        assert_eq!(t1, t);
        assert_eq!(t2, t);
        assert!(s2 > s1);
    }
}
