use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::services::{
    ConversationService, Embedder, EmbeddingService, RetrievalIndex, RetrievalScope, VectorStore,
};
use crate::store::{Conversation, MessageRole, PoolManager};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub chapter_id: Option<String>,
    pub title: Option<String>,
}

/// POST /api/conversations - Start a new tutoring conversation
pub async fn create_conversation(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = PoolManager::pool()?;
    let service = ConversationService::new(pool);

    let conversation = service
        .create_conversation(auth.user_id, payload.chapter_id, payload.title)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": conversation })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub role: String,
    pub content: String,
    pub metadata: Option<Value>,
}

/// POST /api/conversations/:id/messages - Append one immutable message
///
/// The message is committed synchronously; embedding and indexing run as a
/// detached task afterwards, and the index is only written when the embed
/// call succeeds.
pub async fn append_message(
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<AppendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = MessageRole::parse(&payload.role).ok_or_else(|| {
        ApiError::validation_error(format!("Invalid message role: {}", payload.role))
    })?;

    let pool = PoolManager::pool()?;
    let service = ConversationService::new(pool.clone());

    require_owned(&service, conversation_id, auth.user_id).await?;

    let message = service
        .append_message(conversation_id, role, &payload.content, payload.metadata)
        .await?;

    spawn_indexing(pool, message.id, payload.content);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": message })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    pub q: String,
    pub k: Option<usize>,
}

/// GET /api/conversations/:id/context - Prior messages ranked by similarity
/// to the query text, for assembling the next tutoring response.
pub async fn conversation_context(
    Extension(auth): Extension<AuthUser>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<ContextQuery>,
) -> Result<Json<Value>, ApiError> {
    if query.q.trim().is_empty() {
        return Err(ApiError::validation_error("Query text must not be empty"));
    }

    let pool = PoolManager::pool()?;
    let service = ConversationService::new(pool.clone());

    require_owned(&service, conversation_id, auth.user_id).await?;

    let vector = EmbeddingService::from_config().embed(&query.q).await?;

    let hits = RetrievalIndex::new(pool)
        .query(
            &vector,
            query.k.unwrap_or(8),
            RetrievalScope::Conversation(conversation_id),
        )
        .await?;

    Ok(Json(json!({ "success": true, "data": hits })))
}

/// A conversation belongs to exactly one user; anyone else sees a 404
/// rather than a confirmation that the id exists.
async fn require_owned(
    service: &ConversationService,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, ApiError> {
    let conversation = service
        .get_conversation(conversation_id)
        .await?
        .filter(|c| c.user_id == user_id)
        .ok_or_else(|| {
            ApiError::not_found(format!("Conversation {} not found", conversation_id))
        })?;

    Ok(conversation)
}

/// Embed the message content and record the vector, strictly in that order.
/// A failed embed means no index row at all; it never stores a placeholder.
async fn index_message<E, V>(embedder: &E, index: &V, message_id: Uuid, content: &str)
where
    E: Embedder,
    V: VectorStore,
{
    match embedder.embed(content).await {
        Ok(vector) => {
            if let Err(e) = index.store(message_id, &vector).await {
                error!("Failed to index message {}: {}", message_id, e);
            }
        }
        Err(e) => {
            warn!("Skipping retrieval index for message {}: {}", message_id, e);
        }
    }
}

fn spawn_indexing(pool: PgPool, message_id: Uuid, content: String) {
    let embedder = EmbeddingService::from_config();
    let index = RetrievalIndex::new(pool);

    tokio::spawn(async move {
        index_message(&embedder, &index, message_id, &content).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::services::EmbeddingError;
    use crate::store::StoreError;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.0.clone())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::RemoteStatus(503))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        rows: Mutex<Vec<(Uuid, Vec<f32>)>>,
        fail: bool,
    }

    #[async_trait]
    impl VectorStore for RecordingSink {
        async fn store(&self, message_id: Uuid, vector: &[f32]) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
            }
            self.rows.lock().unwrap().push((message_id, vector.to_vec()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_embed_stores_the_vector() {
        let sink = RecordingSink::default();
        let id = Uuid::new_v4();

        index_message(&FixedEmbedder(vec![0.1, 0.2]), &sink, id, "what is a derivative").await;

        let rows = sink.rows.lock().unwrap();
        assert_eq!(rows.as_slice(), &[(id, vec![0.1, 0.2])]);
    }

    #[tokio::test]
    async fn failed_embed_stores_nothing() {
        let sink = RecordingSink::default();

        index_message(&FailingEmbedder, &sink, Uuid::new_v4(), "what is a derivative").await;

        assert!(sink.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_contained() {
        let sink = RecordingSink {
            fail: true,
            ..Default::default()
        };

        index_message(&FixedEmbedder(vec![1.0]), &sink, Uuid::new_v4(), "hello").await;

        assert!(sink.rows.lock().unwrap().is_empty());
    }
}
