use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::store::{EmbeddedMessage, StoreError};

/// Restriction applied to a similarity query.
#[derive(Debug, Clone, Copy)]
pub enum RetrievalScope {
    Conversation(Uuid),
    User(Uuid),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMessage {
    pub message_id: Uuid,
    pub score: f32,
}

/// Write side of the index, split out as a trait so the ingestion pipeline
/// can be exercised against an in-memory sink.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Record the vector for a message. Messages are immutable, so a
    /// duplicate store for the same message is a no-op rather than an
    /// overwrite.
    async fn store(&self, message_id: Uuid, vector: &[f32]) -> Result<(), StoreError>;
}

/// Associates embedding vectors with messages and answers similarity
/// queries over them. A vector row only ever exists for a message whose
/// embed call succeeded; the ingestion pipeline never stores placeholders.
pub struct RetrievalIndex {
    pool: PgPool,
}

impl RetrievalIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Up to `k` scoped messages ranked by cosine similarity to `vector`,
    /// most similar first; equal scores rank the more recent message first.
    pub async fn query(
        &self,
        vector: &[f32],
        k: usize,
        scope: RetrievalScope,
    ) -> Result<Vec<ScoredMessage>, StoreError> {
        let candidates = self.load_candidates(scope).await?;
        Ok(rank(candidates, vector, k))
    }

    async fn load_candidates(
        &self,
        scope: RetrievalScope,
    ) -> Result<Vec<EmbeddedMessage>, StoreError> {
        let rows = match scope {
            RetrievalScope::Conversation(conversation_id) => {
                sqlx::query(
                    "SELECT e.message_id, e.embedding, m.created_at \
                     FROM message_embeddings e \
                     JOIN messages m ON m.id = e.message_id \
                     WHERE m.conversation_id = $1",
                )
                .bind(conversation_id)
                .fetch_all(&self.pool)
                .await?
            }
            RetrievalScope::User(user_id) => {
                sqlx::query(
                    "SELECT e.message_id, e.embedding, m.created_at \
                     FROM message_embeddings e \
                     JOIN messages m ON m.id = e.message_id \
                     JOIN conversations c ON c.id = m.conversation_id \
                     WHERE c.user_id = $1",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|r| EmbeddedMessage {
                message_id: r.get("message_id"),
                embedding: r.get("embedding"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}

#[async_trait]
impl VectorStore for RetrievalIndex {
    async fn store(&self, message_id: Uuid, vector: &[f32]) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO message_embeddings (message_id, embedding)
            VALUES ($1, $2)
            ON CONFLICT (message_id) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(vector.to_vec())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Cosine similarity of two vectors. Mismatched lengths or a zero-norm side
/// score 0.0 rather than poisoning the ranking with NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank candidates by descending similarity, ties broken by newer
/// `created_at` first, truncated to `k`.
fn rank(candidates: Vec<EmbeddedMessage>, query: &[f32], k: usize) -> Vec<ScoredMessage> {
    let mut scored: Vec<(ScoredMessage, chrono::DateTime<chrono::Utc>)> = candidates
        .into_iter()
        .map(|candidate| {
            let score = cosine_similarity(query, &candidate.embedding);
            (
                ScoredMessage {
                    message_id: candidate.message_id,
                    score,
                },
                candidate.created_at,
            )
        })
        .collect();

    scored.sort_by(|(a, a_at), (b, b_at)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b_at.cmp(a_at))
    });

    scored.truncate(k);
    scored.into_iter().map(|(hit, _)| hit).collect()
}
