use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{ChapterStatus, Profile};
use super::{AdminStore, StoreError};
use crate::auth::Role;

/// Postgres-backed implementation of the admin collaborator surface.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn read_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query("SELECT id, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Profile {
            id: r.get("id"),
            role: r.get("role"),
        }))
    }

    async fn update_profile_role(&self, id: Uuid, role: Role) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE profiles SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Profile {} not found", id)));
        }

        Ok(())
    }

    async fn update_chapters_status(
        &self,
        ids: &[String],
        status: ChapterStatus,
    ) -> Result<u64, StoreError> {
        // Single statement so readers observe all-or-nothing.
        let result = sqlx::query("UPDATE chapters SET status = $1 WHERE id = ANY($2)")
            .bind(status.as_str())
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
