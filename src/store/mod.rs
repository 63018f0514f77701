use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod manager;
pub mod models;
pub mod postgres;

pub use manager::PoolManager;
pub use models::{
    ChapterStatus, Conversation, EmbeddedMessage, Message, MessageRole, Profile,
};
pub use postgres::PgStore;

use crate::auth::Role;

/// Errors from the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The slice of the backing store the admin action guard depends on.
/// Kept as a trait so guard logic can be exercised against an in-memory
/// store in tests.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Read a profile row. `Ok(None)` means the profile does not exist;
    /// `Err` means the store itself failed. Callers rely on that distinction.
    async fn read_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Persist a role change. `role` is already validated by the caller.
    async fn update_profile_role(&self, id: Uuid, role: Role) -> Result<(), StoreError>;

    /// Apply `status` to every chapter in `ids` as one batched statement,
    /// returning the number of rows that matched.
    async fn update_chapters_status(
        &self,
        ids: &[String],
        status: ChapterStatus,
    ) -> Result<u64, StoreError>;
}
