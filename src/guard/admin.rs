use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{is_valid_role, Role};
use crate::store::{AdminStore, ChapterStatus, StoreError};

/// Deterministic outcomes of guarded admin mutations. The display strings for
/// the first four variants are part of the caller-facing contract and must
/// not change.
#[derive(Debug, Error)]
pub enum AdminActionError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid role")]
    InvalidRole,

    #[error("Cannot change your own role")]
    SelfChange,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Persistence(String),
}

/// Enforces authorization and safety checks in front of admin mutations.
/// Holds only the store seam; every check re-reads current state rather than
/// caching it, so concurrent role changes are resolved by whatever the store
/// holds at check time.
pub struct AdminActionGuard<S: AdminStore> {
    store: S,
}

impl<S: AdminStore> AdminActionGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Change another user's role. Self-changes are rejected unconditionally,
    /// even when the new role equals the current one, to close every path to
    /// accidental admin lockout.
    ///
    /// On success the caller owns invalidating any cached views of the
    /// target's profile.
    pub async fn update_user_role(
        &self,
        actor: Option<Uuid>,
        target: Uuid,
        new_role: &str,
    ) -> Result<(), AdminActionError> {
        let actor = actor.ok_or(AdminActionError::NotAuthenticated)?;

        let profile = self.store.read_profile(actor).await?;

        let actor_role = profile.and_then(|p| Role::parse(&p.role));
        if actor_role != Some(Role::Admin) {
            return Err(AdminActionError::Unauthorized);
        }

        if !is_valid_role(new_role) {
            return Err(AdminActionError::InvalidRole);
        }

        if target == actor {
            return Err(AdminActionError::SelfChange);
        }

        // is_valid_role passed, so parse cannot fail here
        let role = Role::parse(new_role).ok_or(AdminActionError::InvalidRole)?;

        self.store.update_profile_role(target, role).await?;

        info!("Role of user {} changed to {} by {}", target, role, actor);
        Ok(())
    }

    /// Set the publication status of a batch of chapters. The store applies
    /// the change as a single statement, so readers never observe a partial
    /// subset. Returns the number of chapters updated.
    pub async fn bulk_update_chapter_status(
        &self,
        actor: Option<Uuid>,
        chapter_ids: &[String],
        status: &str,
    ) -> Result<u64, AdminActionError> {
        let actor = actor.ok_or(AdminActionError::NotAuthenticated)?;

        // A store read failure and an absent profile are distinct outcomes.
        let profile = self
            .store
            .read_profile(actor)
            .await?
            .ok_or_else(|| AdminActionError::NotFound("Profile not found".to_string()))?;

        if Role::parse(&profile.role) != Some(Role::Admin) {
            return Err(AdminActionError::Unauthorized);
        }

        if chapter_ids.is_empty() || chapter_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(AdminActionError::Validation(
                "chapterIds must be a non-empty list of chapter ids".to_string(),
            ));
        }

        let status = ChapterStatus::parse(status).ok_or_else(|| {
            AdminActionError::Validation(
                "status must be either \"draft\" or \"published\"".to_string(),
            )
        })?;

        debug!("Bulk status update: {} chapters -> {}", chapter_ids.len(), status);

        let updated = self
            .store
            .update_chapters_status(chapter_ids, status)
            .await?;

        // Chapter existence is delegated to the store; an update that matched
        // nothing is surfaced instead of reported as success.
        if updated == 0 {
            return Err(AdminActionError::NotFound(
                "No chapters matched the requested ids".to_string(),
            ));
        }

        Ok(updated)
    }
}

// Any store error reaching the guard becomes Persistence, carrying the
// store's own message. Absent-profile NotFound is raised by the guard itself.
impl From<StoreError> for AdminActionError {
    fn from(err: StoreError) -> Self {
        AdminActionError::Persistence(err.to_string())
    }
}
