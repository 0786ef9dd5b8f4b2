//! Storage interfaces the matching service talks to.
//!
//! The user directory and block registry are owned by other modules and are
//! read (or, for blocks, appended to) through narrow traits. The match store
//! owns swipes, matches and the conversations opened for them.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;
use crate::core::PairKey;
use crate::models::{CandidateQuery, Conversation, MatchRecord, Swipe, User, UserId};

/// Errors raised by store implementations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored row could not be turned into a typed record
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// What a block cascade deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairRemoval {
    pub match_removed: bool,
    pub conversation_removed: bool,
    pub swipes_removed: u64,
}

/// Read access to user records
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Users passing every hard filter of `query`, at most `query.limit`
    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError>;
}

/// Asymmetric blocker -> blocked relation
#[async_trait]
pub trait BlockRegistry: Send + Sync {
    /// True if either user blocked the other
    async fn is_blocked(&self, a: &str, b: &str) -> Result<bool, StoreError>;

    /// Users `user_id` blocked plus users who blocked `user_id`
    async fn blocked_ids(&self, user_id: &str) -> Result<HashSet<UserId>, StoreError>;

    /// Idempotent
    async fn record_block(&self, blocker_id: &str, blocked_id: &str) -> Result<(), StoreError>;
}

/// Swipes, matches and match conversations
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert a swipe; `StoreError::Duplicate` if the ordered pair already swiped
    async fn insert_swipe(&self, swipe: &Swipe) -> Result<(), StoreError>;

    async fn find_swipe(&self, actor_id: &str, target_id: &str) -> Result<Option<Swipe>, StoreError>;

    async fn swiped_target_ids(&self, actor_id: &str) -> Result<HashSet<UserId>, StoreError>;

    /// Atomically create a conversation for the pair and the match pointing at it
    ///
    /// Returns `StoreError::Duplicate` without side effects when the pair is
    /// already matched.
    async fn create_match(&self, pair: &PairKey, initiator_id: &str) -> Result<MatchRecord, StoreError>;

    async fn find_match(&self, pair: &PairKey) -> Result<Option<MatchRecord>, StoreError>;

    async fn matches_for_user(&self, user_id: &str) -> Result<Vec<MatchRecord>, StoreError>;

    async fn find_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, StoreError>;

    /// Delete the pair's match, its conversation and both directional swipes
    async fn remove_pair(&self, pair: &PairKey) -> Result<PairRemoval, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
