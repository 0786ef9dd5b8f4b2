use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;
use crate::core::{filters::matches_query_constraints, PairKey};
use crate::models::{Block, CandidateQuery, Conversation, MatchRecord, Swipe, User, UserId};
use super::store::{BlockRegistry, MatchStore, PairRemoval, StoreError, UserDirectory};

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, User>,
    blocks: HashMap<(UserId, UserId), Block>,
    swipes: HashMap<(UserId, UserId), Swipe>,
    matches: HashMap<PairKey, MatchRecord>,
    conversations: HashMap<Uuid, Conversation>,
}

/// In-process store implementing every storage interface
///
/// Enforces the same uniqueness rules as the PostgreSQL schema: one swipe
/// per ordered pair, one match per canonical pair. All mutations happen
/// under a single lock, so match and conversation creation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store preloaded with users
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let state = State {
            users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            ..Default::default()
        };
        Self {
            state: Mutex::new(state),
        }
    }

    /// Insert or replace a user record
    pub async fn upsert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn match_count(&self) -> usize {
        self.state.lock().await.matches.len()
    }

    pub async fn conversation_count(&self) -> usize {
        self.state.lock().await.conversations.len()
    }

    pub async fn swipe_count(&self) -> usize {
        self.state.lock().await.swipes.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }

    async fn query_candidates(&self, query: &CandidateQuery) -> Result<Vec<User>, StoreError> {
        let state = self.state.lock().await;

        let candidates: Vec<User> = state
            .users
            .values()
            .filter(|user| matches_query_constraints(user, query))
            .take(query.limit)
            .cloned()
            .collect();

        tracing::debug!(
            "Memory directory returned {} candidates for {}",
            candidates.len(),
            query.requester_id
        );

        Ok(candidates)
    }
}

#[async_trait]
impl BlockRegistry for MemoryStore {
    async fn is_blocked(&self, a: &str, b: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state.blocks.contains_key(&(a.to_string(), b.to_string()))
            || state.blocks.contains_key(&(b.to_string(), a.to_string())))
    }

    async fn blocked_ids(&self, user_id: &str) -> Result<HashSet<UserId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .blocks
            .keys()
            .filter_map(|(blocker, blocked)| {
                if blocker == user_id {
                    Some(blocked.clone())
                } else if blocked == user_id {
                    Some(blocker.clone())
                } else {
                    None
                }
            })
            .collect())
    }

    async fn record_block(&self, blocker_id: &str, blocked_id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .blocks
            .entry((blocker_id.to_string(), blocked_id.to_string()))
            .or_insert_with(|| Block {
                blocker_id: blocker_id.to_string(),
                blocked_id: blocked_id.to_string(),
                created_at: Utc::now(),
            });
        Ok(())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn insert_swipe(&self, swipe: &Swipe) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let key = (swipe.actor_id.clone(), swipe.target_id.clone());

        if state.swipes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "swipe {} -> {}",
                swipe.actor_id, swipe.target_id
            )));
        }

        state.swipes.insert(key, swipe.clone());
        Ok(())
    }

    async fn find_swipe(&self, actor_id: &str, target_id: &str) -> Result<Option<Swipe>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .get(&(actor_id.to_string(), target_id.to_string()))
            .cloned())
    }

    async fn swiped_target_ids(&self, actor_id: &str) -> Result<HashSet<UserId>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .keys()
            .filter(|(actor, _)| actor == actor_id)
            .map(|(_, target)| target.clone())
            .collect())
    }

    async fn create_match(&self, pair: &PairKey, initiator_id: &str) -> Result<MatchRecord, StoreError> {
        let mut state = self.state.lock().await;

        if state.matches.contains_key(pair) {
            return Err(StoreError::Duplicate(format!("match {}", pair)));
        }

        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            participants: [pair.user1().to_string(), pair.user2().to_string()]
                .into_iter()
                .collect(),
            created_at: now,
        };
        let record = MatchRecord {
            id: Uuid::new_v4(),
            user1_id: pair.user1().to_string(),
            user2_id: pair.user2().to_string(),
            initiator_id: initiator_id.to_string(),
            conversation_id: conversation.id,
            created_at: now,
        };

        state.conversations.insert(conversation.id, conversation);
        state.matches.insert(pair.clone(), record.clone());

        Ok(record)
    }

    async fn find_match(&self, pair: &PairKey) -> Result<Option<MatchRecord>, StoreError> {
        Ok(self.state.lock().await.matches.get(pair).cloned())
    }

    async fn matches_for_user(&self, user_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.lock().await;
        let mut records: Vec<MatchRecord> = state
            .matches
            .values()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, StoreError> {
        Ok(self.state.lock().await.conversations.get(&conversation_id).cloned())
    }

    async fn remove_pair(&self, pair: &PairKey) -> Result<PairRemoval, StoreError> {
        let mut state = self.state.lock().await;
        let mut removal = PairRemoval::default();

        if let Some(record) = state.matches.remove(pair) {
            removal.match_removed = true;
            removal.conversation_removed = state.conversations.remove(&record.conversation_id).is_some();
        }

        let (a, b) = (pair.user1().to_string(), pair.user2().to_string());
        for key in [(a.clone(), b.clone()), (b, a)] {
            if state.swipes.remove(&key).is_some() {
                removal.swipes_removed += 1;
            }
        }

        Ok(removal)
    }
}
