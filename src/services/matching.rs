//! Matching orchestration: discovery feed, swipes, mutual match detection.
//!
//! A swipe is written on its own before the reciprocal check runs. Match and
//! conversation creation is a separate atomic store operation guarded by the
//! canonical pair's uniqueness constraint, so two opposite swipes racing each
//! other produce exactly one match: the loser sees `StoreError::Duplicate` and
//! returns the winner's record.
//!
//! Blocks are checked again once a swipe's writes are done. A block that
//! raced the swipe is then either seen by that re-check or its own pair
//! removal runs after the swipe's writes, so the pair never stays matched.

use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;
use crate::config::{MatchingSettings, Settings};
use crate::core::{
    filters::{build_candidate_query, within_max_distance},
    PairKey, Ranker,
};
use crate::error::{MatchError, StartupError};
use crate::models::{
    FeedEntry, FeedPage, FeedRequest, HealthResponse, Intent, MatchListing, MatchNotification,
    MatchRecord, MatchSummary, Swipe, SwipeAction, SwipeOutcome, SwipeRequest, User, UserId,
    UserSummary,
};
use super::cache::{CacheManager, CachedUserDirectory};
use super::notifier::{HttpNotifier, NoopNotifier, Notifier};
use super::postgres::PostgresStore;
use super::store::{BlockRegistry, MatchStore, PairRemoval, StoreError, UserDirectory};

/// Realtime event pushed to the counterpart of a new match
pub const MATCH_EVENT: &str = "match:new";

pub struct MatchingService {
    users: Arc<dyn UserDirectory>,
    blocks: Arc<dyn BlockRegistry>,
    matches: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
    ranker: Ranker,
    settings: MatchingSettings,
}

impl MatchingService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        blocks: Arc<dyn BlockRegistry>,
        matches: Arc<dyn MatchStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            users,
            blocks,
            matches,
            notifier,
            ranker: Ranker::with_default_weights(),
            settings: MatchingSettings::default(),
        }
    }

    pub fn with_ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_settings(mut self, settings: MatchingSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire the service against PostgreSQL, the profile cache and the notifier
    pub async fn connect(settings: &Settings) -> Result<Self, StartupError> {
        let store = PostgresStore::from_settings(&settings.database).await?;

        let users: Arc<dyn UserDirectory> = if settings.cache.enabled {
            let cache = CacheManager::from_settings(&settings.cache).await?;
            tracing::info!(
                "User cache enabled (L1: {} entries, TTL: {}s, shared tier: {})",
                settings.cache.l1_cache_size,
                settings.cache.ttl_secs,
                cache.has_shared_tier()
            );
            Arc::new(CachedUserDirectory::new(store.clone(), Arc::new(cache)))
        } else {
            Arc::new(store.clone())
        };

        let notifier: Arc<dyn Notifier> = match HttpNotifier::from_settings(&settings.notifier)? {
            Some(http) => Arc::new(http),
            None => {
                tracing::warn!("No notifier endpoint configured, match notifications are dropped");
                Arc::new(NoopNotifier)
            }
        };

        let store = Arc::new(store);

        Ok(Self::new(users, store.clone(), store, notifier)
            .with_ranker(Ranker::new(settings.scoring.weights))
            .with_settings(settings.matching.clone()))
    }

    /// One ranked page of candidates for the requester
    pub async fn get_discovery_feed(&self, request: &FeedRequest) -> Result<FeedPage, MatchError> {
        request.validate()?;

        let requester = self.load_user(&request.requester_id).await?;
        let mode = request.mode.unwrap_or(requester.intent);
        let limit = request.limit.min(self.settings.max_limit);

        let pool = self
            .pool_for(&requester, mode, request.max_distance_km, request.verified_only)
            .await?;

        let ranked = self
            .ranker
            .rank_page(&requester, pool, mode, Utc::now(), request.page, limit);

        tracing::info!(
            "Returning {} feed entries for {} (mode: {}, page: {}, pool: {})",
            ranked.entries.len(),
            requester.id,
            mode,
            request.page,
            ranked.total_candidates
        );

        Ok(FeedPage {
            entries: ranked.entries.into_iter().map(FeedEntry::from).collect(),
            page: request.page,
            limit,
            total_candidates: ranked.total_candidates,
            has_more: ranked.has_more,
        })
    }

    /// Eligible, unranked candidates for a requester
    ///
    /// `mode` defaults to the requester's own intent.
    pub async fn fetch_candidate_pool(
        &self,
        requester_id: &str,
        mode: Option<Intent>,
        max_distance_km: Option<f64>,
        verified_only: bool,
    ) -> Result<Vec<User>, MatchError> {
        let requester = self.load_user(requester_id).await?;
        let mode = mode.unwrap_or(requester.intent);
        self.pool_for(&requester, mode, max_distance_km, verified_only).await
    }

    async fn pool_for(
        &self,
        requester: &User,
        mode: Intent,
        max_distance_km: Option<f64>,
        verified_only: bool,
    ) -> Result<Vec<User>, MatchError> {
        let mut exclude: HashSet<UserId> = self.matches.swiped_target_ids(&requester.id).await?;
        exclude.extend(self.blocks.blocked_ids(&requester.id).await?);

        let max_distance_km = match max_distance_km {
            Some(_) if requester.travel_route.origin().is_none() => {
                tracing::warn!(
                    "Ignoring max distance for {}: no origin to measure from",
                    requester.id
                );
                None
            }
            other => other,
        };

        let query = build_candidate_query(
            requester,
            mode,
            exclude,
            max_distance_km,
            verified_only,
            self.settings.pool_size,
        );

        let mut pool = self.users.query_candidates(&query).await?;

        if let Some(km) = max_distance_km {
            pool.retain(|candidate| within_max_distance(requester, candidate, km));
        }

        tracing::debug!(
            "Candidate pool for {}: {} users ({} excluded)",
            requester.id,
            pool.len(),
            query.exclude_user_ids.len()
        );

        Ok(pool)
    }

    /// Validate and apply a swipe request in wire form
    pub async fn handle_swipe_request(&self, request: &SwipeRequest) -> Result<SwipeOutcome, MatchError> {
        request.validate()?;
        let action = request.parse_action()?;
        self.swipe(&request.actor_id, &request.target_id, action).await
    }

    /// Record a swipe and, for positive actions, run mutual match detection
    ///
    /// Repeating a swipe with the same action is a no-op that re-runs
    /// detection; repeating it with a different action is a `Conflict`.
    pub async fn swipe(
        &self,
        actor_id: &str,
        target_id: &str,
        action: SwipeAction,
    ) -> Result<SwipeOutcome, MatchError> {
        if actor_id == target_id {
            return Err(MatchError::Validation("cannot swipe on yourself".to_string()));
        }

        let actor = self.load_user(actor_id).await?;
        let target = self.load_user(target_id).await?;

        if self.blocks.is_blocked(actor_id, target_id).await? {
            return Err(MatchError::Forbidden(format!(
                "interaction between {} and {} is blocked",
                actor_id, target_id
            )));
        }

        match self.matches.insert_swipe(&Swipe::new(actor_id, target_id, action)).await {
            Ok(()) => {
                tracing::debug!("Recorded {} swipe {} -> {}", action.as_str(), actor_id, target_id);
            }
            Err(StoreError::Duplicate(_)) => {
                let existing = self.matches.find_swipe(actor_id, target_id).await?;
                match existing {
                    Some(existing) if existing.action == action => {
                        tracing::debug!("Repeated {} swipe {} -> {}", action.as_str(), actor_id, target_id);
                    }
                    Some(existing) => {
                        return Err(MatchError::Conflict(format!(
                            "{} already swiped {} on {}",
                            actor_id,
                            existing.action.as_str(),
                            target_id
                        )));
                    }
                    None => {
                        return Err(MatchError::Conflict(format!(
                            "swipe {} -> {} changed concurrently",
                            actor_id, target_id
                        )));
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }

        let detected = if action.is_positive() {
            self.detect_match(&actor, &target).await
        } else {
            None
        };

        // A block recorded after the check above must not leave the pair connected
        match self.blocks.is_blocked(actor_id, target_id).await {
            Ok(true) => {
                let removal = self.matches.remove_pair(&PairKey::new(actor_id, target_id)).await?;
                tracing::warn!(
                    "Block between {} and {} landed mid-swipe (match removed: {}, swipes removed: {})",
                    actor_id,
                    target_id,
                    removal.match_removed,
                    removal.swipes_removed
                );
                return Err(MatchError::Forbidden(format!(
                    "interaction between {} and {} is blocked",
                    actor_id, target_id
                )));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Block re-check failed for {} -> {}: {}", actor_id, target_id, e);
            }
        }

        let Some((record, created)) = detected else {
            return Ok(SwipeOutcome::no_match());
        };

        if created {
            self.announce(&record, &actor, &target).await;
        }

        Ok(SwipeOutcome::matched(MatchSummary {
            id: record.id,
            conversation_id: record.conversation_id,
            other_user: UserSummary::from(&target),
        }))
    }

    /// The swipe is already durable here; failures are logged, never surfaced
    ///
    /// Yields the pair's match and whether this call created it.
    async fn detect_match(&self, actor: &User, target: &User) -> Option<(MatchRecord, bool)> {
        match self.materialize_match(actor, target).await {
            Ok(detected) => detected,
            Err(e) => {
                tracing::error!(
                    "Match creation failed for {} and {}, swipe kept: {}",
                    actor.id,
                    target.id,
                    e
                );
                None
            }
        }
    }

    async fn materialize_match(
        &self,
        actor: &User,
        target: &User,
    ) -> Result<Option<(MatchRecord, bool)>, StoreError> {
        let reciprocal = self.matches.find_swipe(&target.id, &actor.id).await?;
        if !reciprocal.map_or(false, |swipe| swipe.action.is_positive()) {
            return Ok(None);
        }

        let pair = PairKey::new(&actor.id, &target.id);

        match self.matches.create_match(&pair, &actor.id).await {
            Ok(record) => {
                tracing::info!("Created match {} for pair {}", record.id, pair);
                Ok(Some((record, true)))
            }
            Err(StoreError::Duplicate(_)) => {
                tracing::debug!("Pair {} already matched, returning existing match", pair);
                let record = self
                    .matches
                    .find_match(&pair)
                    .await?
                    .ok_or_else(|| StoreError::NotFound(format!("match {}", pair)))?;
                Ok(Some((record, false)))
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort notification of both users plus a realtime push to the counterpart
    async fn announce(&self, record: &MatchRecord, actor: &User, target: &User) {
        let for_actor = notification(record, target);
        let for_target = notification(record, actor);

        if let Err(e) = self.notifier.notify_match(&actor.id, &for_actor).await {
            tracing::warn!("Failed to notify {} of match {}: {}", actor.id, record.id, e);
        }
        if let Err(e) = self.notifier.notify_match(&target.id, &for_target).await {
            tracing::warn!("Failed to notify {} of match {}: {}", target.id, record.id, e);
        }

        let payload = json!({
            "matchId": record.id,
            "conversationId": record.conversation_id,
            "user": UserSummary::from(actor),
        });
        if let Err(e) = self.notifier.push_to_user(&target.id, MATCH_EVENT, payload).await {
            tracing::warn!("Failed to push {} to {}: {}", MATCH_EVENT, target.id, e);
        }
    }

    /// A user's matches, newest first
    pub async fn get_matches(&self, user_id: &str) -> Result<Vec<MatchListing>, MatchError> {
        self.load_user(user_id).await?;

        let records = self.matches.matches_for_user(user_id).await?;
        let mut listings = Vec::with_capacity(records.len());

        for record in records {
            let Some(other_id) = record.other_party(user_id) else {
                continue;
            };

            match self.users.get_user(other_id).await? {
                Some(other) => listings.push(MatchListing {
                    match_id: record.id,
                    matched_user: UserSummary::from(&other),
                    conversation_id: record.conversation_id,
                    created_at: record.created_at,
                }),
                None => {
                    tracing::warn!("Skipping match {}: user {} no longer exists", record.id, other_id);
                }
            }
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    /// Record a block and remove everything the pair shared
    pub async fn block(&self, blocker_id: &str, blocked_id: &str) -> Result<PairRemoval, MatchError> {
        if blocker_id == blocked_id {
            return Err(MatchError::Validation("cannot block yourself".to_string()));
        }

        self.blocks.record_block(blocker_id, blocked_id).await?;
        let removal = self.matches.remove_pair(&PairKey::new(blocker_id, blocked_id)).await?;

        tracing::info!(
            "{} blocked {} (match removed: {}, swipes removed: {})",
            blocker_id,
            blocked_id,
            removal.match_removed,
            removal.swipes_removed
        );

        Ok(removal)
    }

    pub async fn health(&self) -> HealthResponse {
        let status = match self.matches.health_check().await {
            Ok(true) => "healthy",
            Ok(false) => "degraded",
            Err(e) => {
                tracing::error!("Store health check failed: {}", e);
                "unhealthy"
            }
        };

        HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }

    async fn load_user(&self, user_id: &str) -> Result<User, MatchError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| MatchError::NotFound(format!("user {}", user_id)))
    }
}

fn notification(record: &MatchRecord, matched_user: &User) -> MatchNotification {
    MatchNotification {
        match_id: record.id,
        conversation_id: record.conversation_id,
        matched_user_id: matched_user.id.clone(),
        matched_user_name: matched_user.display_name.clone(),
    }
}
