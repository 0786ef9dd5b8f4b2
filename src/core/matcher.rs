use chrono::{DateTime, Utc};
use crate::models::{Intent, ModeWeights, ScoredCandidate, User};
use crate::core::{
    distance::optional_distance,
    scoring::{shared_hobbies, CompatibilityScorer},
};

/// One page of ranked candidates
#[derive(Debug)]
pub struct RankedPage {
    pub entries: Vec<ScoredCandidate>,
    pub total_candidates: usize,
    pub has_more: bool,
}

/// Ranks a candidate pool for a requester
///
/// # Pipeline Stages
/// 1. Score every pool member with the compatibility scorer
/// 2. Stable sort by composite, descending (ties keep pool order)
/// 3. Slice out the requested page
///
/// Nothing is cached between pages; each call ranks the pool afresh.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    scorer: CompatibilityScorer,
}

impl Ranker {
    pub fn new(weights: ModeWeights) -> Self {
        Self {
            scorer: CompatibilityScorer::new(weights),
        }
    }

    pub fn with_default_weights() -> Self {
        Self::default()
    }

    /// Score and sort the whole pool
    pub fn rank(
        &self,
        requester: &User,
        pool: Vec<User>,
        mode: Intent,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = pool
            .into_iter()
            .map(|candidate| {
                let (compatibility, breakdown) = self.scorer.score(requester, &candidate, mode, now);
                let distance_km = optional_distance(
                    requester.travel_route.origin,
                    candidate.travel_route.origin,
                );
                let shared_hobbies = shared_hobbies(&requester.hobbies, &candidate.hobbies);

                ScoredCandidate {
                    user: candidate,
                    compatibility,
                    breakdown,
                    distance_km,
                    shared_hobbies,
                }
            })
            .collect();

        // sort_by is stable, so equal composites keep their pool order
        scored.sort_by(|a, b| b.compatibility.cmp(&a.compatibility));

        scored
    }

    /// Rank the pool and return page `page` (1-based) of `limit` entries
    pub fn rank_page(
        &self,
        requester: &User,
        pool: Vec<User>,
        mode: Intent,
        now: DateTime<Utc>,
        page: u32,
        limit: u32,
    ) -> RankedPage {
        let total_candidates = pool.len();
        let ranked = self.rank(requester, pool, mode, now);
        let (entries, has_more) = paginate(ranked, page, limit);

        RankedPage {
            entries,
            total_candidates,
            has_more,
        }
    }
}

/// Offset pagination: skip `(page - 1) * limit`, take `limit`
///
/// Page 0 is treated as page 1. Returns whether items remain past the page.
pub fn paginate<T>(items: Vec<T>, page: u32, limit: u32) -> (Vec<T>, bool) {
    let limit = limit as usize;
    let offset = (page.max(1) as usize - 1).saturating_mul(limit);
    let total = items.len();

    let entries: Vec<T> = items.into_iter().skip(offset).take(limit).collect();
    let has_more = offset.saturating_add(entries.len()) < total;

    (entries, has_more)
}
