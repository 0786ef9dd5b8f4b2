use std::collections::HashSet;
use crate::models::{CandidateQuery, Intent, User, UserId};
use super::distance::{calculate_bounding_box, is_within_bounding_box, optional_distance};

/// Build the candidate query for a requester
///
/// Age bounds come from the requester's own preferences. A bounding box is
/// only attached when a max distance is requested and the requester has an
/// origin to measure from.
pub fn build_candidate_query(
    requester: &User,
    mode: Intent,
    exclude_user_ids: HashSet<UserId>,
    max_distance_km: Option<f64>,
    verified_only: bool,
    limit: usize,
) -> CandidateQuery {
    let bounding_box = max_distance_km.and_then(|radius| {
        requester
            .travel_route
            .origin()
            .map(|origin| calculate_bounding_box(origin.latitude, origin.longitude, radius))
    });

    CandidateQuery {
        requester_id: requester.id.clone(),
        mode,
        exclude_user_ids,
        min_age: requester.preferences.min_age,
        max_age: requester.preferences.max_age,
        bounding_box,
        verified_only,
        limit,
    }
}

/// Check if a user passes every hard filter of the candidate query
///
/// Mirrors the WHERE clause of the PostgreSQL candidate query so the
/// in-memory directory returns the same pool.
#[inline]
pub fn matches_query_constraints(candidate: &User, query: &CandidateQuery) -> bool {
    if candidate.id == query.requester_id || query.exclude_user_ids.contains(&candidate.id) {
        return false;
    }

    if !candidate.active || !candidate.discoverable {
        return false;
    }

    if !query.mode.accepts(candidate.intent) {
        return false;
    }

    if !within_age_bounds(candidate.age, query.min_age, query.max_age) {
        return false;
    }

    if query.verified_only && !candidate.trust.is_verified() {
        return false;
    }

    if let Some(bbox) = &query.bounding_box {
        match candidate.travel_route.origin() {
            Some(origin) => {
                if !is_within_bounding_box(origin.latitude, origin.longitude, bbox) {
                    return false;
                }
            }
            None => return false,
        }
    }

    true
}

/// Unknown ages only pass when no bound is set
#[inline]
pub fn within_age_bounds(age: Option<u8>, min_age: Option<u8>, max_age: Option<u8>) -> bool {
    if min_age.is_none() && max_age.is_none() {
        return true;
    }

    match age {
        Some(age) => {
            min_age.map_or(true, |min| age >= min) && max_age.map_or(true, |max| age <= max)
        }
        None => false,
    }
}

/// Exact distance check applied after the bounding-box pre-filter
///
/// Returns false for candidates without a usable origin.
#[inline]
pub fn within_max_distance(requester: &User, candidate: &User, max_distance_km: f64) -> bool {
    optional_distance(requester.travel_route.origin(), candidate.travel_route.origin())
        .map_or(false, |km| km <= max_distance_km)
}
