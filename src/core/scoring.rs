use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};
use crate::models::{Intent, ModeWeights, Rig, ScoreBreakdown, ScoringWeights, TravelRoute, TrustSignals, User};
use crate::core::distance::optional_distance;

/// Destinations this close share a route completely
const ROUTE_FULL_KM: f64 = 50.0;
/// Destinations this far apart share nothing
const ROUTE_ZERO_KM: f64 = 1000.0;
/// Points lost per km when falling back to origin points
const ROUTE_FALLBACK_KM_PER_POINT: f64 = 10.0;

const PROXIMITY_FULL_KM: f64 = 10.0;
const PROXIMITY_ZERO_KM: f64 = 500.0;

/// Score for trips that touch but do not overlap
const TEMPORAL_ADJACENT_SCORE: f64 = 40.0;
/// Gap at which non-overlapping trips stop scoring
const TEMPORAL_ZERO_GAP_DAYS: f64 = 7.0;

const HOBBY_JACCARD_POINTS: f64 = 70.0;
const HOBBY_POINTS_PER_SHARED: f64 = 10.0;
const HOBBY_SHARED_CAP: f64 = 30.0;

const TRUST_POINTS_PER_LEVEL: f64 = 20.0;
const TRUST_LEGACY_VERIFIED: f64 = 40.0;
const TRUST_POINTS_PER_VOUCH: f64 = 10.0;
const TRUST_VOUCH_CAP: f64 = 40.0;
const TRUST_TENURE_CAP_MONTHS: i64 = 10;

const RIG_BASE: f64 = 50.0;
const RIG_TYPE_BONUS: f64 = 20.0;
const RIG_CREW_BONUS: f64 = 20.0;
const RIG_PETS_BONUS: f64 = 10.0;

/// Compatibility scorer for (requester, candidate) pairs
///
/// Scoring never fails: a missing or unusable input drops the affected
/// dimension to 0 and every other dimension is still computed.
///
/// composite = round(
///     route_overlap     * w.route_overlap +
///     temporal_overlap  * w.temporal_overlap +
///     hobby_match       * w.hobby_match +
///     proximity         * w.proximity +
///     trust             * w.trust +           # candidate only
///     rig_compatibility * w.rig_compatibility
/// )
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer {
    weights: ModeWeights,
}

impl CompatibilityScorer {
    pub fn new(weights: ModeWeights) -> Self {
        Self { weights }
    }

    /// Score one candidate for a requester in the given mode
    ///
    /// `now` anchors the account-age bonus so the result is reproducible.
    pub fn score(
        &self,
        requester: &User,
        candidate: &User,
        mode: Intent,
        now: DateTime<Utc>,
    ) -> (u8, ScoreBreakdown) {
        let breakdown = score_breakdown(requester, candidate, now);
        let composite = composite_score(&breakdown, self.weights.for_mode(mode));
        (composite, breakdown)
    }
}

/// Compute all six sub-scores for a pair
pub fn score_breakdown(requester: &User, candidate: &User, now: DateTime<Utc>) -> ScoreBreakdown {
    ScoreBreakdown {
        route_overlap: route_overlap_score(&requester.travel_route, &candidate.travel_route),
        temporal_overlap: temporal_overlap_score(&requester.travel_route, &candidate.travel_route),
        hobby_match: hobby_match_score(&requester.hobbies, &candidate.hobbies),
        proximity: proximity_score(&requester.travel_route, &candidate.travel_route),
        trust: trust_score(&candidate.trust, now),
        rig_compatibility: rig_compatibility_score(requester.rig.as_ref(), candidate.rig.as_ref()),
    }
}

/// Weighted composite, rounded to the nearest integer in [0, 100]
pub fn composite_score(breakdown: &ScoreBreakdown, weights: &ScoringWeights) -> u8 {
    clamp_score(weights.apply(breakdown)).round() as u8
}

/// Destination-to-destination distance, falling back to origins
pub fn route_overlap_score(requester: &TravelRoute, candidate: &TravelRoute) -> f64 {
    if let Some(km) = optional_distance(requester.destination(), candidate.destination()) {
        return linear_decay(km, ROUTE_FULL_KM, ROUTE_ZERO_KM);
    }

    match optional_distance(requester.origin(), candidate.origin()) {
        Some(km) => clamp_score(100.0 - km / ROUTE_FALLBACK_KM_PER_POINT),
        None => 0.0,
    }
}

/// Overlap of the two trips as half-open day intervals
pub fn temporal_overlap_score(requester: &TravelRoute, candidate: &TravelRoute) -> f64 {
    let (Some((start_a, end_a)), Some((start_b, end_b))) =
        (requester.trip_window(), candidate.trip_window())
    else {
        return 0.0;
    };

    let overlap_days = (end_a.min(end_b) - start_a.max(start_b)).num_days();

    if overlap_days > 0 {
        let shorter_days = (end_a - start_a).num_days().min((end_b - start_b).num_days());
        if shorter_days <= 0 {
            return 0.0;
        }
        let ratio = (overlap_days as f64 / shorter_days as f64).min(1.0);
        return clamp_score(100.0 * ratio);
    }

    // Non-positive overlap is the gap between the trips, negated
    let gap_days = -overlap_days as f64;
    clamp_score(TEMPORAL_ADJACENT_SCORE * (1.0 - gap_days / TEMPORAL_ZERO_GAP_DAYS))
}

/// Jaccard similarity scaled to 70 plus 10 per shared hobby (capped at 30)
pub fn hobby_match_score(requester: &BTreeSet<String>, candidate: &BTreeSet<String>) -> f64 {
    let a = normalize_hobbies(requester);
    let b = normalize_hobbies(candidate);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let shared = a.intersection(&b).count() as f64;
    let union = a.union(&b).count() as f64;

    let jaccard_points = shared / union * HOBBY_JACCARD_POINTS;
    let shared_points = (shared * HOBBY_POINTS_PER_SHARED).min(HOBBY_SHARED_CAP);

    clamp_score(jaccard_points + shared_points)
}

/// Hobbies both users list, normalized and sorted
pub fn shared_hobbies(requester: &BTreeSet<String>, candidate: &BTreeSet<String>) -> Vec<String> {
    let a = normalize_hobbies(requester);
    let b = normalize_hobbies(candidate);

    a.intersection(&b)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Origin-to-origin distance
pub fn proximity_score(requester: &TravelRoute, candidate: &TravelRoute) -> f64 {
    optional_distance(requester.origin(), candidate.origin())
        .map_or(0.0, |km| linear_decay(km, PROXIMITY_FULL_KM, PROXIMITY_ZERO_KM))
}

/// Trust of the candidate alone
///
/// The verification level wins when set; otherwise the legacy flag and
/// vouches are used. Account age adds a point per month, up to 10.
pub fn trust_score(trust: &TrustSignals, now: DateTime<Utc>) -> f64 {
    let base = if trust.verification_level > 0 {
        let level = trust.verification_level.min(TrustSignals::MAX_VERIFICATION_LEVEL);
        f64::from(level) * TRUST_POINTS_PER_LEVEL
    } else {
        let verified = if trust.verified { TRUST_LEGACY_VERIFIED } else { 0.0 };
        let vouches = (f64::from(trust.vouch_count) * TRUST_POINTS_PER_VOUCH).min(TRUST_VOUCH_CAP);
        verified + vouches
    };

    let tenure_months = trust
        .member_since
        .map(|since| ((now - since).num_days() / 30).clamp(0, TRUST_TENURE_CAP_MONTHS))
        .unwrap_or(0);

    clamp_score(base + tenure_months as f64)
}

pub fn rig_compatibility_score(requester: Option<&Rig>, candidate: Option<&Rig>) -> f64 {
    let (Some(a), Some(b)) = (requester, candidate) else {
        return 0.0;
    };

    let mut score = RIG_BASE;

    if a.rig_type == b.rig_type {
        score += RIG_TYPE_BONUS;
    }
    if a.crew_type == b.crew_type {
        score += RIG_CREW_BONUS;
    }
    match (a.pet_friendly, b.pet_friendly) {
        (true, true) => score += RIG_PETS_BONUS,
        (true, false) | (false, true) => score -= RIG_PETS_BONUS,
        (false, false) => {}
    }

    clamp_score(score)
}

/// 100 up to `full_at`, 0 from `zero_at`, linear in between
#[inline]
fn linear_decay(distance_km: f64, full_at: f64, zero_at: f64) -> f64 {
    if !distance_km.is_finite() {
        return 0.0;
    }
    if distance_km <= full_at {
        return 100.0;
    }
    if distance_km >= zero_at {
        return 0.0;
    }
    clamp_score(100.0 * (zero_at - distance_km) / (zero_at - full_at))
}

#[inline]
fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn normalize_hobbies(hobbies: &BTreeSet<String>) -> HashSet<String> {
    hobbies
        .iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrewType, GeoPoint, RigType};
    use chrono::{Duration, NaiveDate};

    fn hobbies(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn route_to(lat: f64, lon: f64) -> TravelRoute {
        TravelRoute {
            destination: Some(GeoPoint::new(lat, lon)),
            ..Default::default()
        }
    }

    fn trip(start: (i32, u32, u32), days: u32) -> TravelRoute {
        TravelRoute {
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2),
            duration_days: Some(days),
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_decay() {
        assert_eq!(linear_decay(10.0, 50.0, 1000.0), 100.0);
        assert_eq!(linear_decay(1000.0, 50.0, 1000.0), 0.0);
        assert!((linear_decay(525.0, 50.0, 1000.0) - 50.0).abs() < 1e-9);
        assert_eq!(linear_decay(f64::NAN, 50.0, 1000.0), 0.0);
    }

    #[test]
    fn test_route_overlap_close_destinations() {
        let score = route_overlap_score(&route_to(34.05, -118.24), &route_to(34.10, -118.30));
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_route_overlap_far_destinations() {
        // Los Angeles to New York
        let score = route_overlap_score(&route_to(34.05, -118.24), &route_to(40.71, -74.00));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_route_overlap_ignores_invalid_destination() {
        let here = TravelRoute {
            origin: Some(GeoPoint::new(40.7128, -74.0060)),
            destination: Some(GeoPoint::new(34.05, -118.24)),
            ..Default::default()
        };
        let broken = TravelRoute {
            origin: Some(GeoPoint::new(40.7128, -74.0060)),
            destination: Some(GeoPoint::new(95.0, -118.24)),
            ..Default::default()
        };
        assert!((route_overlap_score(&here, &broken) - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_route_overlap_falls_back_to_origins() {
        let a = TravelRoute {
            origin: Some(GeoPoint::new(40.7128, -74.0060)),
            ..Default::default()
        };
        let b = TravelRoute {
            origin: Some(GeoPoint::new(40.7128, -74.0060)),
            destination: Some(GeoPoint::new(51.5, -0.12)),
            ..Default::default()
        };
        assert!((route_overlap_score(&a, &b) - 100.0).abs() < 0.01);

        // London to Paris is ~344km, so the lenient fallback gives ~65.6
        let london = TravelRoute { origin: Some(GeoPoint::new(51.5074, -0.1278)), ..Default::default() };
        let paris = TravelRoute { origin: Some(GeoPoint::new(48.8566, 2.3522)), ..Default::default() };
        let fallback = route_overlap_score(&london, &paris);
        assert!(fallback > 60.0 && fallback < 70.0, "got {}", fallback);

        assert_eq!(route_overlap_score(&TravelRoute::default(), &TravelRoute::default()), 0.0);
    }

    #[test]
    fn test_temporal_overlap_full() {
        // Short trip entirely inside the long one
        let long = trip((2025, 6, 1), 20);
        let short = trip((2025, 6, 5), 3);
        assert_eq!(temporal_overlap_score(&long, &short), 100.0);
    }

    #[test]
    fn test_temporal_overlap_partial() {
        // June 1-10 and June 6-15 share 5 of 10 days
        let a = trip((2025, 6, 1), 10);
        let b = trip((2025, 6, 6), 10);
        assert!((temporal_overlap_score(&a, &b) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_gap_decay() {
        let a = trip((2025, 6, 1), 5);
        // Adjacent: b starts the day a ends
        assert_eq!(temporal_overlap_score(&a, &trip((2025, 6, 6), 5)), 40.0);
        // Gap of 7 days or more
        assert_eq!(temporal_overlap_score(&a, &trip((2025, 6, 13), 5)), 0.0);
        let mid = temporal_overlap_score(&a, &trip((2025, 6, 9), 5));
        assert!(mid > 0.0 && mid < 40.0);
    }

    #[test]
    fn test_temporal_missing_dates() {
        let a = trip((2025, 6, 1), 5);
        let no_duration = TravelRoute {
            duration_days: None,
            ..trip((2025, 6, 1), 5)
        };
        assert_eq!(temporal_overlap_score(&a, &no_duration), 0.0);
        assert_eq!(temporal_overlap_score(&a, &TravelRoute::default()), 0.0);
    }

    #[test]
    fn test_hobby_match_example() {
        let score = hobby_match_score(&hobbies(&["hiking", "photography"]), &hobbies(&["hiking", "yoga"]));
        // 1/3 * 70 + 10
        assert!((score - 33.333).abs() < 0.01, "got {}", score);
    }

    #[test]
    fn test_hobby_match_normalizes() {
        let score = hobby_match_score(&hobbies(&["  Hiking "]), &hobbies(&["hiking"]));
        assert_eq!(score, 80.0);
        assert_eq!(shared_hobbies(&hobbies(&["Yoga", "Surf"]), &hobbies(&["surf", "yoga "])), vec!["surf", "yoga"]);
    }

    #[test]
    fn test_hobby_match_empty() {
        assert_eq!(hobby_match_score(&hobbies(&[]), &hobbies(&["hiking"])), 0.0);
        assert_eq!(hobby_match_score(&hobbies(&["  "]), &hobbies(&["hiking"])), 0.0);
    }

    #[test]
    fn test_hobby_match_capped() {
        let all = hobbies(&["a", "b", "c", "d", "e"]);
        assert_eq!(hobby_match_score(&all, &all), 100.0);
    }

    #[test]
    fn test_proximity() {
        let here = TravelRoute { origin: Some(GeoPoint::new(40.7128, -74.0060)), ..Default::default() };
        let near = TravelRoute { origin: Some(GeoPoint::new(40.72, -74.01)), ..Default::default() };
        let far = TravelRoute { origin: Some(GeoPoint::new(34.05, -118.24)), ..Default::default() };
        assert_eq!(proximity_score(&here, &near), 100.0);
        assert_eq!(proximity_score(&here, &far), 0.0);
        assert_eq!(proximity_score(&here, &TravelRoute::default()), 0.0);
    }

    #[test]
    fn test_trust_levels() {
        let now = Utc::now();
        let level = |l: u8| TrustSignals { verification_level: l, ..Default::default() };
        assert_eq!(trust_score(&level(3), now), 60.0);
        assert_eq!(trust_score(&level(5), now), 100.0);
        // Out-of-range levels are capped
        assert_eq!(trust_score(&level(9), now), 100.0);
    }

    #[test]
    fn test_trust_legacy_signals() {
        let now = Utc::now();
        let legacy = TrustSignals {
            verified: true,
            vouch_count: 5,
            ..Default::default()
        };
        assert_eq!(trust_score(&legacy, now), 80.0);

        let vouches_only = TrustSignals { vouch_count: 2, ..Default::default() };
        assert_eq!(trust_score(&vouches_only, now), 20.0);
    }

    #[test]
    fn test_trust_tenure_bonus() {
        let now = Utc::now();
        let veteran = TrustSignals {
            member_since: Some(now - Duration::days(365 * 3)),
            ..Default::default()
        };
        assert_eq!(trust_score(&veteran, now), 10.0);

        let newcomer = TrustSignals {
            member_since: Some(now - Duration::days(65)),
            ..Default::default()
        };
        assert_eq!(trust_score(&newcomer, now), 2.0);

        let future = TrustSignals {
            member_since: Some(now + Duration::days(60)),
            ..Default::default()
        };
        assert_eq!(trust_score(&future, now), 0.0);
    }

    #[test]
    fn test_rig_compatibility() {
        let van_solo_pets = Rig { rig_type: RigType::Van, crew_type: CrewType::Solo, pet_friendly: true };
        let van_solo = Rig { pet_friendly: false, ..van_solo_pets };
        let rv_family = Rig { rig_type: RigType::Rv, crew_type: CrewType::Family, pet_friendly: false };

        assert_eq!(rig_compatibility_score(Some(&van_solo_pets), Some(&van_solo_pets)), 100.0);
        assert_eq!(rig_compatibility_score(Some(&van_solo_pets), Some(&van_solo)), 80.0);
        assert_eq!(rig_compatibility_score(Some(&van_solo), Some(&rv_family)), 50.0);
        assert_eq!(rig_compatibility_score(Some(&van_solo_pets), Some(&rv_family)), 40.0);
        assert_eq!(rig_compatibility_score(None, Some(&rv_family)), 0.0);
    }
}
