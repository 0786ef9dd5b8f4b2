// Unit tests for Wayfarer Match

use wayfarer_match::core::{
    distance::{haversine_distance, calculate_bounding_box, is_within_bounding_box},
    paginate,
    scoring::{
        hobby_match_score, proximity_score, route_overlap_score, score_breakdown,
        temporal_overlap_score, trust_score,
    },
    CompatibilityScorer, PairKey,
};
use wayfarer_match::models::{
    CrewType, GeoPoint, Intent, ModeWeights, Rig, RigType, ScoringWeights, TravelRoute,
    TrustSignals, User,
};
use chrono::{Duration, NaiveDate, Utc};
use std::collections::BTreeSet;

fn hobbies(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|h| h.to_string()).collect()
}

fn bare_user(id: &str) -> User {
    User {
        id: id.to_string(),
        display_name: String::new(),
        active: true,
        discoverable: true,
        intent: Intent::Both,
        age: None,
        hobbies: BTreeSet::new(),
        rig: None,
        travel_route: TravelRoute::default(),
        trust: TrustSignals::default(),
        preferences: Default::default(),
    }
}

fn full_user(id: &str, lat: f64, lon: f64) -> User {
    User {
        hobbies: hobbies(&["hiking", "climbing", "surfing"]),
        rig: Some(Rig {
            rig_type: RigType::Van,
            crew_type: CrewType::Couple,
            pet_friendly: true,
        }),
        travel_route: TravelRoute {
            origin: Some(GeoPoint::new(lat, lon)),
            destination: Some(GeoPoint::new(lat + 0.5, lon + 0.5)),
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            duration_days: Some(14),
        },
        trust: TrustSignals {
            verification_level: 5,
            verified: true,
            vouch_count: 12,
            member_since: Some(Utc::now() - Duration::days(3650)),
        },
        ..bare_user(id)
    }
}

fn destination_route(lat: f64, lon: f64) -> TravelRoute {
    TravelRoute {
        destination: Some(GeoPoint::new(lat, lon)),
        ..Default::default()
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(40.7128, -74.0060, 40.7128, -74.0060);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_la_to_sf() {
    // Los Angeles to San Francisco is roughly 560 km
    let distance = haversine_distance(34.0522, -118.2437, 37.7749, -122.4194);
    assert!(distance > 540.0 && distance < 580.0);
}

#[test]
fn test_point_within_bbox() {
    let bbox = calculate_bounding_box(34.05, -118.24, 25.0);

    assert!(is_within_bounding_box(34.05, -118.24, &bbox));
    assert!(is_within_bounding_box(34.10, -118.30, &bbox));
    assert!(!is_within_bounding_box(37.77, -122.41, &bbox));
}

#[test]
fn test_scores_bounded_with_missing_fields() {
    let now = Utc::now();
    let empty = bare_user("empty");
    let full = full_user("full", 34.05, -118.24);

    for (requester, candidate) in [(&empty, &empty), (&empty, &full), (&full, &empty), (&full, &full)] {
        let breakdown = score_breakdown(requester, candidate, now);
        for value in breakdown.values() {
            assert!((0.0..=100.0).contains(&value), "sub-score out of range: {:?}", breakdown);
        }

        for mode in [Intent::Dating, Intent::Friends, Intent::Both] {
            let (composite, _) = CompatibilityScorer::default().score(requester, candidate, mode, now);
            assert!(composite <= 100);
        }
    }
}

#[test]
fn test_scores_bounded_with_invalid_coordinates() {
    let mut broken = bare_user("broken");
    broken.travel_route = TravelRoute {
        origin: Some(GeoPoint::new(f64::NAN, 500.0)),
        destination: Some(GeoPoint::new(95.0, f64::INFINITY)),
        start_date: None,
        duration_days: Some(3),
    };
    let full = full_user("full", 34.05, -118.24);

    let breakdown = score_breakdown(&broken, &full, Utc::now());
    assert_eq!(breakdown.route_overlap, 0.0);
    assert_eq!(breakdown.proximity, 0.0);
    assert_eq!(breakdown.temporal_overlap, 0.0);
}

#[test]
fn test_route_overlap_thresholds() {
    let here = destination_route(34.05, -118.24);

    // ~7 km apart
    assert_eq!(route_overlap_score(&here, &destination_route(34.10, -118.30)), 100.0);
    // ~3900 km apart
    assert_eq!(route_overlap_score(&here, &destination_route(40.71, -74.00)), 0.0);
}

#[test]
fn test_route_overlap_monotonic() {
    let here = destination_route(0.0, 0.0);
    let mut previous = f64::MAX;

    // Walk east along the equator from 0 to ~1200 km
    for step in 0..=110 {
        let lon = step as f64 * 0.1;
        let score = route_overlap_score(&here, &destination_route(0.0, lon));
        assert!(score <= previous, "score rose at lon {}: {} > {}", lon, score, previous);
        previous = score;
    }
    assert_eq!(previous, 0.0);
}

#[test]
fn test_route_overlap_falls_back_to_origins() {
    let a = TravelRoute {
        origin: Some(GeoPoint::new(0.0, 0.0)),
        ..Default::default()
    };
    // ~111 km east on the equator
    let b = TravelRoute {
        origin: Some(GeoPoint::new(0.0, 1.0)),
        ..Default::default()
    };

    let score = route_overlap_score(&a, &b);
    assert!((score - 88.9).abs() < 0.5, "got {}", score);
}

#[test]
fn test_temporal_overlap_half_open() {
    let trip = |day: u32, days: u32| TravelRoute {
        start_date: NaiveDate::from_ymd_opt(2025, 7, day),
        duration_days: Some(days),
        ..Default::default()
    };

    // Back-to-back trips share no day
    assert_eq!(temporal_overlap_score(&trip(1, 5), &trip(6, 5)), 40.0);
    // A short trip inside a long one fully overlaps
    assert_eq!(temporal_overlap_score(&trip(1, 20), &trip(5, 3)), 100.0);
    // A week apart or more scores nothing
    assert_eq!(temporal_overlap_score(&trip(1, 2), &trip(10, 2)), 0.0);
}

#[test]
fn test_hobby_match_empty_sets() {
    assert_eq!(hobby_match_score(&BTreeSet::new(), &hobbies(&["hiking"])), 0.0);
    assert_eq!(hobby_match_score(&hobbies(&["hiking"]), &BTreeSet::new()), 0.0);
    assert_eq!(hobby_match_score(&hobbies(&["  "]), &hobbies(&["hiking"])), 0.0);
}

#[test]
fn test_hobby_match_grows_with_overlap() {
    let mine = hobbies(&["hiking", "climbing", "surfing", "yoga"]);

    let one = hobby_match_score(&mine, &hobbies(&["hiking", "chess", "golf", "poker"]));
    let two = hobby_match_score(&mine, &hobbies(&["hiking", "climbing", "golf", "poker"]));
    let all = hobby_match_score(&mine, &hobbies(&["Hiking", "CLIMBING ", "surfing", "yoga"]));

    assert!(one < two);
    assert!(two < all);
    assert_eq!(all, 100.0);
}

#[test]
fn test_proximity_requires_both_origins() {
    let a = TravelRoute {
        origin: Some(GeoPoint::new(34.05, -118.24)),
        ..Default::default()
    };
    assert_eq!(proximity_score(&a, &TravelRoute::default()), 0.0);
    assert_eq!(proximity_score(&a, &a), 100.0);
}

#[test]
fn test_trust_tenure_bonus_capped() {
    let now = Utc::now();
    let veteran = TrustSignals {
        verification_level: 3,
        member_since: Some(now - Duration::days(3650)),
        ..Default::default()
    };
    let newcomer = TrustSignals {
        verification_level: 3,
        member_since: Some(now - Duration::days(65)),
        ..Default::default()
    };

    assert_eq!(trust_score(&veteran, now), 70.0);
    assert_eq!(trust_score(&newcomer, now), 62.0);
}

#[test]
fn test_friends_mode_worked_example() {
    let now = Utc::now();

    let mut requester = bare_user("requester");
    requester.travel_route = destination_route(34.05, -118.24);
    requester.hobbies = hobbies(&["hiking", "photography"]);

    let mut candidate = bare_user("candidate");
    candidate.travel_route = destination_route(34.10, -118.30);
    candidate.hobbies = hobbies(&["hiking", "yoga"]);
    candidate.trust = TrustSignals {
        verification_level: 0,
        verified: true,
        vouch_count: 5,
        member_since: None,
    };

    let (composite, breakdown) =
        CompatibilityScorer::default().score(&requester, &candidate, Intent::Friends, now);

    assert_eq!(breakdown.route_overlap, 100.0);
    assert!((breakdown.hobby_match - (70.0 / 3.0 + 10.0)).abs() < 1e-9);
    assert_eq!(breakdown.trust, 80.0);
    assert_eq!(breakdown.proximity, 0.0);
    assert_eq!(breakdown.temporal_overlap, 0.0);
    assert_eq!(breakdown.rig_compatibility, 0.0);

    // 100*0.15 + 33.33*0.35 + 80*0.10
    let expected = ScoringWeights::FRIENDS.apply(&breakdown).round() as u8;
    assert_eq!(composite, expected);
    assert_eq!(composite, 35);
}

#[test]
fn test_mode_weights_shift_ranking() {
    let now = Utc::now();
    let requester = User {
        hobbies: hobbies(&["hiking", "climbing", "surfing"]),
        ..bare_user("requester")
    };

    let hobbyist = User {
        hobbies: hobbies(&["hiking", "climbing", "surfing"]),
        ..bare_user("hobbyist")
    };
    let trusted = User {
        trust: TrustSignals {
            verification_level: 5,
            ..Default::default()
        },
        ..bare_user("trusted")
    };

    let scorer = CompatibilityScorer::new(ModeWeights::default());
    let (hobbyist_friends, _) = scorer.score(&requester, &hobbyist, Intent::Friends, now);
    let (trusted_friends, _) = scorer.score(&requester, &trusted, Intent::Friends, now);
    let (hobbyist_dating, _) = scorer.score(&requester, &hobbyist, Intent::Dating, now);
    let (trusted_dating, _) = scorer.score(&requester, &trusted, Intent::Dating, now);

    assert!(hobbyist_friends > trusted_friends);
    assert!(trusted_dating > hobbyist_dating);
}

#[test]
fn test_default_weights_sum_to_one() {
    for weights in [ScoringWeights::DATING, ScoringWeights::FRIENDS, ScoringWeights::BOTH] {
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_pair_key_is_order_independent() {
    assert_eq!(PairKey::new("zoe", "adam"), PairKey::new("adam", "zoe"));
    assert_eq!(PairKey::new("zoe", "adam").user1(), "adam");
}

#[test]
fn test_paginate_offsets() {
    let items: Vec<u32> = (1..=25).collect();

    let (first, more) = paginate(items.clone(), 1, 10);
    assert_eq!(first, (1..=10).collect::<Vec<_>>());
    assert!(more);

    let (last, more) = paginate(items.clone(), 3, 10);
    assert_eq!(last, (21..=25).collect::<Vec<_>>());
    assert!(!more);

    let (beyond, more) = paginate(items, 4, 10);
    assert!(beyond.is_empty());
    assert!(!more);
}
