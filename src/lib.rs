//! Wayfarer Match - matching core for a travel-aware social platform
//!
//! Ranks nearby travellers for a discovery feed using a six-dimension
//! compatibility score, records swipes, and turns two reciprocal positive
//! swipes into exactly one match and conversation.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod services;
pub mod telemetry;

// Re-export commonly used types
pub use core::{CompatibilityScorer, PairKey, Ranker, distance::{haversine_distance, calculate_bounding_box}};
pub use error::{MatchError, StartupError};
pub use models::{FeedPage, FeedRequest, Intent, ScoringWeights, SwipeAction, SwipeOutcome, SwipeRequest, User};
pub use services::{MatchingService, MemoryStore, PostgresStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let bbox = calculate_bounding_box(40.7128, -74.0060, 10.0);
        assert!(bbox.min_lat < 40.7128);
        assert_eq!(PairKey::new("b", "a").user1(), "a");
    }
}
