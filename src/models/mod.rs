// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Block, BoundingBox, CandidateQuery, Conversation, CrewType, DiscoveryPreferences, GeoPoint,
    Intent, MatchRecord, ModeWeights, ParseEnumError, Rig, RigType, ScoreBreakdown,
    ScoredCandidate, ScoringWeights, Swipe, SwipeAction, TravelRoute, TrustSignals, User, UserId,
    UserSummary,
};
pub use requests::{FeedRequest, SwipeRequest};
pub use responses::{
    ErrorResponse, FeedEntry, FeedPage, HealthResponse, MatchListing, MatchNotification, MatchSummary,
    SwipeOutcome,
};
