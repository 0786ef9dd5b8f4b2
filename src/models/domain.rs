use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// User identifiers are opaque strings owned by the profile module.
pub type UserId = String;

/// Raised when a string does not name a known enum variant
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// What a user is looking for, also used as the discovery feed mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Friends,
    Dating,
    Both,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Friends => "friends",
            Intent::Dating => "dating",
            Intent::Both => "both",
        }
    }

    /// Whether a candidate with the given intent belongs in a feed of this mode
    #[inline]
    pub fn accepts(self, candidate: Intent) -> bool {
        match self {
            Intent::Both => true,
            mode => candidate == mode || candidate == Intent::Both,
        }
    }

    /// Candidate intents eligible for this mode, `None` when unrestricted
    pub fn eligible_intents(self) -> Option<[Intent; 2]> {
        match self {
            Intent::Both => None,
            mode => Some([mode, Intent::Both]),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friends" => Ok(Intent::Friends),
            "dating" => Ok(Intent::Dating),
            "both" => Ok(Intent::Both),
            _ => Err(ParseEnumError::new("intent", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigType {
    Van,
    Car,
    Truck,
    Rv,
    Trailer,
    Skoolie,
    Other,
}

impl FromStr for RigType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "van" => Ok(RigType::Van),
            "car" => Ok(RigType::Car),
            "truck" => Ok(RigType::Truck),
            "rv" => Ok(RigType::Rv),
            "trailer" => Ok(RigType::Trailer),
            "skoolie" => Ok(RigType::Skoolie),
            "other" => Ok(RigType::Other),
            _ => Err(ParseEnumError::new("rig type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewType {
    Solo,
    Couple,
    Family,
    Group,
}

impl FromStr for CrewType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solo" => Ok(CrewType::Solo),
            "couple" => Ok(CrewType::Couple),
            "family" => Ok(CrewType::Family),
            "group" => Ok(CrewType::Group),
            _ => Err(ParseEnumError::new("crew type", s)),
        }
    }
}

/// The vehicle and travelling party a user lives on the road with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rig {
    pub rig_type: RigType,
    pub crew_type: CrewType,
    #[serde(default)]
    pub pet_friendly: bool,
}

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Finite and within the latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Where a user is now and where they are headed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRoute {
    #[serde(default)]
    pub origin: Option<GeoPoint>,
    #[serde(default)]
    pub destination: Option<GeoPoint>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub duration_days: Option<u32>,
}

impl TravelRoute {
    /// Origin point, if present and usable
    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin.filter(GeoPoint::is_valid)
    }

    /// Destination point, if present and usable
    pub fn destination(&self) -> Option<GeoPoint> {
        self.destination.filter(GeoPoint::is_valid)
    }

    /// Trip as a half-open day interval `[start, start + duration)`
    pub fn trip_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.start_date?;
        let days = self.duration_days.filter(|d| *d > 0)?;
        let end = start.checked_add_days(chrono::Days::new(u64::from(days)))?;
        Some((start, end))
    }
}

/// Signals used to decide how much a profile can be trusted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustSignals {
    /// 0 (none) to 5 (fully verified)
    #[serde(default)]
    pub verification_level: u8,
    /// Legacy single-flag verification, consulted only at level 0
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub vouch_count: u32,
    #[serde(default)]
    pub member_since: Option<DateTime<Utc>>,
}

impl TrustSignals {
    pub const MAX_VERIFICATION_LEVEL: u8 = 5;

    pub fn is_verified(&self) -> bool {
        self.verification_level > 0 || self.verified
    }
}

/// Age bounds the requester wants to see
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryPreferences {
    #[serde(default)]
    pub min_age: Option<u8>,
    #[serde(default)]
    pub max_age: Option<u8>,
}

/// User record as read from the user directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub discoverable: bool,
    pub intent: Intent,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub hobbies: BTreeSet<String>,
    #[serde(default)]
    pub rig: Option<Rig>,
    #[serde(default)]
    pub travel_route: TravelRoute,
    #[serde(default)]
    pub trust: TrustSignals,
    #[serde(default)]
    pub preferences: DiscoveryPreferences,
}

fn default_true() -> bool { true }

/// Public projection of a user returned to other users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub age: Option<u8>,
    pub intent: Intent,
    pub hobbies: BTreeSet<String>,
    pub rig: Option<Rig>,
    pub is_verified: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            age: user.age,
            intent: user.intent,
            hobbies: user.hobbies.clone(),
            rig: user.rig,
            is_verified: user.trust.is_verified(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeAction {
    Like,
    Pass,
    SuperLike,
}

impl SwipeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeAction::Like => "like",
            SwipeAction::Pass => "pass",
            SwipeAction::SuperLike => "super_like",
        }
    }

    /// Like and super-like count toward a mutual match
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, SwipeAction::Like | SwipeAction::SuperLike)
    }
}

impl fmt::Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(SwipeAction::Like),
            "pass" => Ok(SwipeAction::Pass),
            "super_like" => Ok(SwipeAction::SuperLike),
            _ => Err(ParseEnumError::new("swipe action", s)),
        }
    }
}

/// One immutable swipe per ordered (actor, target) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub actor_id: UserId,
    pub target_id: UserId,
    pub action: SwipeAction,
    pub created_at: DateTime<Utc>,
}

impl Swipe {
    pub fn new(actor_id: &str, target_id: &str, action: SwipeAction) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
            action,
            created_at: Utc::now(),
        }
    }
}

/// Durable mutual match, stored under the canonical pair ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: Uuid,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub initiator_id: UserId,
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The member of the pair that is not `user_id`
    pub fn other_party(&self, user_id: &str) -> Option<&str> {
        if self.user1_id == user_id {
            Some(&self.user2_id)
        } else if self.user2_id == user_id {
            Some(&self.user1_id)
        } else {
            None
        }
    }
}

/// Conversation opened when a match is made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub participants: HashSet<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }
}

/// Asymmetric blocker -> blocked relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub blocker_id: UserId,
    pub blocked_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Per-dimension compatibility scores, each in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub route_overlap: f64,
    pub temporal_overlap: f64,
    pub hobby_match: f64,
    pub proximity: f64,
    pub trust: f64,
    pub rig_compatibility: f64,
}

impl ScoreBreakdown {
    pub fn values(&self) -> [f64; 6] {
        [
            self.route_overlap,
            self.temporal_overlap,
            self.hobby_match,
            self.proximity,
            self.trust,
            self.rig_compatibility,
        ]
    }
}

/// Candidate after scoring, before pagination
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub user: User,
    pub compatibility: u8,
    pub breakdown: ScoreBreakdown,
    pub distance_km: Option<f64>,
    pub shared_hobbies: Vec<String>,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Hard filters handed to the user directory when fetching a candidate pool
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub requester_id: UserId,
    pub mode: Intent,
    pub exclude_user_ids: HashSet<UserId>,
    pub min_age: Option<u8>,
    pub max_age: Option<u8>,
    pub bounding_box: Option<BoundingBox>,
    pub verified_only: bool,
    pub limit: usize,
}

/// Weights for one feed mode, summing to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub route_overlap: f64,
    pub temporal_overlap: f64,
    pub hobby_match: f64,
    pub proximity: f64,
    pub trust: f64,
    pub rig_compatibility: f64,
}

impl ScoringWeights {
    pub const DATING: Self = Self {
        route_overlap: 0.20,
        temporal_overlap: 0.20,
        hobby_match: 0.10,
        proximity: 0.10,
        trust: 0.30,
        rig_compatibility: 0.10,
    };

    pub const FRIENDS: Self = Self {
        route_overlap: 0.15,
        temporal_overlap: 0.15,
        hobby_match: 0.35,
        proximity: 0.15,
        trust: 0.10,
        rig_compatibility: 0.10,
    };

    pub const BOTH: Self = Self {
        route_overlap: 0.20,
        temporal_overlap: 0.20,
        hobby_match: 0.20,
        proximity: 0.15,
        trust: 0.15,
        rig_compatibility: 0.10,
    };

    pub fn sum(&self) -> f64 {
        self.route_overlap
            + self.temporal_overlap
            + self.hobby_match
            + self.proximity
            + self.trust
            + self.rig_compatibility
    }

    /// Weighted sum of a breakdown, before rounding
    pub fn apply(&self, breakdown: &ScoreBreakdown) -> f64 {
        breakdown.route_overlap * self.route_overlap
            + breakdown.temporal_overlap * self.temporal_overlap
            + breakdown.hobby_match * self.hobby_match
            + breakdown.proximity * self.proximity
            + breakdown.trust * self.trust
            + breakdown.rig_compatibility * self.rig_compatibility
    }
}

/// One weight vector per feed mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeWeights {
    pub dating: ScoringWeights,
    pub friends: ScoringWeights,
    pub both: ScoringWeights,
}

impl ModeWeights {
    pub fn for_mode(&self, mode: Intent) -> &ScoringWeights {
        match mode {
            Intent::Dating => &self.dating,
            Intent::Friends => &self.friends,
            Intent::Both => &self.both,
        }
    }
}

impl Default for ModeWeights {
    fn default() -> Self {
        Self {
            dating: ScoringWeights::DATING,
            friends: ScoringWeights::FRIENDS,
            both: ScoringWeights::BOTH,
        }
    }
}
