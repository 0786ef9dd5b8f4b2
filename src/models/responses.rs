use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::{ScoreBreakdown, ScoredCandidate, UserSummary};

/// One ranked candidate in the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub user: UserSummary,
    #[serde(rename = "distance_km")]
    pub distance_km: Option<f64>,
    pub compatibility: u8,
    pub score_breakdown: ScoreBreakdown,
    pub shared_hobbies: Vec<String>,
}

impl From<ScoredCandidate> for FeedEntry {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            user: UserSummary::from(&candidate.user),
            distance_km: candidate.distance_km,
            compatibility: candidate.compatibility,
            score_breakdown: candidate.breakdown,
            shared_hobbies: candidate.shared_hobbies,
        }
    }
}

/// Page of the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub entries: Vec<FeedEntry>,
    pub page: u32,
    pub limit: u32,
    pub total_candidates: usize,
    pub has_more: bool,
}

/// Match details handed back to the swiping user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub other_user: UserSummary,
}

/// Result of a swipe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeOutcome {
    pub is_match: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchSummary>,
}

impl SwipeOutcome {
    pub fn no_match() -> Self {
        Self {
            is_match: false,
            matched: None,
        }
    }

    pub fn matched(summary: MatchSummary) -> Self {
        Self {
            is_match: true,
            matched: Some(summary),
        }
    }
}

/// Entry in a user's match list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchListing {
    pub match_id: Uuid,
    pub matched_user: UserSummary,
    pub conversation_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Payload delivered to both users when a match is made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchNotification {
    pub match_id: Uuid,
    pub conversation_id: Uuid,
    pub matched_user_id: String,
    pub matched_user_name: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
