use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::models::domain::{Intent, SwipeAction, ParseEnumError};

/// Request for one page of the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "requester_id")]
    pub requester_id: String,
    /// Defaults to the requester's own intent
    #[serde(default)]
    pub mode: Option<Intent>,
    #[validate(range(min = 0.0), custom(function = "validate_finite"))]
    #[serde(default, alias = "max_distance_km")]
    pub max_distance_km: Option<f64>,
    #[serde(default, alias = "verified_only")]
    pub verified_only: bool,
    #[validate(range(min = 1))]
    #[serde(default = "default_page")]
    pub page: u32,
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// `range` lets NaN through, and an infinite radius is no radius
fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("finite"))
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl FeedRequest {
    pub fn new(requester_id: impl Into<String>) -> Self {
        Self {
            requester_id: requester_id.into(),
            mode: None,
            max_distance_km: None,
            verified_only: false,
            page: default_page(),
            limit: default_limit(),
        }
    }

    pub fn with_mode(mut self, mode: Intent) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    pub fn with_max_distance(mut self, km: f64) -> Self {
        self.max_distance_km = Some(km);
        self
    }

    pub fn verified_only(mut self) -> Self {
        self.verified_only = true;
        self
    }
}

/// Request to record a swipe, with the action still in wire form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "actor_id")]
    pub actor_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id")]
    pub target_id: String,
    pub action: String,
}

impl SwipeRequest {
    pub fn parse_action(&self) -> Result<SwipeAction, ParseEnumError> {
        self.action.parse()
    }
}
