use serde::{Deserialize, Serialize};
use std::fmt;

/// Unordered user pair stored as `(min, max)` so both swipe orders share one key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    user1: String,
    user2: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (user1, user2) = if a <= b { (a, b) } else { (b, a) };
        Self {
            user1: user1.to_string(),
            user2: user2.to_string(),
        }
    }

    pub fn user1(&self) -> &str {
        &self.user1
    }

    pub fn user2(&self) -> &str {
        &self.user2
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user1, self.user2)
    }
}
