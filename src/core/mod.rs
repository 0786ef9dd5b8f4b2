// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod matcher;
pub mod pair;
pub mod scoring;

pub use distance::{
    haversine_distance, calculate_bounding_box, is_within_bounding_box, longitude_ranges, optional_distance,
};
pub use filters::{build_candidate_query, matches_query_constraints, within_max_distance};
pub use matcher::{paginate, Ranker, RankedPage};
pub use pair::PairKey;
pub use scoring::{composite_score, score_breakdown, CompatibilityScorer};
