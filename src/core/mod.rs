// Core engine exports
pub mod attributes;
pub mod distance;
pub mod filters;
pub mod ledger;
pub mod lifecycle;
pub mod recommender;
pub mod scoring;

pub use attributes::{age_on, common_interest_names, days_since};
pub use distance::{haversine_miles, profile_distance_miles};
pub use filters::{candidate_filter, is_eligible, matches_demographics, Exclusions};
pub use ledger::{record_interaction, InteractionOutcome, PairProfiles};
pub use recommender::{bonus_points, recommendation_reasons, RecommendationResult, Recommender};
pub use scoring::{CompatibilityScorer, NEUTRAL_SCORE};
