//! HeartConnect match engine
//!
//! Match formation and compatibility scoring for the HeartConnect dating
//! app: a pure scoring and ranking core, the pairing ledger and lifecycle,
//! and the storage and HTTP layers around them.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CompatibilityScorer, Recommender};
pub use error::{MatchError, MatchResult};
pub use models::{Candidate, Pairing, PairingStatus, Profile, ScoringWeights};
pub use services::{MatchService, MatchingOptions};
