// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    pair_key, AgeRange, Candidate, CandidateFilter, Conversation, Coordinates, Diet, Drinking,
    Education, Exercise, Gender, Interaction, InteractionAction, Interest, Lifestyle, Location,
    MatchPreferences, MatchSource, Pairing, PairingMetadata, PairingStatus, Photo, Profile,
    ProfileCard, ProfileCounter, ProfileStats, ScoringWeights, Smoking, VirtualDate,
    VirtualDateStatus,
};
pub use requests::{
    BlockRequest, ListMatchesQuery, RecommendationsQuery, ScheduleDateRequest, SwipeRequest,
    VirtualDateStatusRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, MatchStats, MatchView, MatchesResponse, Pagination,
    RecommendationsResponse, SwipeResponse,
};
