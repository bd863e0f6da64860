// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Coordinates, CriteriaScores, CriterionValue, MatchWeights, MenteeProfile, MentorProfile,
    PairKey, PairRecord, Score, ScoreMap,
};
pub use requests::MatchingRequest;
pub use responses::{AssignmentEntry, ErrorResponse, HealthResponse, MatchCounts, MatchingResponse};
