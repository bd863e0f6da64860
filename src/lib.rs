//! Mentora Algo - mentor-mentee matching service for the Mentora program
//!
//! This library scores every mentee-mentor pair across several criteria,
//! combines the criterion maps into weighted pair records, and solves the
//! one-to-one assignment that the HTTP layer exposes.

pub mod config;
pub mod core;
pub mod criteria;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{aggregate, solve, MatchEngine, MatchError, MatchOutcome, Overrides};
pub use crate::models::{
    CriteriaScores, CriterionValue, MatchWeights, MatchingRequest, MatchingResponse,
    MenteeProfile, MentorProfile, PairKey, PairRecord, Score,
};
