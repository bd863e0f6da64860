use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::domain::{CriterionValue, PairRecord, Score};

/// Response for a matching run
///
/// `criteria` holds the raw per-criterion maps keyed `"<mentee>-<mentor>"`,
/// `pairs` the aggregated records, and `assignment` the selected pairs in
/// descending score order. All numeric scores are rounded to three decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub criteria: BTreeMap<String, BTreeMap<String, CriterionValue>>,
    pub pairs: Vec<PairRecord>,
    pub assignment: Vec<AssignmentEntry>,
    pub warnings: Vec<String>,
    pub counts: MatchCounts,
}

/// One selected pair in the final assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub pair: String,
    #[serde(rename = "menteeId")]
    pub mentee_id: String,
    #[serde(rename = "mentorId")]
    pub mentor_id: String,
    #[serde(rename = "totalScore")]
    pub total_score: Score,
}

/// Cohort and pair counts for a matching run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCounts {
    pub mentees: usize,
    pub mentors: usize,
    #[serde(rename = "scoredPairs")]
    pub scored_pairs: usize,
    #[serde(rename = "validPairs")]
    pub valid_pairs: usize,
    #[serde(rename = "matchedPairs")]
    pub matched_pairs: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
