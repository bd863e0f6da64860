use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use chrono::Datelike;
use validator::Validate;

use crate::config::Settings;
use crate::core::{MatchEngine, MatchOutcome};
use crate::criteria;
use crate::models::{
    AssignmentEntry, CriteriaScores, ErrorResponse, HealthResponse, MatchCounts, MatchWeights,
    MatchingRequest, MatchingResponse, MenteeProfile, MentorProfile, PairKey, PairRecord,
};
use crate::services::{self, GeocodeClient, RosterError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub geocode: Arc<GeocodeClient>,
}

/// Configure all matching routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matching", web::post().to(run_matching));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Run a matching round
///
/// POST /api/v1/matching
///
/// Request body (all fields optional):
/// ```json
/// {
///   "menteesApplicationCsv": "mentees_application.csv",
///   "importanceModifiers": {"languages": 0.5},
///   "ageMaxDifference": 30,
///   "manualMatches": ["12-7"],
///   "manualNonMatches": ["3-1"]
/// }
/// ```
async fn run_matching(
    state: web::Data<AppState>,
    req: web::Json<MatchingRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for matching request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let settings = &state.settings;
    let data = &settings.data;
    let mut warnings = Vec::new();

    let mentees_application = resolve_path(
        &data.directory,
        req.mentees_application_csv
            .as_deref()
            .unwrap_or(&data.mentees_application),
    );
    let mentees_interview = resolve_path(
        &data.directory,
        req.mentees_interview_csv
            .as_deref()
            .unwrap_or(&data.mentees_interview),
    );
    let mentors_application = resolve_path(
        &data.directory,
        req.mentors_application_csv
            .as_deref()
            .unwrap_or(&data.mentors_application),
    );
    let mentors_interview = resolve_path(
        &data.directory,
        req.mentors_interview_csv
            .as_deref()
            .unwrap_or(&data.mentors_interview),
    );

    let mentees =
        match services::load_mentees(&mentees_application, &mentees_interview, &mut warnings) {
            Ok(mentees) => mentees,
            Err(e) => return roster_error_response(&e),
        };
    let mentors =
        match services::load_mentors(&mentors_application, &mentors_interview, &mut warnings) {
            Ok(mentors) => mentors,
            Err(e) => return roster_error_response(&e),
        };

    tracing::info!(
        "Scoring {} mentees against {} mentors",
        mentees.len(),
        mentors.len()
    );

    let age_max_difference = req
        .age_max_difference
        .unwrap_or(settings.matching.age_max_difference);
    let geographic_max_distance = req
        .geographic_max_distance
        .unwrap_or(settings.matching.geographic_max_distance);
    let reference_year = chrono::Utc::now().year();

    let distances = state.geocode.pair_distances(&mentees, &mentors).await;

    let criteria_scores = score_all(
        &mentees,
        &mentors,
        &distances,
        &req,
        reference_year,
        age_max_difference,
        geographic_max_distance,
    );

    let engine = match &req.weights {
        Some(weights) => MatchEngine::new(MatchWeights::new(weights.clone())),
        None => MatchEngine::new(settings.weights()),
    };

    let outcome = match engine.run(&criteria_scores, &req.manual_matches, &req.manual_non_matches)
    {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::info!("Matching run rejected: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: "Schema mismatch".to_string(),
                message: e.to_string(),
                status_code: 400,
            });
        }
    };
    warnings.extend(outcome.warnings.iter().cloned());

    let response = build_response(
        &criteria_scores,
        &outcome,
        mentees.len(),
        mentors.len(),
        warnings,
    );

    tracing::info!(
        "Returning {} matched pairs from {} scored pairs",
        response.counts.matched_pairs,
        response.counts.scored_pairs
    );

    HttpResponse::Ok().json(response)
}

/// Run every score provider over the two cohorts.
fn score_all(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
    distances: &BTreeMap<PairKey, f64>,
    req: &MatchingRequest,
    reference_year: i32,
    age_max_difference: f64,
    geographic_max_distance: f64,
) -> CriteriaScores {
    let mut scores = CriteriaScores::new();
    scores.insert(
        criteria::GENDER.to_string(),
        criteria::gender::score_cohorts(mentees, mentors, req.modifier(criteria::GENDER)),
    );
    scores.insert(
        criteria::LANGUAGES.to_string(),
        criteria::languages::score_cohorts(mentees, mentors, req.modifier(criteria::LANGUAGES)),
    );
    scores.insert(
        criteria::ACADEMIA.to_string(),
        criteria::academia::score_cohorts(mentees, mentors, req.modifier(criteria::ACADEMIA)),
    );
    scores.insert(
        criteria::AGE_DIFFERENCE.to_string(),
        criteria::age::score_cohorts(
            mentees,
            mentors,
            reference_year,
            age_max_difference,
            req.modifier(criteria::AGE_DIFFERENCE),
        ),
    );
    scores.insert(
        criteria::GEOGRAPHIC_PROXIMITY.to_string(),
        criteria::proximity::score_cohorts(
            mentees,
            mentors,
            distances,
            geographic_max_distance,
            req.modifier(criteria::GEOGRAPHIC_PROXIMITY),
        ),
    );
    scores
}

fn build_response(
    criteria_scores: &CriteriaScores,
    outcome: &MatchOutcome,
    mentees: usize,
    mentors: usize,
    warnings: Vec<String>,
) -> MatchingResponse {
    let criteria = criteria_scores
        .iter()
        .map(|(name, map)| {
            let rounded = map
                .iter()
                .map(|(key, value)| (key.to_string(), value.rounded()))
                .collect();
            (name.clone(), rounded)
        })
        .collect();

    let pairs = outcome.records.values().map(rounded_record).collect();

    let mut assignment: Vec<AssignmentEntry> = outcome
        .selected
        .iter()
        .map(|key| {
            let record = &outcome.records[key];
            AssignmentEntry {
                pair: key.to_string(),
                mentee_id: key.mentee.clone(),
                mentor_id: key.mentor.clone(),
                total_score: record.total_score.rounded(),
            }
        })
        .collect();
    assignment.sort_by(|a, b| {
        b.total_score
            .rank()
            .total_cmp(&a.total_score.rank())
            .then_with(|| a.pair.cmp(&b.pair))
    });

    let valid_pairs = outcome.records.values().filter(|r| r.valid).count();

    MatchingResponse {
        run_id: uuid::Uuid::new_v4().to_string(),
        generated_at: chrono::Utc::now(),
        criteria,
        pairs,
        assignment,
        warnings,
        counts: MatchCounts {
            mentees,
            mentors,
            scored_pairs: outcome.records.len(),
            valid_pairs,
            matched_pairs: outcome.selected.len(),
        },
    }
}

fn rounded_record(record: &PairRecord) -> PairRecord {
    PairRecord {
        mentee_id: record.mentee_id.clone(),
        mentor_id: record.mentor_id.clone(),
        scores: record
            .scores
            .iter()
            .map(|(name, value)| (name.clone(), value.rounded()))
            .collect(),
        total_score: record.total_score.rounded(),
        valid: record.valid,
        selected: record.selected,
    }
}

/// Resolve a CSV path against the data directory unless it is absolute.
fn resolve_path(directory: &str, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(directory).join(path)
    }
}

fn roster_error_response(error: &RosterError) -> HttpResponse {
    tracing::error!("Failed to load roster: {}", error);
    match error {
        RosterError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Roster not found".to_string(),
            message: error.to_string(),
            status_code: 404,
        }),
        RosterError::MissingIdColumn(_) => HttpResponse::BadRequest().json(ErrorResponse {
            error: "Invalid roster".to_string(),
            message: error.to_string(),
            status_code: 400,
        }),
        RosterError::CsvError(_) => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to read roster".to_string(),
            message: error.to_string(),
            status_code: 500,
        }),
    }
}
