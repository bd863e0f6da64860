use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to run a matching round
///
/// Every field is optional: an empty body runs with the configured CSV
/// paths, weights, and thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MatchingRequest {
    #[serde(default)]
    #[serde(alias = "mentees_application_csv", rename = "menteesApplicationCsv")]
    pub mentees_application_csv: Option<String>,
    #[serde(default)]
    #[serde(alias = "mentees_interview_csv", rename = "menteesInterviewCsv")]
    pub mentees_interview_csv: Option<String>,
    #[serde(default)]
    #[serde(alias = "mentors_application_csv", rename = "mentorsApplicationCsv")]
    pub mentors_application_csv: Option<String>,
    #[serde(default)]
    #[serde(alias = "mentors_interview_csv", rename = "mentorsInterviewCsv")]
    pub mentors_interview_csv: Option<String>,
    /// Per-criterion multipliers applied to numeric scores (default 1.0).
    #[serde(default)]
    #[serde(alias = "importance_modifiers", rename = "importanceModifiers")]
    pub importance_modifiers: BTreeMap<String, f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    #[serde(alias = "age_max_difference", rename = "ageMaxDifference")]
    pub age_max_difference: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(default)]
    #[serde(alias = "geographic_max_distance", rename = "geographicMaxDistance")]
    pub geographic_max_distance: Option<f64>,
    /// Pairs forced into the assignment, as `"<mentee>-<mentor>"` strings.
    #[serde(default)]
    #[serde(alias = "manual_matches", rename = "manualMatches")]
    pub manual_matches: Vec<String>,
    /// Pairs excluded from consideration, as `"<mentee>-<mentor>"` strings.
    #[serde(default)]
    #[serde(alias = "manual_non_matches", rename = "manualNonMatches")]
    pub manual_non_matches: Vec<String>,
    /// Per-criterion weight table replacing the configured one.
    #[serde(default)]
    pub weights: Option<BTreeMap<String, f64>>,
}

impl MatchingRequest {
    /// Importance modifier for a criterion, defaulting to 1.0.
    pub fn modifier(&self, criterion: &str) -> f64 {
        self.importance_modifiers
            .get(criterion)
            .copied()
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_deserializes() {
        let request: MatchingRequest = serde_json::from_str("{}").unwrap();

        assert!(request.mentees_application_csv.is_none());
        assert!(request.manual_matches.is_empty());
        assert_eq!(request.modifier("gender"), 1.0);
    }

    #[test]
    fn test_camel_case_fields_deserialize() {
        let request: MatchingRequest = serde_json::from_str(
            r#"{
                "menteesApplicationCsv": "mentees.csv",
                "importanceModifiers": {"languages": 0.5},
                "ageMaxDifference": 25,
                "manualMatches": ["1-2"]
            }"#,
        )
        .unwrap();

        assert_eq!(request.mentees_application_csv.as_deref(), Some("mentees.csv"));
        assert_eq!(request.modifier("languages"), 0.5);
        assert_eq!(request.age_max_difference, Some(25.0));
        assert_eq!(request.manual_matches, vec!["1-2".to_string()]);
    }

    #[test]
    fn test_negative_threshold_fails_validation() {
        let request: MatchingRequest =
            serde_json::from_str(r#"{"ageMaxDifference": -1}"#).unwrap();

        assert!(request.validate().is_err());
    }
}
