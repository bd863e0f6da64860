use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::warn;

use crate::models::{CriteriaScores, MatchWeights, PairKey, PairRecord, Score};

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("weighted criterion '{0}' is missing from the score input")]
    SchemaMismatch(String),
}

/// Manual override sets, parsed from their `"<mentee>-<mentor>"` wire form.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub matches: BTreeSet<PairKey>,
    pub non_matches: BTreeSet<PairKey>,
}

impl Overrides {
    /// Parse both override lists. Malformed entries are skipped with a
    /// warning; a pair listed in both resolves to the non-match.
    pub fn parse(
        matches: &[String],
        non_matches: &[String],
        warnings: &mut Vec<String>,
    ) -> Self {
        let mut parsed = Overrides::default();

        for raw in non_matches {
            match PairKey::parse(raw) {
                Some(key) => {
                    parsed.non_matches.insert(key);
                }
                None => push_warning(
                    warnings,
                    format!("ignoring malformed manual non-match '{}'", raw),
                ),
            }
        }

        for raw in matches {
            match PairKey::parse(raw) {
                Some(key) => {
                    if parsed.non_matches.contains(&key) {
                        push_warning(
                            warnings,
                            format!(
                                "pair '{}' is listed as both manual match and non-match; keeping the non-match",
                                key
                            ),
                        );
                    } else {
                        parsed.matches.insert(key);
                    }
                }
                None => push_warning(
                    warnings,
                    format!("ignoring malformed manual match '{}'", raw),
                ),
            }
        }

        parsed
    }
}

pub(crate) fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{}", message);
    warnings.push(message);
}

/// Combine per-criterion score maps into one `PairRecord` per pair.
///
/// Only pairs scorable by every criterion survive (the intersection of all
/// maps). Precedence per pair: manual non-match drops it entirely, a manual
/// match (or a Forced criterion value) forces it, any Disqualifying
/// criterion marks it invalid, and otherwise the total is the weighted sum
/// over the criteria named in `weights`. Criteria without a weight are
/// recorded for audit only.
pub fn aggregate(
    criteria: &CriteriaScores,
    weights: &MatchWeights,
    overrides: &Overrides,
) -> Result<BTreeMap<PairKey, PairRecord>, MatchError> {
    for name in weights.names() {
        if !criteria.contains_key(name) {
            return Err(MatchError::SchemaMismatch(name.to_string()));
        }
    }

    let mut maps = criteria.values();
    let Some(first) = maps.next() else {
        return Ok(BTreeMap::new());
    };
    let mut shared: BTreeSet<&PairKey> = first.keys().collect();
    for map in maps {
        shared.retain(|key| map.contains_key(*key));
    }

    let mut records = BTreeMap::new();
    for key in shared {
        if overrides.non_matches.contains(key) {
            continue;
        }

        let mut scores = BTreeMap::new();
        let mut forced = overrides.matches.contains(key);
        let mut disqualified = false;
        let mut weighted_total = 0.0;

        for (name, map) in criteria {
            // The intersection guarantees every map holds this key.
            let value = &map[key];
            match value.score {
                Score::Scored(v) => weighted_total += weights.weight_for(name) * v,
                Score::Disqualified => disqualified = true,
                Score::Forced => forced = true,
            }
            scores.insert(name.clone(), value.clone());
        }

        let (total_score, valid) = if forced {
            (Score::Forced, true)
        } else if disqualified {
            (Score::Disqualified, false)
        } else {
            (Score::Scored(weighted_total), true)
        };

        records.insert(
            key.clone(),
            PairRecord {
                mentee_id: key.mentee.clone(),
                mentor_id: key.mentor.clone(),
                scores,
                total_score,
                valid,
                selected: false,
            },
        );
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriterionValue, ScoreMap};

    fn score_map(entries: &[(&str, &str, CriterionValue)]) -> ScoreMap {
        entries
            .iter()
            .map(|(mentee, mentor, value)| (PairKey::new(*mentee, *mentor), value.clone()))
            .collect()
    }

    fn two_criteria() -> CriteriaScores {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            "alpha".to_string(),
            score_map(&[
                ("1", "1", CriterionValue::scored(0.8)),
                ("1", "2", CriterionValue::scored(0.4)),
            ]),
        );
        criteria.insert(
            "beta".to_string(),
            score_map(&[
                ("1", "1", CriterionValue::scored(0.6)),
                ("1", "2", CriterionValue::scored(0.2)),
            ]),
        );
        criteria
    }

    fn weights(entries: &[(&str, f64)]) -> MatchWeights {
        entries
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect()
    }

    #[test]
    fn test_weighted_total() {
        let criteria = two_criteria();
        let weights = weights(&[("alpha", 0.5), ("beta", 0.5)]);

        let records = aggregate(&criteria, &weights, &Overrides::default()).unwrap();

        let record = &records[&PairKey::new("1", "1")];
        assert!(record.valid);
        assert_eq!(record.total_score, Score::Scored(0.7));
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let criteria = two_criteria();
        let weights = weights(&[("alpha", 0.5), ("gamma", 0.5)]);

        let err = aggregate(&criteria, &weights, &Overrides::default()).unwrap_err();
        assert!(matches!(err, MatchError::SchemaMismatch(name) if name == "gamma"));
    }

    #[test]
    fn test_unweighted_criterion_is_audit_only() {
        let mut criteria = two_criteria();
        criteria.insert(
            "gamma".to_string(),
            score_map(&[
                ("1", "1", CriterionValue::scored(1.0)),
                ("1", "2", CriterionValue::scored(1.0)),
            ]),
        );
        let weights = weights(&[("alpha", 1.0)]);

        let records = aggregate(&criteria, &weights, &Overrides::default()).unwrap();

        let record = &records[&PairKey::new("1", "1")];
        // gamma contributes nothing to the total but stays on the record.
        assert_eq!(record.total_score, Score::Scored(0.8));
        assert!(record.scores.contains_key("gamma"));
    }

    #[test]
    fn test_intersection_drops_partially_scored_pairs() {
        let mut criteria = two_criteria();
        criteria
            .get_mut("beta")
            .unwrap()
            .remove(&PairKey::new("1", "2"));
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let records = aggregate(&criteria, &weights, &Overrides::default()).unwrap();

        assert!(records.contains_key(&PairKey::new("1", "1")));
        assert!(!records.contains_key(&PairKey::new("1", "2")));
    }

    #[test]
    fn test_disqualifying_criterion_invalidates_pair() {
        let mut criteria = two_criteria();
        criteria
            .get_mut("beta")
            .unwrap()
            .insert(PairKey::new("1", "1"), CriterionValue::disqualified());
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let records = aggregate(&criteria, &weights, &Overrides::default()).unwrap();

        let record = &records[&PairKey::new("1", "1")];
        assert!(!record.valid);
        assert_eq!(record.total_score, Score::Disqualified);
        // Recorded for audit, not removed.
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_manual_match_overrides_disqualification() {
        let mut criteria = two_criteria();
        criteria
            .get_mut("beta")
            .unwrap()
            .insert(PairKey::new("1", "1"), CriterionValue::disqualified());
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let mut warnings = Vec::new();
        let overrides = Overrides::parse(&["1-1".to_string()], &[], &mut warnings);
        let records = aggregate(&criteria, &weights, &overrides).unwrap();

        let record = &records[&PairKey::new("1", "1")];
        assert!(record.valid);
        assert_eq!(record.total_score, Score::Forced);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_manual_non_match_drops_pair() {
        let criteria = two_criteria();
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let mut warnings = Vec::new();
        let overrides = Overrides::parse(&[], &["1-1".to_string()], &mut warnings);
        let records = aggregate(&criteria, &weights, &overrides).unwrap();

        assert!(!records.contains_key(&PairKey::new("1", "1")));
        assert!(records.contains_key(&PairKey::new("1", "2")));
    }

    #[test]
    fn test_conflicting_override_prefers_non_match() {
        let criteria = two_criteria();
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let mut warnings = Vec::new();
        let overrides = Overrides::parse(
            &["1-1".to_string()],
            &["1-1".to_string()],
            &mut warnings,
        );
        let records = aggregate(&criteria, &weights, &overrides).unwrap();

        assert!(!records.contains_key(&PairKey::new("1", "1")));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("both manual match and non-match"));
    }

    #[test]
    fn test_malformed_override_is_warned_not_fatal() {
        let criteria = two_criteria();
        let weights = weights(&[("alpha", 1.0), ("beta", 1.0)]);

        let mut warnings = Vec::new();
        let overrides = Overrides::parse(
            &["not a pair".to_string()],
            &["1-2-3".to_string()],
            &mut warnings,
        );
        let records = aggregate(&criteria, &weights, &overrides).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_structured_values_pass_details_through() {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            "alpha".to_string(),
            score_map(&[(
                "1",
                "1",
                CriterionValue::scored(0.9).with_detail("common_language", "German"),
            )]),
        );
        let weights = weights(&[("alpha", 1.0)]);

        let records = aggregate(&criteria, &weights, &Overrides::default()).unwrap();

        let record = &records[&PairKey::new("1", "1")];
        assert_eq!(record.total_score, Score::Scored(0.9));
        assert_eq!(
            record.scores["alpha"].details["common_language"],
            serde_json::Value::from("German")
        );
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let criteria = CriteriaScores::new();
        let records =
            aggregate(&criteria, &MatchWeights::new(BTreeMap::new()), &Overrides::default())
                .unwrap();
        assert!(records.is_empty());
    }
}
