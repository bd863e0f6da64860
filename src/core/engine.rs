use std::collections::BTreeMap;

use tracing::info;

use crate::core::aggregate::{aggregate, push_warning, MatchError, Overrides};
use crate::core::solve::solve;
use crate::models::{CriteriaScores, MatchWeights, PairKey, PairRecord};

/// Result of one matching run: every retained pair plus the selected subset.
#[derive(Debug)]
pub struct MatchOutcome {
    pub records: BTreeMap<PairKey, PairRecord>,
    pub selected: Vec<PairKey>,
    pub warnings: Vec<String>,
}

/// Ties the aggregation and assignment stages together.
///
/// The engine is pure and synchronous; everything it needs arrives as
/// arguments and each run starts from scratch.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    weights: MatchWeights,
}

impl MatchEngine {
    pub fn new(weights: MatchWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// Aggregate the criterion maps, resolve overrides, and solve the
    /// assignment. The `selected` flag is set on the chosen records.
    pub fn run(
        &self,
        criteria: &CriteriaScores,
        manual_matches: &[String],
        manual_non_matches: &[String],
    ) -> Result<MatchOutcome, MatchError> {
        let mut warnings = Vec::new();
        let overrides = Overrides::parse(manual_matches, manual_non_matches, &mut warnings);

        let mut records = aggregate(criteria, &self.weights, &overrides)?;

        for key in &overrides.matches {
            if !records.contains_key(key) {
                push_warning(
                    &mut warnings,
                    format!("manual match '{}' does not correspond to a scorable pair", key),
                );
            }
        }

        let selected = solve(&records);
        for key in &selected {
            if let Some(record) = records.get_mut(key) {
                record.selected = true;
            }
        }

        info!(
            "matching run selected {} of {} candidate pairs",
            selected.len(),
            records.len()
        );

        Ok(MatchOutcome {
            records,
            selected,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CriterionValue, ScoreMap};

    fn criterion(entries: &[(&str, &str, CriterionValue)]) -> ScoreMap {
        entries
            .iter()
            .map(|(mentee, mentor, value)| (PairKey::new(*mentee, *mentor), value.clone()))
            .collect()
    }

    fn cross_product_criteria() -> CriteriaScores {
        let mut criteria = BTreeMap::new();
        criteria.insert(
            "alpha".to_string(),
            criterion(&[
                ("L1", "R1", CriterionValue::scored(0.9)),
                ("L1", "R2", CriterionValue::scored(0.2)),
                ("L2", "R1", CriterionValue::scored(0.3)),
                ("L2", "R2", CriterionValue::scored(0.8)),
            ]),
        );
        criteria
    }

    fn alpha_weights() -> MatchWeights {
        [("alpha".to_string(), 1.0)].into_iter().collect()
    }

    #[test]
    fn test_run_marks_selected_records() {
        let engine = MatchEngine::new(alpha_weights());
        let outcome = engine.run(&cross_product_criteria(), &[], &[]).unwrap();

        assert_eq!(outcome.selected.len(), 2);
        for key in &outcome.selected {
            assert!(outcome.records[key].selected);
        }
        let unselected: Vec<_> = outcome
            .records
            .values()
            .filter(|record| !record.selected)
            .collect();
        assert_eq!(unselected.len(), 2);
    }

    #[test]
    fn test_run_surfaces_override_warnings() {
        let engine = MatchEngine::new(alpha_weights());
        let outcome = engine
            .run(
                &cross_product_criteria(),
                &["bogus".to_string(), "L9-R9".to_string()],
                &[],
            )
            .unwrap();

        // One malformed entry, one referencing a pair no criterion scored.
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn test_run_is_deterministic() {
        let engine = MatchEngine::new(alpha_weights());
        let criteria = cross_product_criteria();

        let first = engine.run(&criteria, &[], &[]).unwrap();
        let second = engine.run(&criteria, &[], &[]).unwrap();

        assert_eq!(first.selected, second.selected);
    }

    #[test]
    fn test_run_schema_mismatch() {
        let engine = MatchEngine::new([("beta".to_string(), 1.0)].into_iter().collect());
        let err = engine.run(&cross_product_criteria(), &[], &[]).unwrap_err();
        assert!(matches!(err, MatchError::SchemaMismatch(_)));
    }
}
