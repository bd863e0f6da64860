use std::collections::BTreeMap;

use crate::models::{CriterionValue, MenteeProfile, MentorProfile, PairKey, ScoreMap};

/// Geographic proximity, normalized over the distances actually observed.
///
/// `distances` holds the great-circle distance for every pair whose
/// locations both geocoded; pairs absent from it score 0.0 without
/// disqualifying. Among the observed distances the closest pair scores
/// 1.0 and the farthest 0.0, and a distance beyond `max_distance_km`
/// disqualifies the pair outright.
pub fn score_cohorts(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
    distances: &BTreeMap<PairKey, f64>,
    max_distance_km: f64,
    modifier: f64,
) -> ScoreMap {
    let min_distance = distances.values().copied().fold(f64::INFINITY, f64::min);
    let max_distance = distances.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max_distance - min_distance;

    let mut scores = ScoreMap::new();
    for mentee in mentees {
        for mentor in mentors {
            let key = PairKey::new(mentee.id.as_str(), mentor.id.as_str());
            let value = match distances.get(&key) {
                Some(&distance) if distance > max_distance_km => {
                    CriterionValue::disqualified().with_detail("distance_km", distance)
                }
                Some(&distance) => {
                    let score = if range > 0.0 {
                        (1.0 - (distance - min_distance) / range).max(0.0)
                    } else {
                        1.0
                    };
                    CriterionValue::scored(score * modifier).with_detail("distance_km", distance)
                }
                None => CriterionValue::scored(0.0),
            };
            scores.insert(key, value);
        }
    }
    scores
}
