use crate::models::{CriterionValue, MenteeProfile, MentorProfile, PairKey, ScoreMap};

const EXACT_PREFERENCE_SCORE: f64 = 1.0;
const NO_PREFERENCE_SCORE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gender {
    Female,
    Male,
    Any,
    Unknown,
}

impl Gender {
    fn label(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Any => "any",
            Gender::Unknown => "unknown",
        }
    }
}

/// Normalize the free-text gender answers from both application forms.
/// The female tokens are checked first: "female" contains "male" as a
/// substring, so the order is load-bearing.
fn normalize(raw: Option<&str>) -> Gender {
    let Some(raw) = raw else {
        return Gender::Unknown;
    };
    let text = raw.trim().to_lowercase();
    if ["weiblich / female", "identify as female", "female"]
        .iter()
        .any(|token| text.contains(token))
    {
        return Gender::Female;
    }
    if ["männlich / male", "identify as male", "male"]
        .iter()
        .any(|token| text.contains(token))
    {
        return Gender::Male;
    }
    if ["doesn't matter", "any", "egal"]
        .iter()
        .any(|token| text.contains(token))
    {
        return Gender::Any;
    }
    Gender::Unknown
}

/// Score the mentee's desired mentor gender against the mentor's gender.
///
/// A stated preference that the mentor satisfies scores 1.0, no preference
/// 0.75. An unmet or unknown preference disqualifies the pair; the gate is
/// decided on the raw score, so an importance modifier can scale but never
/// disqualify.
pub fn score_pair(mentee: &MenteeProfile, mentor: &MentorProfile, modifier: f64) -> CriterionValue {
    let mentee_gender = normalize(mentee.gender.as_deref());
    let preference = normalize(mentee.desired_mentor_gender.as_deref());
    let mentor_gender = normalize(mentor.gender.as_deref());

    let score = match preference {
        Gender::Female | Gender::Male if preference == mentor_gender => EXACT_PREFERENCE_SCORE,
        Gender::Any => NO_PREFERENCE_SCORE,
        _ => 0.0,
    };

    let value = if score == 0.0 {
        CriterionValue::disqualified()
    } else {
        CriterionValue::scored(score * modifier)
    };

    value
        .with_detail("mentee_gender", mentee_gender.label())
        .with_detail("mentee_pref_gender", preference.label())
        .with_detail("mentor_gender", mentor_gender.label())
}

pub fn score_cohorts(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
    modifier: f64,
) -> ScoreMap {
    let mut scores = ScoreMap::new();
    for mentee in mentees {
        for mentor in mentors {
            scores.insert(
                PairKey::new(mentee.id.as_str(), mentor.id.as_str()),
                score_pair(mentee, mentor, modifier),
            );
        }
    }
    scores
}
