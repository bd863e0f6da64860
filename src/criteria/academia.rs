use std::collections::BTreeSet;

use crate::models::{CriterionValue, MenteeProfile, MentorProfile, PairKey, ScoreMap};

/// Study levels on a coarse numeric ladder. Matched by substring in this
/// order, so "other" outranks the degree names that follow it.
const STUDY_LEVELS: [(&str, f64); 11] = [
    ("high school", 0.0),
    ("gymnasium", 0.0),
    ("other", 0.5),
    ("bachelor", 1.0),
    ("undergraduate", 1.0),
    ("master", 2.0),
    ("msc", 2.0),
    ("phd", 3.0),
    ("doctorate", 3.0),
    ("doctoral", 3.0),
    ("professor", 4.0),
];

const DESIRED_WEIGHT: f64 = 0.55;
const BACKGROUND_WEIGHT: f64 = 0.15;
const LEVEL_WEIGHT: f64 = 0.25;
const GUIDANCE_BONUS: f64 = 0.2;
const LEVEL_GAP_PENALTY: f64 = 0.1;

fn study_level(text: &str) -> f64 {
    let text = text.to_lowercase();
    for (token, level) in STUDY_LEVELS {
        if text.contains(token) {
            return level;
        }
    }
    0.0
}

/// How confident the mentor sounds about the Swiss university system.
fn guidance_confidence(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let text = raw.to_lowercase();
    let strong = [
        "very experienced",
        "eth",
        "uzh",
        "confident",
        "familiar",
        "studying myself",
    ];
    let moderate = ["understands", "knows", "worked in academia"];
    let weak = ["not sure", "limited", "have to find out"];

    if strong.iter().any(|token| text.contains(token)) {
        1.0
    } else if moderate.iter().any(|token| text.contains(token)) {
        0.7
    } else if weak.iter().any(|token| text.contains(token)) {
        0.4
    } else {
        0.0
    }
}

/// Whether the mentee's motivation answer signals uncertainty about what or
/// where to study.
fn guidance_need(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let text = raw.to_lowercase();
    let uncertain = [
        "not sure",
        "don't know",
        "open",
        "maybe",
        "decide",
        "explore",
        "unsure",
    ];
    if uncertain.iter().any(|token| text.contains(token)) {
        1.0
    } else {
        0.0
    }
}

fn token_set(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lexical similarity of two free-text study descriptions: shared tokens
/// over total distinct tokens. Empty text on either side scores 0.
fn text_similarity(a: &str, b: &str) -> f64 {
    let a = token_set(a);
    let b = token_set(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count() as f64;
    let total = a.union(&b).count() as f64;
    shared / total
}

fn joined_text(fields: &[Option<&str>]) -> String {
    fields
        .iter()
        .flatten()
        .map(|field| field.trim())
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Academic alignment of a pair.
///
/// Combines the similarity of the mentee's desired studies to the mentor's
/// field (0.55), the similarity of the mentee's academic background (0.15),
/// study-level alignment (0.25, with a 0.1 penalty per level the mentor
/// falls short), and a guidance bonus for uncertain mentees with
/// experienced mentors. Clamped to [0, 1], never disqualifying.
pub fn score_pair(mentee: &MenteeProfile, mentor: &MentorProfile, modifier: f64) -> CriterionValue {
    let desired_text = joined_text(&[
        mentee.desired_studies.as_deref(),
        mentee.study_motivation.as_deref(),
    ]);
    let background_text = joined_text(&[
        mentee.previous_studies.as_deref(),
        mentee.last_degree.as_deref(),
    ]);
    let mentor_field = mentor.study_field.as_deref().unwrap_or("").trim();

    let desired_similarity = text_similarity(&desired_text, mentor_field);
    let background_similarity = text_similarity(&background_text, mentor_field);

    let mentee_level = study_level(&joined_text(&[
        mentee.previous_studies.as_deref(),
        mentee.desired_studies.as_deref(),
    ]));
    let mentor_level = study_level(mentor.study_level.as_deref().unwrap_or(""));

    let (level_score, penalty) = if mentor_level >= mentee_level {
        (1.0, 0.0)
    } else if mentee_level > 0.0 {
        (
            mentor_level / mentee_level,
            (mentee_level - mentor_level) * LEVEL_GAP_PENALTY,
        )
    } else {
        (0.0, 0.0)
    };

    let guidance = GUIDANCE_BONUS
        * guidance_need(mentee.study_motivation.as_deref())
        * guidance_confidence(mentor.guidance.as_deref());

    let raw = DESIRED_WEIGHT * desired_similarity
        + BACKGROUND_WEIGHT * background_similarity
        + LEVEL_WEIGHT * level_score
        - penalty
        + guidance;

    CriterionValue::scored((raw * modifier).clamp(0.0, 1.0))
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
