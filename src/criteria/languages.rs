use std::collections::BTreeSet;

use crate::models::{CriterionValue, MenteeProfile, MentorProfile, PairKey, ScoreMap};

/// CEFR levels on a 0..1 scale. Checked in ascending order so an answer
/// like "B1 / B2" resolves to the lower level it names first.
const LEVEL_SCORES: [(&str, f64); 6] = [
    ("A1", 0.2),
    ("A2", 0.4),
    ("B1", 0.6),
    ("B2", 0.75),
    ("C1", 0.9),
    ("C2", 1.0),
];

/// Both sides need at least B1 in a language for it to count.
const COMMUNICATIVE_THRESHOLD: f64 = 0.6;
/// Effective level credited to a shared third language.
const SHARED_OTHER_LEVEL: f64 = 0.8;

const GERMAN_WEIGHT: f64 = 0.45;
const ENGLISH_WEIGHT: f64 = 0.45;
const SHARED_OTHER_BONUS: f64 = 0.10;

fn level_score(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let text = raw.to_uppercase();
    for (token, score) in LEVEL_SCORES {
        if text.contains(token) {
            return score;
        }
    }
    if text.contains("NATIVE") || text.contains("MUTTERSPRACHE") {
        return 1.0;
    }
    0.0
}

/// Filler words and level annotations that appear in the free-text answers
/// but are not languages themselves.
const NON_LANGUAGE_TOKENS: [&str; 8] = [
    "and", "und", "native", "muttersprache", "speaker", "fluent", "basic", "level",
];

fn language_tokens(raw: &str) -> BTreeSet<String> {
    raw.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|token| token.len() > 1)
        .filter(|token| !NON_LANGUAGE_TOKENS.contains(token))
        .map(str::to_string)
        .collect()
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// The first (alphabetically) language both sides list among their further
/// language skills, if any.
fn shared_other_language(mentee: Option<&str>, mentor: Option<&str>) -> Option<String> {
    let (Some(mentee), Some(mentor)) = (mentee, mentor) else {
        return None;
    };
    let mentee_tokens = language_tokens(mentee);
    let mentor_tokens = language_tokens(mentor);
    mentee_tokens
        .intersection(&mentor_tokens)
        .next()
        .map(|token| capitalize(token))
}

/// Language compatibility with a mutual B1 threshold.
///
/// German and English each contribute the mean of both sides' levels when
/// both are at least B1; a shared further language adds a flat bonus. The
/// best common language is reported alongside the score. No language
/// communicative on both sides disqualifies the pair.
pub fn score_pair(mentee: &MenteeProfile, mentor: &MentorProfile, modifier: f64) -> CriterionValue {
    let mentee_german = level_score(mentee.german.as_deref());
    let mentee_english = level_score(mentee.english.as_deref());
    let mentor_german = level_score(mentor.german.as_deref());
    let mentor_english = level_score(mentor.english.as_deref());

    let german_ok = mentee_german >= COMMUNICATIVE_THRESHOLD
        && mentor_german >= COMMUNICATIVE_THRESHOLD;
    let english_ok = mentee_english >= COMMUNICATIVE_THRESHOLD
        && mentor_english >= COMMUNICATIVE_THRESHOLD;

    let german_eff = if german_ok {
        (mentee_german + mentor_german) / 2.0
    } else {
        0.0
    };
    let english_eff = if english_ok {
        (mentee_english + mentor_english) / 2.0
    } else {
        0.0
    };

    let shared_other = shared_other_language(
        mentee.other_languages.as_deref(),
        mentor.other_languages.as_deref(),
    );

    let mut best_language = "German";
    let mut best_level = german_eff;
    if english_eff > best_level {
        best_language = "English";
        best_level = english_eff;
    }
    if let Some(name) = shared_other.as_deref() {
        if SHARED_OTHER_LEVEL > best_level {
            best_language = name;
            best_level = SHARED_OTHER_LEVEL;
        }
    }

    let weighted = GERMAN_WEIGHT * german_eff
        + ENGLISH_WEIGHT * english_eff
        + if shared_other.is_some() {
            SHARED_OTHER_BONUS
        } else {
            0.0
        };

    if best_level < COMMUNICATIVE_THRESHOLD {
        CriterionValue::disqualified().with_detail("common_language", "No common language")
    } else {
        CriterionValue::scored(weighted * modifier).with_detail("common_language", best_language)
    }
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
