use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::models::{CriterionValue, MenteeProfile, MentorProfile, PairKey, ScoreMap};

/// Plausible birth-year window for bare numeric answers.
const YEAR_MIN: i32 = 1800;
const YEAR_MAX: i32 = 2100;

/// Date layouts seen in the application forms, month-first preferred over
/// day-first when both could apply.
const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%d %B %Y",
];

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Extract a birth year from whatever the form produced: a bare year, a
/// spreadsheet-style numeric ("1990.0"), or a full date in one of several
/// layouts. Returns `None` for anything unparseable.
fn birth_year(raw: Option<&str>) -> Option<i32> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        let year: i32 = text.parse().ok()?;
        return (YEAR_MIN..=YEAR_MAX).contains(&year).then_some(year);
    }

    if let Ok(value) = text.parse::<f64>() {
        let year = value as i32;
        return (YEAR_MIN..=YEAR_MAX).contains(&year).then_some(year);
    }

    parse_date(text).map(|date| date.year())
}

fn age_in_years(raw: Option<&str>, reference_year: i32) -> Option<f64> {
    let year = birth_year(raw)?;
    let age = reference_year - year;
    (age >= 0).then_some(f64::from(age))
}

/// Age-difference compatibility, normalized over the ages actually present.
///
/// Score is 1.0 for equal ages falling linearly to 0.0 as the gap reaches
/// the full age range across both cohorts. A gap beyond `max_difference`
/// disqualifies the pair; a missing or unparseable birth date on either
/// side scores 0.0 without disqualifying.
pub fn score_cohorts(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
    reference_year: i32,
    max_difference: f64,
    modifier: f64,
) -> ScoreMap {
    let mentee_ages: Vec<Option<f64>> = mentees
        .iter()
        .map(|mentee| age_in_years(mentee.birth_date.as_deref(), reference_year))
        .collect();
    let mentor_ages: Vec<Option<f64>> = mentors
        .iter()
        .map(|mentor| age_in_years(mentor.birth_date.as_deref(), reference_year))
        .collect();

    let known: Vec<f64> = mentee_ages
        .iter()
        .chain(&mentor_ages)
        .flatten()
        .copied()
        .collect();
    if known.is_empty() {
        warn!("no parsable birth dates in either cohort; age criterion produced no scores");
        return ScoreMap::new();
    }

    let min_age = known.iter().copied().fold(f64::INFINITY, f64::min);
    let max_age = known.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let age_range = max_age - min_age;

    let mut scores = ScoreMap::new();
    for (mentee, mentee_age) in mentees.iter().zip(&mentee_ages) {
        for (mentor, mentor_age) in mentors.iter().zip(&mentor_ages) {
            let key = PairKey::new(mentee.id.as_str(), mentor.id.as_str());
            let value = match (mentee_age, mentor_age) {
                (Some(mentee_age), Some(mentor_age)) => {
                    let diff = (mentee_age - mentor_age).abs();
                    if diff > max_difference {
                        CriterionValue::disqualified()
                    } else if age_range > 0.0 {
                        CriterionValue::scored((1.0 - diff / age_range).max(0.0) * modifier)
                    } else {
                        CriterionValue::scored(1.0 * modifier)
                    }
                }
                _ => CriterionValue::scored(0.0),
            };
            scores.insert(key, value);
        }
    }
    scores
}
