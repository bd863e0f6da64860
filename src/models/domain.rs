use serde::de::{self, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::criteria;

/// Reserved wire tokens for the score sentinels.
///
/// serde_json renders non-finite floats as `null`, which would silently
/// change sort-order semantics for consumers, so the sentinels are encoded
/// as these documented strings instead.
pub const FORCED_TOKEN: &str = "Infinity";
pub const DISQUALIFIED_TOKEN: &str = "-Infinity";

/// Decimal places kept on numeric scores at the wire boundary.
pub const SCORE_DECIMALS: u32 = 3;

/// A mentee profile assembled from the application and interview tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenteeProfile {
    pub id: String,
    pub gender: Option<String>,
    #[serde(rename = "desiredMentorGender")]
    pub desired_mentor_gender: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub location: Option<String>,
    pub german: Option<String>,
    pub english: Option<String>,
    #[serde(rename = "otherLanguages")]
    pub other_languages: Option<String>,
    #[serde(rename = "desiredStudies")]
    pub desired_studies: Option<String>,
    #[serde(rename = "studyMotivation")]
    pub study_motivation: Option<String>,
    #[serde(rename = "previousStudies")]
    pub previous_studies: Option<String>,
    #[serde(rename = "lastDegree")]
    pub last_degree: Option<String>,
}

/// A mentor profile assembled from the application and interview tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorProfile {
    pub id: String,
    pub gender: Option<String>,
    #[serde(rename = "birthDate")]
    pub birth_date: Option<String>,
    pub location: Option<String>,
    pub german: Option<String>,
    pub english: Option<String>,
    #[serde(rename = "otherLanguages")]
    pub other_languages: Option<String>,
    #[serde(rename = "studyField")]
    pub study_field: Option<String>,
    #[serde(rename = "studyLevel")]
    pub study_level: Option<String>,
    pub guidance: Option<String>,
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Identifies one (mentee, mentor) candidate pair.
///
/// The derived ordering (mentee first, then mentor) is the deterministic
/// tie-break used throughout the solver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub mentee: String,
    pub mentor: String,
}

impl PairKey {
    pub fn new(mentee: impl Into<String>, mentor: impl Into<String>) -> Self {
        Self {
            mentee: mentee.into(),
            mentor: mentor.into(),
        }
    }

    /// Parse the `"<mentee_id>-<mentor_id>"` side-channel format used by
    /// manual match/non-match lists. Returns `None` for anything that is not
    /// exactly two non-empty ids joined by a single `-`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-');
        let mentee = parts.next()?.trim();
        let mentor = parts.next()?.trim();
        if parts.next().is_some() || mentee.is_empty() || mentor.is_empty() {
            return None;
        }
        Some(Self::new(mentee, mentor))
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mentee, self.mentor)
    }
}

/// A single criterion's verdict for one pair.
///
/// Carried as a tagged variant through the aggregator so sentinel values can
/// never leak into arithmetic; only the solver projects it onto a plain
/// comparable number via [`Score::rank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    /// A bounded compatibility value, canonically in [0, 1].
    Scored(f64),
    /// Hard violation: the pair must never be matched.
    Disqualified,
    /// Manual override: the pair must be matched regardless of criteria.
    Forced,
}

impl Score {
    /// The numeric component, if any.
    pub fn value(self) -> Option<f64> {
        match self {
            Score::Scored(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_disqualified(self) -> bool {
        matches!(self, Score::Disqualified)
    }

    pub fn is_forced(self) -> bool {
        matches!(self, Score::Forced)
    }

    /// Projection onto a totally ordered value, used only at the solver
    /// boundary: Forced above every finite score, Disqualified below.
    pub fn rank(self) -> f64 {
        match self {
            Score::Scored(v) => v,
            Score::Disqualified => f64::NEG_INFINITY,
            Score::Forced => f64::INFINITY,
        }
    }

    /// Copy with the numeric component rounded to [`SCORE_DECIMALS`] places.
    /// Sentinels are unaffected.
    pub fn rounded(self) -> Score {
        match self {
            Score::Scored(v) => {
                let factor = 10f64.powi(SCORE_DECIMALS as i32);
                Score::Scored((v * factor).round() / factor)
            }
            other => other,
        }
    }
}

impl From<f64> for Score {
    fn from(v: f64) -> Self {
        Score::Scored(v)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Scored(v) => serializer.serialize_f64(*v),
            Score::Forced => serializer.serialize_str(FORCED_TOKEN),
            Score::Disqualified => serializer.serialize_str(DISQUALIFIED_TOKEN),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoreVisitor;

        impl Visitor<'_> for ScoreVisitor {
            type Value = Score;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(
                    f,
                    "a number or one of the reserved strings {:?} / {:?}",
                    FORCED_TOKEN, DISQUALIFIED_TOKEN
                )
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Score, E> {
                Ok(Score::Scored(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Score, E> {
                Ok(Score::Scored(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Score, E> {
                Ok(Score::Scored(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Score, E> {
                match v {
                    FORCED_TOKEN => Ok(Score::Forced),
                    DISQUALIFIED_TOKEN => Ok(Score::Disqualified),
                    _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
                }
            }
        }

        deserializer.deserialize_any(ScoreVisitor)
    }
}

/// A criterion score plus the auxiliary descriptive fields some providers
/// attach (e.g. the common language, the normalized genders).
///
/// On the wire a bare value serializes as its score alone; a structured
/// value serializes as an object with the numeric component under `score`
/// and the auxiliary fields alongside, mirroring the provider input format.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionValue {
    pub score: Score,
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl CriterionValue {
    pub fn scored(v: f64) -> Self {
        Self {
            score: Score::Scored(v),
            details: serde_json::Map::new(),
        }
    }

    pub fn disqualified() -> Self {
        Self {
            score: Score::Disqualified,
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Copy with the numeric component rounded for display.
    pub fn rounded(&self) -> Self {
        Self {
            score: self.score.rounded(),
            details: self.details.clone(),
        }
    }
}

impl From<f64> for CriterionValue {
    fn from(v: f64) -> Self {
        CriterionValue::scored(v)
    }
}

impl From<Score> for CriterionValue {
    fn from(score: Score) -> Self {
        Self {
            score,
            details: serde_json::Map::new(),
        }
    }
}

impl Serialize for CriterionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.details.is_empty() {
            self.score.serialize(serializer)
        } else {
            let mut map = serializer.serialize_map(Some(self.details.len() + 1))?;
            map.serialize_entry("score", &self.score)?;
            for (k, v) in &self.details {
                map.serialize_entry(k, v)?;
            }
            map.end()
        }
    }
}

impl<'de> Deserialize<'de> for CriterionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(mut obj) => {
                let raw = obj
                    .remove("score")
                    .ok_or_else(|| de::Error::missing_field("score"))?;
                let score: Score = serde_json::from_value(raw).map_err(de::Error::custom)?;
                Ok(CriterionValue {
                    score,
                    details: obj,
                })
            }
            other => {
                let score: Score = serde_json::from_value(other).map_err(de::Error::custom)?;
                Ok(CriterionValue {
                    score,
                    details: serde_json::Map::new(),
                })
            }
        }
    }
}

/// One criterion's scores over all candidate pairs.
pub type ScoreMap = BTreeMap<PairKey, CriterionValue>;

/// All criterion score maps, keyed by criterion name.
pub type CriteriaScores = BTreeMap<String, ScoreMap>;

/// The per-pair aggregate: every criterion's value, the combined total, and
/// the validity/selection flags. The full record set (not just the selected
/// subset) is exposed so callers can audit near-miss pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRecord {
    #[serde(rename = "menteeId")]
    pub mentee_id: String,
    #[serde(rename = "mentorId")]
    pub mentor_id: String,
    pub scores: BTreeMap<String, CriterionValue>,
    #[serde(rename = "totalScore")]
    pub total_score: Score,
    pub valid: bool,
    pub selected: bool,
}

/// Criterion weights for the combined score.
///
/// Membership declares the scoring subset: a criterion absent from the table
/// contributes nothing to the weighted sum (it is still recorded on the
/// `PairRecord` for audit, and may still gate validity via a Disqualifying
/// sentinel). Weights are positive and need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchWeights(BTreeMap<String, f64>);

impl MatchWeights {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self(weights)
    }

    /// The weight for a criterion, or 0.0 when the criterion is audit-only.
    pub fn weight_for(&self, criterion: &str) -> f64 {
        self.0.get(criterion).copied().unwrap_or(0.0)
    }

    /// Criterion names that must be present in the aggregation input.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MatchWeights {
    /// The documented default combination: academia 0.45, age difference
    /// 0.25, gender 0.15, languages 0.15. Geographic proximity is recorded
    /// for audit and gates through its distance threshold, but carries no
    /// weight.
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(criteria::ACADEMIA.to_string(), 0.45);
        weights.insert(criteria::AGE_DIFFERENCE.to_string(), 0.25);
        weights.insert(criteria::GENDER.to_string(), 0.15);
        weights.insert(criteria::LANGUAGES.to_string(), 0.15);
        Self(weights)
    }
}

impl FromIterator<(String, f64)> for MatchWeights {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
