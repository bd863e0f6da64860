// Criterion benchmarks for Mentora Algo

use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mentora_algo::core::{aggregate, solve, MatchEngine, Overrides};
use mentora_algo::criteria::{self, academia, age, gender, haversine_km, languages, proximity};
use mentora_algo::models::{
    Coordinates, CriteriaScores, MatchWeights, MenteeProfile, MentorProfile, PairKey,
};

const REFERENCE_YEAR: i32 = 2026;

fn create_mentee(id: usize) -> MenteeProfile {
    let desired = if id % 3 == 0 {
        "Weiblich / Female"
    } else {
        "Doesn't matter"
    };
    MenteeProfile {
        id: id.to_string(),
        gender: Some(if id % 2 == 0 { "Female" } else { "Male" }.to_string()),
        desired_mentor_gender: Some(desired.to_string()),
        birth_date: Some(format!("{}-06-15", 1990 + (id % 12))),
        location: Some("Zurich".to_string()),
        german: Some(if id % 4 == 0 { "A2" } else { "B2" }.to_string()),
        english: Some("C1".to_string()),
        other_languages: Some("French (B1)".to_string()),
        desired_studies: Some(
            if id % 2 == 0 {
                "Computer Science"
            } else {
                "Medicine"
            }
            .to_string(),
        ),
        study_motivation: Some("I am not sure what I want to study".to_string()),
        previous_studies: Some("Bachelor".to_string()),
        last_degree: Some("BSc, Sarajevo".to_string()),
    }
}

fn create_mentor(id: usize) -> MentorProfile {
    MentorProfile {
        id: (1000 + id).to_string(),
        gender: Some(
            if id % 2 == 0 {
                "Weiblich / Female"
            } else {
                "Männlich / Male"
            }
            .to_string(),
        ),
        birth_date: Some(format!("{}-03-01", 1985 + (id % 15))),
        location: Some("Bern".to_string()),
        german: Some("Muttersprache".to_string()),
        english: Some(if id % 3 == 0 { "B2" } else { "C1" }.to_string()),
        other_languages: Some("Italian (B2)".to_string()),
        study_field: Some(
            if id % 2 == 0 {
                "Computer Science"
            } else {
                "Medicine"
            }
            .to_string(),
        ),
        study_level: Some(if id % 3 == 0 { "PhD" } else { "Master" }.to_string()),
        guidance: Some("Yes, I feel confident".to_string()),
    }
}

fn create_cohorts(mentee_count: usize) -> (Vec<MenteeProfile>, Vec<MentorProfile>) {
    let mentees = (0..mentee_count).map(create_mentee).collect();
    let mentors = (0..mentee_count / 2 + 1).map(create_mentor).collect();
    (mentees, mentors)
}

fn synthetic_distances(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
) -> BTreeMap<PairKey, f64> {
    let mut distances = BTreeMap::new();
    for (i, mentee) in mentees.iter().enumerate() {
        for (j, mentor) in mentors.iter().enumerate() {
            let km = ((i * 7 + j * 13) % 190) as f64;
            distances.insert(PairKey::new(mentee.id.as_str(), mentor.id.as_str()), km);
        }
    }
    distances
}

fn score_all(
    mentees: &[MenteeProfile],
    mentors: &[MentorProfile],
    distances: &BTreeMap<PairKey, f64>,
) -> CriteriaScores {
    let mut scores = CriteriaScores::new();
    scores.insert(
        criteria::GENDER.to_string(),
        gender::score_cohorts(mentees, mentors, 1.0),
    );
    scores.insert(
        criteria::LANGUAGES.to_string(),
        languages::score_cohorts(mentees, mentors, 1.0),
    );
    scores.insert(
        criteria::ACADEMIA.to_string(),
        academia::score_cohorts(mentees, mentors, 1.0),
    );
    scores.insert(
        criteria::AGE_DIFFERENCE.to_string(),
        age::score_cohorts(mentees, mentors, REFERENCE_YEAR, 30.0, 1.0),
    );
    scores.insert(
        criteria::GEOGRAPHIC_PROXIMITY.to_string(),
        proximity::score_cohorts(mentees, mentors, distances, 200.0, 1.0),
    );
    scores
}

fn bench_haversine(c: &mut Criterion) {
    let zurich = Coordinates {
        lat: 47.3769,
        lon: 8.5417,
    };
    let geneva = Coordinates {
        lat: 46.2044,
        lon: 6.1432,
    };

    c.bench_function("haversine_km", |b| {
        b.iter(|| haversine_km(black_box(zurich), black_box(geneva)));
    });
}

fn bench_criteria_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");

    for mentee_count in [10, 50, 100].iter() {
        let (mentees, mentors) = create_cohorts(*mentee_count);
        let distances = synthetic_distances(&mentees, &mentors);

        group.bench_with_input(
            BenchmarkId::new("score_all", mentee_count),
            mentee_count,
            |b, _| {
                b.iter(|| {
                    score_all(
                        black_box(&mentees),
                        black_box(&mentors),
                        black_box(&distances),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_matching_run(c: &mut Criterion) {
    let engine = MatchEngine::new(MatchWeights::default());
    let no_overrides: Vec<String> = Vec::new();

    let mut group = c.benchmark_group("matching");

    for mentee_count in [10, 50, 100].iter() {
        let (mentees, mentors) = create_cohorts(*mentee_count);
        let distances = synthetic_distances(&mentees, &mentors);
        let criteria_scores = score_all(&mentees, &mentors, &distances);

        group.bench_with_input(
            BenchmarkId::new("engine_run", mentee_count),
            mentee_count,
            |b, _| {
                b.iter(|| {
                    engine.run(
                        black_box(&criteria_scores),
                        black_box(&no_overrides),
                        black_box(&no_overrides),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let (mentees, mentors) = create_cohorts(100);
    let distances = synthetic_distances(&mentees, &mentors);
    let criteria_scores = score_all(&mentees, &mentors, &distances);
    let records = aggregate(
        &criteria_scores,
        &MatchWeights::default(),
        &Overrides::default(),
    )
    .unwrap();

    c.bench_function("solve_100_mentees", |b| {
        b.iter(|| solve(black_box(&records)));
    });
}

criterion_group!(
    benches,
    bench_haversine,
    bench_criteria_scoring,
    bench_matching_run,
    bench_solve
);

criterion_main!(benches);
