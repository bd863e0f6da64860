use std::collections::{BTreeMap, BTreeSet};

use crate::models::{PairKey, PairRecord};

/// Select a one-to-one assignment over the valid pairs.
///
/// Deterministic greedy with repair: pairs are taken highest total first
/// (ties broken by ascending mentee id, then mentor id), then two repair
/// sweeps give any still-unmatched mentee or mentor its best remaining
/// counterpart. No mentee or mentor ever appears twice in the result.
pub fn solve(records: &BTreeMap<PairKey, PairRecord>) -> Vec<PairKey> {
    let mut candidates: Vec<(&PairKey, f64)> = records
        .iter()
        .filter(|(_, record)| record.valid)
        .map(|(key, record)| (key, record.total_score.rank()))
        .collect();

    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut matched_mentees: BTreeSet<&str> = BTreeSet::new();
    let mut matched_mentors: BTreeSet<&str> = BTreeSet::new();
    let mut selected: Vec<PairKey> = Vec::new();

    for (key, _) in &candidates {
        if !matched_mentees.contains(key.mentee.as_str())
            && !matched_mentors.contains(key.mentor.as_str())
        {
            matched_mentees.insert(key.mentee.as_str());
            matched_mentors.insert(key.mentor.as_str());
            selected.push((*key).clone());
        }
    }

    // Repair sweeps. After the greedy pass no valid pair has both endpoints
    // free, so these only matter for participants whose every counterpart
    // was taken; they keep the coverage guarantee explicit all the same.
    let mentees: BTreeSet<&str> = candidates
        .iter()
        .map(|(key, _)| key.mentee.as_str())
        .collect();
    let mentors: BTreeSet<&str> = candidates
        .iter()
        .map(|(key, _)| key.mentor.as_str())
        .collect();

    for mentee in &mentees {
        if matched_mentees.contains(mentee) {
            continue;
        }
        let found = candidates.iter().find(|(key, _)| {
            key.mentee == *mentee && !matched_mentors.contains(key.mentor.as_str())
        });
        if let Some((key, _)) = found {
            matched_mentees.insert(key.mentee.as_str());
            matched_mentors.insert(key.mentor.as_str());
            selected.push((*key).clone());
        }
    }

    for mentor in &mentors {
        if matched_mentors.contains(mentor) {
            continue;
        }
        let found = candidates.iter().find(|(key, _)| {
            key.mentor == *mentor && !matched_mentees.contains(key.mentee.as_str())
        });
        if let Some((key, _)) = found {
            matched_mentees.insert(key.mentee.as_str());
            matched_mentors.insert(key.mentor.as_str());
            selected.push((*key).clone());
        }
    }

    selected.sort();
    selected
}
