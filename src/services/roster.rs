use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::core::push_warning;
use crate::models::{MenteeProfile, MentorProfile};

/// Column headers as they appear in the cohort spreadsheets.
pub mod columns {
    pub const MENTEE_ID: &str = "Mentee Number";
    pub const MENTEE_GENDER: &str = "Gender";
    pub const MENTEE_DESIRED_GENDER: &str = "Desired gender of mentor";
    pub const MENTEE_BIRTHDAY: &str = "Birthday";
    pub const MENTEE_RESIDENCE: &str = "Residence (city)";
    pub const MENTEE_GERMAN: &str = "German";
    pub const MENTEE_ENGLISH: &str = "English";
    pub const MENTEE_OTHER_LANGUAGES: &str = "Further language skills";
    pub const MENTEE_DESIRED_STUDIES: &str = "Desired Studies";
    pub const MENTEE_STUDY_MOTIVATION: &str = "Do you know if you want to study, and if yes, why? Do you know what you want to study, and if yes, what and why?";
    pub const MENTEE_PREVIOUS_STUDIES: &str = "Previous studies (level)";
    pub const MENTEE_LAST_DEGREE: &str = "Name and country of last degree";

    pub const MENTOR_ID: &str = "Mentor Number";
    pub const MENTOR_GENDER: &str = "Geschlecht / Gender";
    pub const MENTOR_BIRTH_DATE: &str = "Geburtsdatum / Date of birth";
    pub const MENTOR_ADDRESS: &str = "Postadresse / Postal address";
    pub const MENTOR_GERMAN: &str = "Sprachkenntnisse Deutsch / Language skills German";
    // The source sheets carry a trailing space in these two headers.
    pub const MENTOR_ENGLISH: &str = "Sprachkenntnisse Englisch / Language skills English ";
    pub const MENTOR_OTHER_LANGUAGES: &str = "Weitere Sprachkenntnisse / Other language skills ";
    pub const MENTOR_STUDY_FIELD: &str = "Aktueller oder zuletzt abgeschlossener Studiengang / Current or most recently completed course of study";
    pub const MENTOR_STUDY_LEVEL: &str = "Aktuelle oder zuletzt abgeschlossene Studienstufe / Current or most recently completed level of study";
    pub const MENTOR_GUIDANCE: &str = "Do you feel confident in navigating the Swiss university system?";
}

/// Errors that can occur while loading cohort tables
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster file not found: {0}")]
    NotFound(String),

    #[error("Failed to read roster: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Roster is missing the identifier column '{0}'")]
    MissingIdColumn(String),
}

type Row = BTreeMap<String, String>;

/// Load the mentee cohort from its application and interview tables.
pub fn load_mentees(
    application: &Path,
    interview: &Path,
    warnings: &mut Vec<String>,
) -> Result<Vec<MenteeProfile>, RosterError> {
    let rows = load_merged(application, interview, columns::MENTEE_ID, warnings)?;
    Ok(rows.into_iter().map(mentee_from_row).collect())
}

/// Load the mentor cohort from its application and interview tables.
pub fn load_mentors(
    application: &Path,
    interview: &Path,
    warnings: &mut Vec<String>,
) -> Result<Vec<MentorProfile>, RosterError> {
    let rows = load_merged(application, interview, columns::MENTOR_ID, warnings)?;
    Ok(rows.into_iter().map(mentor_from_row).collect())
}

fn load_merged(
    application: &Path,
    interview: &Path,
    id_column: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<Row>, RosterError> {
    let application_rows = read_table(application, id_column, warnings)?;
    let interview_rows = read_table(interview, id_column, warnings)?;
    Ok(merge_tables(application_rows, interview_rows, id_column))
}

/// Read a CSV table into rows keyed by header. Rows without a value in
/// the identifier column are skipped with a warning.
fn read_table(
    path: &Path,
    id_column: &str,
    warnings: &mut Vec<String>,
) -> Result<Vec<Row>, RosterError> {
    if !path.exists() {
        return Err(RosterError::NotFound(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|header| header == id_column) {
        return Err(RosterError::MissingIdColumn(id_column.to_string()));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();

        if row.get(id_column).map_or(true, |id| id.trim().is_empty()) {
            push_warning(
                warnings,
                format!(
                    "row {} of '{}' has no {} and was skipped",
                    index + 2,
                    path.display(),
                    id_column
                ),
            );
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Outer-join the two tables on the identifier column. Application
/// values win; interview values fill columns the application left empty.
/// Members present only in the interview table are appended.
fn merge_tables(application: Vec<Row>, interview: Vec<Row>, id_column: &str) -> Vec<Row> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: BTreeMap<String, Row> = BTreeMap::new();

    for row in application {
        let id = row[id_column].trim().to_string();
        if !merged.contains_key(&id) {
            order.push(id.clone());
        }
        merged.entry(id).or_insert(row);
    }

    for row in interview {
        let id = row[id_column].trim().to_string();
        match merged.get_mut(&id) {
            Some(existing) => {
                for (header, value) in row {
                    let current = existing.entry(header).or_default();
                    if current.trim().is_empty() {
                        *current = value;
                    }
                }
            }
            None => {
                order.push(id.clone());
                merged.insert(id, row);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|id| merged.remove(&id))
        .collect()
}

fn field(row: &Row, column: &str) -> Option<String> {
    row.get(column)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn mentee_from_row(row: Row) -> MenteeProfile {
    MenteeProfile {
        id: row
            .get(columns::MENTEE_ID)
            .map(|id| id.trim().to_string())
            .unwrap_or_default(),
        gender: field(&row, columns::MENTEE_GENDER),
        desired_mentor_gender: field(&row, columns::MENTEE_DESIRED_GENDER),
        birth_date: field(&row, columns::MENTEE_BIRTHDAY),
        location: field(&row, columns::MENTEE_RESIDENCE),
        german: field(&row, columns::MENTEE_GERMAN),
        english: field(&row, columns::MENTEE_ENGLISH),
        other_languages: field(&row, columns::MENTEE_OTHER_LANGUAGES),
        desired_studies: field(&row, columns::MENTEE_DESIRED_STUDIES),
        study_motivation: field(&row, columns::MENTEE_STUDY_MOTIVATION),
        previous_studies: field(&row, columns::MENTEE_PREVIOUS_STUDIES),
        last_degree: field(&row, columns::MENTEE_LAST_DEGREE),
    }
}

fn mentor_from_row(row: Row) -> MentorProfile {
    MentorProfile {
        id: row
            .get(columns::MENTOR_ID)
            .map(|id| id.trim().to_string())
            .unwrap_or_default(),
        gender: field(&row, columns::MENTOR_GENDER),
        birth_date: field(&row, columns::MENTOR_BIRTH_DATE),
        location: field(&row, columns::MENTOR_ADDRESS),
        german: field(&row, columns::MENTOR_GERMAN),
        english: field(&row, columns::MENTOR_ENGLISH),
        other_languages: field(&row, columns::MENTOR_OTHER_LANGUAGES),
        study_field: field(&row, columns::MENTOR_STUDY_FIELD),
        study_level: field(&row, columns::MENTOR_STUDY_LEVEL),
        guidance: field(&row, columns::MENTOR_GUIDANCE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_csv(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
        let path = dir.join(name);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        for row in rows {
            writer.write_record(*row).unwrap();
        }
        writer.flush().unwrap();
        path
    }

    #[test]
    fn test_load_mentees_merges_interview_into_application() {
        let dir = tempfile::tempdir().unwrap();
        let application = write_csv(
            dir.path(),
            "mentees.csv",
            &[
                &[columns::MENTEE_ID, columns::MENTEE_GENDER, columns::MENTEE_BIRTHDAY],
                &["1", "Female", ""],
                &["2", "Male", "1999"],
            ],
        );
        let interview = write_csv(
            dir.path(),
            "mentees_interview.csv",
            &[
                &[columns::MENTEE_ID, columns::MENTEE_BIRTHDAY, columns::MENTEE_RESIDENCE],
                &["1", "2001", "Zurich"],
                &["2", "1990", "Bern"],
            ],
        );

        let mut warnings = Vec::new();
        let mentees = load_mentees(&application, &interview, &mut warnings).unwrap();

        assert_eq!(mentees.len(), 2);
        assert_eq!(mentees[0].id, "1");
        assert_eq!(mentees[0].gender.as_deref(), Some("Female"));
        // Interview fills the empty birthday but never overrides one.
        assert_eq!(mentees[0].birth_date.as_deref(), Some("2001"));
        assert_eq!(mentees[1].birth_date.as_deref(), Some("1999"));
        assert_eq!(mentees[1].location.as_deref(), Some("Bern"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_members_only_in_interview_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let application = write_csv(
            dir.path(),
            "mentors.csv",
            &[
                &[columns::MENTOR_ID, columns::MENTOR_GENDER],
                &["10", "Female"],
            ],
        );
        let interview = write_csv(
            dir.path(),
            "mentors_interview.csv",
            &[
                &[columns::MENTOR_ID, columns::MENTOR_STUDY_LEVEL],
                &["10", "Master"],
                &["11", "PhD"],
            ],
        );

        let mut warnings = Vec::new();
        let mentors = load_mentors(&application, &interview, &mut warnings).unwrap();

        assert_eq!(mentors.len(), 2);
        assert_eq!(mentors[0].id, "10");
        assert_eq!(mentors[0].study_level.as_deref(), Some("Master"));
        assert_eq!(mentors[1].id, "11");
        assert_eq!(mentors[1].study_level.as_deref(), Some("PhD"));
        assert_eq!(mentors[1].gender, None);
    }

    #[test]
    fn test_rows_without_id_are_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let application = write_csv(
            dir.path(),
            "mentees.csv",
            &[
                &[columns::MENTEE_ID, columns::MENTEE_GENDER],
                &["1", "Female"],
                &["", "Male"],
            ],
        );
        let interview = write_csv(
            dir.path(),
            "mentees_interview.csv",
            &[&[columns::MENTEE_ID], &["1"]],
        );

        let mut warnings = Vec::new();
        let mentees = load_mentees(&application, &interview, &mut warnings).unwrap();

        assert_eq!(mentees.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("was skipped"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let interview = write_csv(
            dir.path(),
            "mentees_interview.csv",
            &[&[columns::MENTEE_ID], &["1"]],
        );

        let mut warnings = Vec::new();
        let result = load_mentees(&dir.path().join("absent.csv"), &interview, &mut warnings);

        assert!(matches!(result, Err(RosterError::NotFound(_))));
    }

    #[test]
    fn test_missing_id_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let application = write_csv(
            dir.path(),
            "mentees.csv",
            &[&["Name", "Gender"], &["Alice", "Female"]],
        );
        let interview = write_csv(
            dir.path(),
            "mentees_interview.csv",
            &[&[columns::MENTEE_ID], &["1"]],
        );

        let mut warnings = Vec::new();
        let result = load_mentees(&application, &interview, &mut warnings);

        assert!(matches!(result, Err(RosterError::MissingIdColumn(_))));
    }

    #[test]
    fn test_mentor_headers_with_trailing_space_are_read() {
        let dir = tempfile::tempdir().unwrap();
        let application = write_csv(
            dir.path(),
            "mentors.csv",
            &[
                &[
                    columns::MENTOR_ID,
                    columns::MENTOR_GERMAN,
                    columns::MENTOR_ENGLISH,
                    columns::MENTOR_OTHER_LANGUAGES,
                ],
                &["10", "Native speaker", "C1", "French (B2), Italian (A2)"],
            ],
        );
        let interview = write_csv(
            dir.path(),
            "mentors_interview.csv",
            &[&[columns::MENTOR_ID], &["10"]],
        );

        let mut warnings = Vec::new();
        let mentors = load_mentors(&application, &interview, &mut warnings).unwrap();

        assert_eq!(mentors[0].german.as_deref(), Some("Native speaker"));
        assert_eq!(mentors[0].english.as_deref(), Some("C1"));
        assert_eq!(
            mentors[0].other_languages.as_deref(),
            Some("French (B2), Italian (A2)")
        );
    }
}
