//! PostgreSQL persistence for job descriptions, candidates and matching sessions.
//!
//! `MatchStore` is built once in `main` and carried in `AppState`. Matching never
//! depends on it: callers log persistence failures and still return results.

pub mod handlers;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::matching::profiles::{BatchMatchEntry, NOT_SPECIFIED};
use crate::models::candidate::{CandidateRow, MatchingSessionRow};
use crate::models::job_description::JobDescriptionRow;

const UNKNOWN_CANDIDATE: &str = "Unknown";
const CONTACT_EMAIL_DOMAIN: &str = "example.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDescriptionSource {
    Upload,
    ManualInput,
    AiGenerated,
}

impl JobDescriptionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobDescriptionSource::Upload => "upload",
            JobDescriptionSource::ManualInput => "manual_input",
            JobDescriptionSource::AiGenerated => "ai_generated",
        }
    }
}

/// Contact details a client may attach to a resume, keyed by its filename.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContact {
    pub filename: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataSummary {
    pub total_job_descriptions: i64,
    pub total_candidates: i64,
    pub total_sessions: i64,
    pub job_descriptions: Vec<JobDescriptionRow>,
    pub candidates: Vec<CandidateRow>,
    pub sessions: Vec<MatchingSessionRow>,
}

#[derive(Clone)]
pub struct MatchStore {
    pool: PgPool,
}

impl MatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save_job_description(
        &self,
        text: &str,
        source: JobDescriptionSource,
        filename: Option<&str>,
        metadata: &Value,
    ) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO job_descriptions (id, job_description, source, filename, metadata)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(source.as_str())
        .bind(filename)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        info!("Job description saved with ID: {id}");
        Ok(id)
    }

    pub async fn get_job_description(
        &self,
        id: Uuid,
    ) -> Result<Option<JobDescriptionRow>, sqlx::Error> {
        sqlx::query_as::<_, JobDescriptionRow>("SELECT * FROM job_descriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_job_descriptions(&self) -> Result<Vec<JobDescriptionRow>, sqlx::Error> {
        sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT * FROM job_descriptions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Stores one candidate per entry plus a session record, in one transaction.
    /// `entries` must already be ranked; entry 0 is recorded as the best match.
    /// `contacts` is indexed by input position (see `contacts_by_position`).
    pub async fn save_batch(
        &self,
        job_description_id: Uuid,
        entries: &[BatchMatchEntry],
        contacts: &[Option<CandidateContact>],
    ) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut best_match_candidate_id = None;

        for (rank, entry) in entries.iter().enumerate() {
            let supplied = contacts.get(entry.input_index).and_then(Option::as_ref);
            let contact = resolve_contact(entry, supplied);
            let candidate_id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO candidates
                    (id, job_description_id, name, email, phone, filename,
                     matching_score, matching_skills, missing_skills, remarks, rank)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(candidate_id)
            .bind(job_description_id)
            .bind(&contact.name)
            .bind(&contact.email)
            .bind(&contact.phone)
            .bind(&entry.filename)
            .bind(entry.result.score)
            .bind(&entry.result.matching_skills)
            .bind(&entry.result.missing_skills)
            .bind(&entry.result.remarks)
            .bind(rank as i32)
            .execute(&mut *tx)
            .await?;

            best_match_candidate_id.get_or_insert(candidate_id);
        }

        let session_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO matching_sessions
                (id, job_description_id, total_candidates, best_match_score, best_match_candidate_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session_id)
        .bind(job_description_id)
        .bind(entries.len() as i32)
        .bind(entries.first().map(|e| e.result.score).unwrap_or(0.0))
        .bind(best_match_candidate_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Saved {} candidates and session {session_id} for job description {job_description_id}",
            entries.len()
        );
        Ok(session_id)
    }

    pub async fn list_candidates_for_job(
        &self,
        job_description_id: Uuid,
    ) -> Result<Vec<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT * FROM candidates
            WHERE job_description_id = $1
            ORDER BY matching_score DESC, created_at, rank
            "#,
        )
        .bind(job_description_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn list_candidates(&self) -> Result<Vec<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn list_sessions(&self) -> Result<Vec<MatchingSessionRow>, sqlx::Error> {
        sqlx::query_as::<_, MatchingSessionRow>(
            "SELECT * FROM matching_sessions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn summary(&self) -> Result<DataSummary, sqlx::Error> {
        let job_descriptions = self.list_job_descriptions().await?;
        let candidates = self.list_candidates().await?;
        let sessions = self.list_sessions().await?;

        Ok(DataSummary {
            total_job_descriptions: job_descriptions.len() as i64,
            total_candidates: candidates.len() as i64,
            total_sessions: sessions.len() as i64,
            job_descriptions,
            candidates,
            sessions,
        })
    }
}

/// Supplied contact first, then what extraction found, then a guess from the filename.
pub fn resolve_contact(entry: &BatchMatchEntry, supplied: Option<&CandidateContact>) -> ResolvedContact {
    let (derived_name, derived_email) = contact_from_filename(&entry.filename);
    let profile = entry.resume_profile.as_ref();

    ResolvedContact {
        name: first_usable([supplied.and_then(|c| c.name.as_ref()), profile.map(|p| &p.name)])
            .unwrap_or(derived_name),
        email: first_usable([supplied.and_then(|c| c.email.as_ref()), profile.map(|p| &p.email)])
            .unwrap_or(derived_email),
        phone: first_usable([supplied.and_then(|c| c.phone.as_ref()), profile.map(|p| &p.phone)]),
    }
}

fn first_usable(candidates: [Option<&String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim())
        .find(|v| !v.is_empty() && *v != NOT_SPECIFIED)
        .map(str::to_string)
}

/// `jane_doe.pdf` → ("Jane Doe", "jane.doe@example.com").
pub fn contact_from_filename(filename: &str) -> (String, String) {
    let stem = filename.split('.').next().unwrap_or_default();
    let name = stem
        .replace(['_', '-'], " ")
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        return (
            UNKNOWN_CANDIDATE.to_string(),
            format!("unknown@{CONTACT_EMAIL_DOMAIN}"),
        );
    }

    let email = format!("{}@{CONTACT_EMAIL_DOMAIN}", name.to_lowercase().replace(' ', "."));
    (name, email)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Lines request-supplied contacts up with the request's resumes, one slot per
/// input position. A contact naming a filename takes the first free slot with that
/// filename, so repeated filenames each get their own contact. A contact without a
/// filename takes the slot at its own position.
pub fn contacts_by_position(
    filenames: &[String],
    contacts: &[CandidateContact],
) -> Vec<Option<CandidateContact>> {
    let mut slots: Vec<Option<CandidateContact>> = vec![None; filenames.len()];

    for (i, contact) in contacts.iter().enumerate() {
        let slot = match &contact.filename {
            Some(name) => (0..filenames.len())
                .find(|&pos| filenames[pos] == *name && slots[pos].is_none()),
            None => Some(i).filter(|&pos| pos < filenames.len() && slots[pos].is_none()),
        };
        if let Some(pos) = slot {
            slots[pos] = Some(contact.clone());
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profiles::{MatchResult, ResumeProfile};

    fn entry(filename: &str, profile: Option<ResumeProfile>) -> BatchMatchEntry {
        BatchMatchEntry {
            filename: filename.to_string(),
            result: MatchResult {
                score: 50.0,
                matching_skills: vec![],
                missing_skills: vec![],
                strengths: vec![],
                weaknesses: vec![],
                remarks: String::new(),
            },
            extracted_text: String::new(),
            resume_profile: profile,
            input_index: 0,
        }
    }

    #[test]
    fn test_contact_from_filename() {
        assert_eq!(
            contact_from_filename("jane_doe.pdf"),
            ("Jane Doe".to_string(), "jane.doe@example.com".to_string())
        );
        assert_eq!(contact_from_filename("JOHN-SMITH.docx").0, "John Smith");
        assert_eq!(contact_from_filename(".pdf").0, UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_supplied_contact_wins() {
        let supplied = CandidateContact {
            name: Some("Jane Q. Doe".to_string()),
            email: Some("jq@corp.com".to_string()),
            phone: Some("555-0100".to_string()),
            ..CandidateContact::default()
        };
        let contact = resolve_contact(&entry("jane_doe.pdf", None), Some(&supplied));
        assert_eq!(contact.name, "Jane Q. Doe");
        assert_eq!(contact.email, "jq@corp.com");
        assert_eq!(contact.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_extracted_profile_before_filename() {
        let profile = ResumeProfile {
            email: "jane@real.io".to_string(),
            ..ResumeProfile::default()
        };
        let contact = resolve_contact(&entry("jane_doe.pdf", Some(profile)), None);
        // name was "Not specified", so it comes from the filename
        assert_eq!(contact.name, "Jane Doe");
        assert_eq!(contact.email, "jane@real.io");
        assert!(contact.phone.is_none());
    }

    fn named(filename: Option<&str>, name: &str) -> CandidateContact {
        CandidateContact {
            filename: filename.map(str::to_string),
            name: Some(name.to_string()),
            ..CandidateContact::default()
        }
    }

    fn slot_names(slots: &[Option<CandidateContact>]) -> Vec<Option<&str>> {
        slots
            .iter()
            .map(|s| s.as_ref().and_then(|c| c.name.as_deref()))
            .collect()
    }

    #[test]
    fn test_contacts_by_filename_or_position() {
        let filenames = vec!["a.pdf".to_string(), "b.pdf".to_string()];
        let contacts = vec![named(None, "First"), named(Some("b.pdf"), "Bee")];

        let slots = contacts_by_position(&filenames, &contacts);
        assert_eq!(slot_names(&slots), vec![Some("First"), Some("Bee")]);
    }

    #[test]
    fn test_repeated_filenames_keep_their_own_contacts() {
        let filenames = vec!["resume.pdf".to_string(), "resume.pdf".to_string()];
        let contacts = vec![
            named(Some("resume.pdf"), "Ann"),
            named(Some("resume.pdf"), "Bob"),
        ];

        let slots = contacts_by_position(&filenames, &contacts);
        assert_eq!(slot_names(&slots), vec![Some("Ann"), Some("Bob")]);
    }

    #[test]
    fn test_unmatched_contacts_are_dropped() {
        let filenames = vec!["a.pdf".to_string()];
        let contacts = vec![named(Some("zzz.pdf"), "Ghost"), named(None, "Second")];

        let slots = contacts_by_position(&filenames, &contacts);
        assert_eq!(slot_names(&slots), vec![None]);
    }

    #[test]
    fn test_source_labels() {
        assert_eq!(JobDescriptionSource::ManualInput.as_str(), "manual_input");
        assert_eq!(JobDescriptionSource::AiGenerated.as_str(), "ai_generated");
    }
}
