//! Axum route handlers for the Resume Matching API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::documents::extract_text_or_empty;
use crate::errors::AppError;
use crate::llm_client::TextProvider;
use crate::matching::batch::{match_batch, MAX_BATCH_SIZE};
use crate::matching::extractor::{extract_job, extract_resume};
use crate::matching::profiles::{BatchMatchEntry, JobProfile, MatchResult, ResumeProfile};
use crate::matching::scorer::score;
use crate::state::{AppState, ProviderParams};
use crate::store::{contacts_by_position, CandidateContact};

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub job_description: String,
    /// Stored job description to attach candidates to. Nothing is persisted without it.
    pub job_description_id: Option<Uuid>,
    pub resume_texts: Vec<String>,
    pub resume_filenames: Vec<String>,
    pub skills_keywords: Option<Vec<String>>,
    pub candidate_info: Option<Vec<CandidateContact>>,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub results: Vec<BatchMatchEntry>,
    pub best_match: Option<BatchMatchEntry>,
    pub total_candidates: usize,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ParseResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseJobRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub resume_text: String,
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub resume_profile: ResumeProfile,
    pub job_profile: JobProfile,
    #[serde(flatten)]
    pub result: MatchResult,
}

/// POST /api/v1/resume-matching/match
pub async fn handle_match(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    require_job_description(&request.job_description)?;
    let provider = state.provider_for(&params);

    let contacts = request.candidate_info.unwrap_or_default();
    run_batch(
        &state,
        provider,
        params.use_ai.unwrap_or(true),
        BatchInput {
            job_description: &request.job_description,
            job_description_id: request.job_description_id,
            resume_texts: &request.resume_texts,
            filenames: &request.resume_filenames,
            skills_keywords: request.skills_keywords.as_deref(),
            contacts: &contacts,
        },
    )
    .await
    .map(Json)
}

/// POST /api/v1/resume-matching/upload
///
/// Multipart: `job_description` text, one `resumes` part per file, optional
/// `skills_keywords` (comma-separated) and `job_description_id`. A file that cannot
/// be read is matched as empty text.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, AppError> {
    let mut job_description = String::new();
    let mut job_description_id = None;
    let mut skills_keywords = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => job_description = field.text().await?,
            "job_description_id" => {
                let raw = field.text().await?;
                let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                    AppError::Validation(format!("Invalid job_description_id: {raw}"))
                })?;
                job_description_id = Some(id);
            }
            "skills_keywords" => skills_keywords = Some(parse_keywords(&field.text().await?)),
            "resumes" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("resume_{}", files.len() + 1));
                let bytes = field.bytes().await?;
                files.push((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    require_job_description(&job_description)?;
    if files.is_empty() {
        return Err(AppError::Validation("No resumes uploaded".to_string()));
    }
    if files.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "Maximum {MAX_BATCH_SIZE} resumes allowed per batch, got {}",
            files.len()
        )));
    }

    let (filenames, resume_texts) = tokio::task::spawn_blocking(move || {
        files
            .into_iter()
            .map(|(filename, bytes)| {
                let text = extract_text_or_empty(&bytes, &filename);
                (filename, text)
            })
            .unzip::<_, _, Vec<String>, Vec<String>>()
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;
    info!("Extracted text from {} uploaded resumes", filenames.len());

    let provider = state.provider_for(&params);
    run_batch(
        &state,
        provider,
        params.use_ai.unwrap_or(true),
        BatchInput {
            job_description: &job_description,
            job_description_id,
            resume_texts: &resume_texts,
            filenames: &filenames,
            skills_keywords: skills_keywords.as_deref(),
            contacts: &[],
        },
    )
    .await
    .map(Json)
}

/// POST /api/v1/resume-matching/parse-resume
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<ParseResumeRequest>,
) -> Result<Json<ResumeProfile>, AppError> {
    let provider = state.provider_for(&params);
    Ok(Json(extract_resume(&request.resume_text, provider).await))
}

/// POST /api/v1/resume-matching/parse-job
pub async fn handle_parse_job(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<ParseJobRequest>,
) -> Result<Json<JobProfile>, AppError> {
    require_job_description(&request.job_description)?;
    let provider = state.provider_for(&params);
    Ok(Json(extract_job(&request.job_description, provider).await))
}

/// POST /api/v1/resume-matching/score
///
/// Scores a single pair without persisting anything.
pub async fn handle_score(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    require_job_description(&request.job_description)?;
    let provider = state.provider_for(&params);

    let resume_profile = extract_resume(&request.resume_text, provider.clone()).await;
    let job_profile = extract_job(&request.job_description, provider.clone()).await;
    let result = score(
        &resume_profile,
        &job_profile,
        &request.resume_text,
        &request.job_description,
        provider,
    )
    .await;

    Ok(Json(ScoreResponse {
        resume_profile,
        job_profile,
        result,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Shared
// ────────────────────────────────────────────────────────────────────────────

struct BatchInput<'a> {
    job_description: &'a str,
    job_description_id: Option<Uuid>,
    resume_texts: &'a [String],
    filenames: &'a [String],
    skills_keywords: Option<&'a [String]>,
    contacts: &'a [CandidateContact],
}

async fn run_batch(
    state: &AppState,
    provider: Option<Arc<dyn TextProvider>>,
    use_ai: bool,
    input: BatchInput<'_>,
) -> Result<MatchResponse, AppError> {
    let skills_keywords = normalize_keywords(input.skills_keywords.unwrap_or_default());
    let results = match_batch(
        input.resume_texts,
        input.filenames,
        input.job_description,
        provider,
        use_ai,
        Some(skills_keywords.as_slice()).filter(|skills| !skills.is_empty()),
    )
    .await?;

    let mut session_id = None;
    if let Some(job_description_id) = input.job_description_id {
        let contacts = contacts_by_position(input.filenames, input.contacts);
        match state
            .store
            .save_batch(job_description_id, &results, &contacts)
            .await
        {
            Ok(id) => session_id = Some(id),
            Err(e) => error!("Failed to save matching results for {job_description_id}: {e}"),
        }
    }

    Ok(MatchResponse {
        best_match: results.first().cloned(),
        total_candidates: results.len(),
        results,
        session_id,
    })
}

fn require_job_description(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("job_description is required".to_string()));
    }
    Ok(())
}

/// Comma-separated keywords, trimmed, empties dropped.
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trims each keyword and drops the blank ones.
fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
