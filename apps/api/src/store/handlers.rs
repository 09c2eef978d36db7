//! Axum route handlers for the Database API. Read-only views over stored records.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRow, MatchingSessionRow};
use crate::models::job_description::JobDescriptionRow;
use crate::state::AppState;
use crate::store::DataSummary;

#[derive(Debug, Serialize)]
pub struct JobDescriptionsResponse {
    pub job_descriptions: Vec<JobDescriptionRow>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<CandidateRow>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<MatchingSessionRow>,
}

/// GET /api/v1/database/job-descriptions
pub async fn handle_list_job_descriptions(
    State(state): State<AppState>,
) -> Result<Json<JobDescriptionsResponse>, AppError> {
    let job_descriptions = state.store.list_job_descriptions().await?;
    Ok(Json(JobDescriptionsResponse { job_descriptions }))
}

/// GET /api/v1/database/job-descriptions/:id
pub async fn handle_get_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    let job_description = state
        .store
        .get_job_description(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))?;
    Ok(Json(job_description))
}

/// GET /api/v1/database/job-descriptions/:id/candidates
///
/// Candidates for one job description, best score first.
pub async fn handle_list_candidates_for_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let candidates = state.store.list_candidates_for_job(id).await?;
    Ok(Json(CandidatesResponse { candidates }))
}

/// GET /api/v1/database/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let candidates = state.store.list_candidates().await?;
    Ok(Json(CandidatesResponse { candidates }))
}

/// GET /api/v1/database/matching-sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, AppError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// GET /api/v1/database/summary
pub async fn handle_summary(State(state): State<AppState>) -> Result<Json<DataSummary>, AppError> {
    Ok(Json(state.store.summary().await?))
}
