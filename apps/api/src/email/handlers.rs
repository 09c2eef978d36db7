//! Axum route handlers for the Email API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::email::{
    compose_email, default_company, default_manager, CandidateInfo, ComposedEmail, EmailRequest,
    MatchingSummary,
};
use crate::errors::AppError;
use crate::matching::profiles::BatchMatchEntry;
use crate::state::{AppState, ProviderParams};

#[derive(Debug, Deserialize)]
pub struct EmailWithMatchRequest {
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_description: String,
    pub email_type: String,
    pub company_name: Option<String>,
    pub hiring_manager_name: Option<String>,
    pub job_title: Option<String>,
    /// One entry of a `/resume-matching/match` response, passed back unmodified.
    pub matching_result: Option<BatchMatchEntry>,
}

/// POST /api/v1/email/generate
pub async fn handle_generate_email(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<ComposedEmail>, AppError> {
    let provider = state.provider_for(&params);
    let email = compose_email(&request, provider).await?;
    Ok(Json(email))
}

/// POST /api/v1/email/generate-with-matching
///
/// Same as `/email/generate`, but takes a batch entry and builds the summary from it.
pub async fn handle_generate_email_with_match(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<EmailWithMatchRequest>,
) -> Result<Json<ComposedEmail>, AppError> {
    let email_request = EmailRequest {
        candidate_info: CandidateInfo {
            name: request.candidate_name,
            email: request.candidate_email,
            score: request
                .matching_result
                .as_ref()
                .map(|m| m.result.score)
                .unwrap_or(0.0),
            matching_summary: request.matching_result.as_ref().map(MatchingSummary::from_entry),
        },
        job_description: request.job_description,
        email_type: request.email_type,
        company_name: request.company_name.unwrap_or_else(default_company),
        hiring_manager_name: request.hiring_manager_name.unwrap_or_else(default_manager),
        job_title: request.job_title,
    };

    let provider = state.provider_for(&params);
    let email = compose_email(&email_request, provider).await?;
    Ok(Json(email))
}
