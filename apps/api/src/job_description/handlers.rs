//! Axum route handlers for the Job Description API.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::documents::extract_text;
use crate::errors::AppError;
use crate::job_description::{
    generate_job_description, GenerateJobDescriptionRequest, GenerationSource,
};
use crate::state::{AppState, ProviderParams};
use crate::store::JobDescriptionSource;

const MIN_JOB_DESCRIPTION_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct JobDescriptionInput {
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionResponse {
    pub job_description: String,
    /// `None` when the record could not be stored.
    pub job_description_id: Option<Uuid>,
    pub metadata: Value,
}

/// POST /api/v1/job-description/input
pub async fn handle_input(
    State(state): State<AppState>,
    Json(input): Json<JobDescriptionInput>,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    let text = input.job_description.trim();
    if text.chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Job description must be at least {MIN_JOB_DESCRIPTION_CHARS} characters long"
        )));
    }

    let metadata = json!({
        "source": JobDescriptionSource::ManualInput.as_str(),
        "character_count": text.chars().count(),
        "word_count": text.split_whitespace().count(),
    });
    let job_description_id =
        persist(&state, text, JobDescriptionSource::ManualInput, None, &metadata).await;

    Ok(Json(JobDescriptionResponse {
        job_description: text.to_string(),
        job_description_id,
        metadata,
    }))
}

/// POST /api/v1/job-description/upload
///
/// Multipart with a single `file` part (.pdf, .docx or .txt).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes.to_vec()));
        }
    }
    let (filename, bytes) =
        upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let size = bytes.len();

    let name = filename.clone();
    let text = tokio::task::spawn_blocking(move || extract_text(&bytes, &name))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "No text could be extracted from {filename}"
        )));
    }
    info!("Extracted {} characters from {filename}", text.len());

    let metadata = json!({
        "source": JobDescriptionSource::Upload.as_str(),
        "filename": filename,
        "file_size": size,
        "character_count": text.chars().count(),
    });
    let job_description_id = persist(
        &state,
        &text,
        JobDescriptionSource::Upload,
        Some(&filename),
        &metadata,
    )
    .await;

    Ok(Json(JobDescriptionResponse {
        job_description: text,
        job_description_id,
        metadata,
    }))
}

/// POST /api/v1/job-description/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Query(params): Query<ProviderParams>,
    Json(request): Json<GenerateJobDescriptionRequest>,
) -> Result<Json<JobDescriptionResponse>, AppError> {
    if request.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title is required".to_string()));
    }

    let provider = state.provider_for(&params);
    let generated = generate_job_description(&request, provider).await;

    let metadata = json!({
        "source": JobDescriptionSource::AiGenerated.as_str(),
        "generated_by": match generated.source {
            GenerationSource::Model => "model",
            GenerationSource::Template => "template",
        },
        "request": request,
    });
    let job_description_id = persist(
        &state,
        &generated.text,
        JobDescriptionSource::AiGenerated,
        None,
        &metadata,
    )
    .await;

    Ok(Json(JobDescriptionResponse {
        job_description: generated.text,
        job_description_id,
        metadata,
    }))
}

async fn persist(
    state: &AppState,
    text: &str,
    source: JobDescriptionSource,
    filename: Option<&str>,
    metadata: &Value,
) -> Option<Uuid> {
    match state
        .store
        .save_job_description(text, source, filename, metadata)
        .await
    {
        Ok(id) => Some(id),
        Err(e) => {
            error!("Failed to save job description: {e}");
            None
        }
    }
}
