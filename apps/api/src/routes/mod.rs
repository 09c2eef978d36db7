pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::email::handlers as email;
use crate::job_description::handlers as job_description;
use crate::matching::handlers as matching;
use crate::state::AppState;
use crate::store::handlers as database;

/// `max_upload_bytes` replaces axum's 2 MB body limit on the multipart upload routes.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume Matching API
        .route("/api/v1/resume-matching/match", post(matching::handle_match))
        .route(
            "/api/v1/resume-matching/upload",
            post(matching::handle_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/v1/resume-matching/parse-resume",
            post(matching::handle_parse_resume),
        )
        .route(
            "/api/v1/resume-matching/parse-job",
            post(matching::handle_parse_job),
        )
        .route("/api/v1/resume-matching/score", post(matching::handle_score))
        // Job Description API
        .route("/api/v1/job-description/input", post(job_description::handle_input))
        .route(
            "/api/v1/job-description/upload",
            post(job_description::handle_upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/api/v1/job-description/generate",
            post(job_description::handle_generate),
        )
        // Email API
        .route("/api/v1/email/generate", post(email::handle_generate_email))
        .route(
            "/api/v1/email/generate-with-matching",
            post(email::handle_generate_email_with_match),
        )
        // Database API
        .route(
            "/api/v1/database/job-descriptions",
            get(database::handle_list_job_descriptions),
        )
        .route(
            "/api/v1/database/job-descriptions/:id",
            get(database::handle_get_job_description),
        )
        .route(
            "/api/v1/database/job-descriptions/:id/candidates",
            get(database::handle_list_candidates_for_job),
        )
        .route("/api/v1/database/candidates", get(database::handle_list_candidates))
        .route(
            "/api/v1/database/matching-sessions",
            get(database::handle_list_sessions),
        )
        .route("/api/v1/database/summary", get(database::handle_summary))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
    use crate::llm_client::{ProviderRegistry, ProviderSettings};
    use crate::store::MatchStore;

    const BOUNDARY: &str = "recruiter-test-boundary";

    // Nothing here touches the database: no job_description_id, no AI.
    fn test_state() -> AppState {
        AppState {
            providers: ProviderRegistry::new(ProviderSettings::default(), "ollama".to_string())
                .unwrap(),
            store: MatchStore::new(
                PgPoolOptions::new()
                    .connect_lazy("postgres://localhost/recruiter_test")
                    .unwrap(),
            ),
        }
    }

    fn multipart_body(job_description: &str, resumes: &[(String, String)]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{job_description}\r\n"
        );
        for (filename, text) in resumes {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resumes\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{text}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body.into_bytes()
    }

    fn batch_of_resumes(count: usize, bytes_each: usize) -> Vec<(String, String)> {
        let line = "Python developer with 5 years of experience on AWS.\n";
        (0..count)
            .map(|i| (format!("candidate_{i}.txt"), line.repeat(bytes_each / line.len() + 1)))
            .collect()
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/resume-matching/upload?use_ai=false")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_accepts_batch_larger_than_axum_default() {
        let body = multipart_body(
            "Backend Engineer. Required skills: Python, AWS. 3 years of experience.",
            &batch_of_resumes(10, 300 * 1024),
        );
        assert!(body.len() > 2 * 1024 * 1024);

        let app = build_router(test_state(), DEFAULT_MAX_UPLOAD_BYTES);
        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_payload_too_large() {
        let body = multipart_body("Backend Engineer", &batch_of_resumes(3, 300 * 1024));

        let app = build_router(test_state(), 256 * 1024);
        let response = app.oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(), DEFAULT_MAX_UPLOAD_BYTES);
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
