use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub job_description_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub filename: String,
    pub matching_score: f64,
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub remarks: String,
    /// Position within the batch that stored it; 0 is the best match.
    pub rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One persisted batch run. The best match is the batch's first (highest scored) entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchingSessionRow {
    pub id: Uuid,
    pub job_description_id: Uuid,
    pub total_candidates: i32,
    pub best_match_score: f64,
    pub best_match_candidate_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
