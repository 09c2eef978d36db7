//! Outreach email composition from batch matching results.
//!
//! With a provider the email is written by the model from a condensed matching
//! summary. Malformed model output keeps the raw text as the body. Without a
//! provider, or when the call fails, a fixed template is used.

pub mod handlers;
pub mod prompts;

use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::json::{excerpt, parse_json_object};
use crate::llm_client::{GenerationOptions, Prompt, TextProvider};
use crate::matching::profiles::{BatchMatchEntry, NOT_SPECIFIED};
use crate::matching::MatchError;

use self::prompts::{INTERVIEW_EMAIL_PROMPT, REJECTION_EMAIL_PROMPT};

const EMAIL_TEMPERATURE: f32 = 0.7;
/// Leading characters of the job description searched for a title.
const TITLE_SEARCH_CHARS: usize = 500;
const DEFAULT_JOB_TITLE: &str = "the position";
const NO_SUMMARY: &str = "No detailed matching analysis available.";

static JOB_TITLE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:position|role|title)[:.]?[ \t]*([A-Za-z][A-Za-z \t]*)")
        .unwrap_or_else(|e| panic!("{e}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
    Interview,
    Rejection,
}

impl FromStr for EmailType {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interview" => Ok(EmailType::Interview),
            "rejection" => Ok(EmailType::Rejection),
            _ => Err(MatchError::InputValidation(
                "email_type must be either 'interview' or 'rejection'".to_string(),
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// What the email may say about the match. Built from a `BatchMatchEntry` or sent
/// by the client directly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MatchingSummary {
    pub matching_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub remarks: String,
    pub experience_years: Option<u32>,
    pub relevant_experience: Option<String>,
    pub education: Option<String>,
    pub strengths: Vec<String>,
}

impl MatchingSummary {
    pub fn from_entry(entry: &BatchMatchEntry) -> Self {
        let profile = entry.resume_profile.as_ref();
        Self {
            matching_skills: entry.result.matching_skills.clone(),
            missing_skills: entry.result.missing_skills.clone(),
            remarks: entry.result.remarks.clone(),
            experience_years: profile.map(|p| p.experience_years),
            relevant_experience: profile.map(|p| p.relevant_experience.clone()),
            education: profile
                .map(|p| p.education.clone())
                .filter(|e| e != NOT_SPECIFIED),
            strengths: profile
                .map(|p| p.strengths.clone())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| entry.result.strengths.clone()),
        }
    }

    /// Human-readable block embedded in the prompt and returned as insights.
    pub fn render(&self) -> String {
        let mut parts = Vec::new();
        if !self.matching_skills.is_empty() {
            parts.push(format!("Matching Skills: {}", join_first(&self.matching_skills, 5)));
        }
        if let Some(years) = self.experience_years.filter(|y| *y > 0) {
            parts.push(format!("Experience: {years} years"));
        }
        if let Some(relevant) = self.relevant_experience.as_deref().filter(|r| !r.is_empty()) {
            parts.push(format!("Relevant Experience: {relevant}"));
        }
        if let Some(education) = self.education.as_deref().filter(|e| !e.is_empty()) {
            parts.push(format!("Education: {education}"));
        }
        if !self.strengths.is_empty() {
            parts.push(format!("Key Strengths: {}", join_first(&self.strengths, 3)));
        }
        if !self.missing_skills.is_empty() {
            parts.push(format!("Areas for Growth: {}", join_first(&self.missing_skills, 3)));
        }
        if !self.remarks.is_empty() {
            parts.push(format!("Analysis: {}", self.remarks));
        }

        if parts.is_empty() {
            NO_SUMMARY.to_string()
        } else {
            parts.join("\n")
        }
    }
}

fn join_first(items: &[String], max: usize) -> String {
    items.iter().take(max).cloned().collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateInfo {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub matching_summary: Option<MatchingSummary>,
}

pub(crate) fn default_company() -> String {
    "Our Company".to_string()
}

pub(crate) fn default_manager() -> String {
    "Hiring Manager".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub candidate_info: CandidateInfo,
    pub job_description: String,
    pub email_type: String,
    #[serde(default = "default_company")]
    pub company_name: String,
    #[serde(default = "default_manager")]
    pub hiring_manager_name: String,
    #[serde(default)]
    pub job_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposedEmail {
    #[serde(rename = "email_subject")]
    pub subject: String,
    #[serde(rename = "email_body")]
    pub body: String,
    pub candidate_name: String,
    pub email_type: EmailType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalized_insights: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

pub async fn compose_email(
    request: &EmailRequest,
    provider: Option<Arc<dyn TextProvider>>,
) -> Result<ComposedEmail, MatchError> {
    let email_type: EmailType = request.email_type.parse()?;
    let job_title = request
        .job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| infer_job_title(&request.job_description));

    info!(
        "Composing {:?} email for {}",
        email_type, request.candidate_info.name
    );

    let Some(provider) = provider else {
        return Ok(template_email(request, email_type));
    };

    let insights = request
        .candidate_info
        .matching_summary
        .as_ref()
        .map(MatchingSummary::render)
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    let template = match email_type {
        EmailType::Interview => INTERVIEW_EMAIL_PROMPT,
        EmailType::Rejection => REJECTION_EMAIL_PROMPT,
    };
    let prompt = template
        .replace("{candidate_name}", &request.candidate_info.name)
        .replace("{candidate_email}", &request.candidate_info.email)
        .replace("{score}", &request.candidate_info.score.to_string())
        .replace("{matching_summary}", &insights)
        .replace("{job_title}", &job_title)
        .replace("{company_name}", &request.company_name)
        .replace("{manager_name}", &request.hiring_manager_name);

    let raw = match provider
        .generate(
            Prompt::from(prompt),
            GenerationOptions::with_temperature(EMAIL_TEMPERATURE),
        )
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Email generation via {} failed, using template: {e}", provider.name());
            return Ok(template_email(request, email_type));
        }
    };

    let fallback_subject = format!("{} - {job_title}", subject_prefix(email_type));
    let (subject, body) = match parse_json_object(&raw) {
        Ok(root) => (
            text_field(root.get("subject")).unwrap_or(fallback_subject),
            text_field(root.get("body")).unwrap_or_else(|| raw.trim().to_string()),
        ),
        Err(e) => {
            warn!("Email output was not JSON ({}), using raw text: {}", e.reason, excerpt(&raw, 200));
            (fallback_subject, raw.trim().to_string())
        }
    };

    Ok(ComposedEmail {
        subject,
        body,
        candidate_name: request.candidate_info.name.clone(),
        email_type,
        personalized_insights: Some(insights),
    })
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn subject_prefix(email_type: EmailType) -> &'static str {
    match email_type {
        EmailType::Interview => "Interview Invitation",
        EmailType::Rejection => "Application Update",
    }
}

/// Title from a `position:` / `role:` / `title:` hint near the top of the description.
pub fn infer_job_title(job_description: &str) -> String {
    let head: String = job_description.chars().take(TITLE_SEARCH_CHARS).collect();
    JOB_TITLE_HINT
        .captures(&head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_JOB_TITLE.to_string())
}

fn template_email(request: &EmailRequest, email_type: EmailType) -> ComposedEmail {
    let name = &request.candidate_info.name;
    let company = &request.company_name;
    let manager = &request.hiring_manager_name;

    let (subject, body) = match email_type {
        EmailType::Interview => (
            format!("Interview Opportunity at {company}"),
            format!(
                "Dear {name},\n\n\
                 Thank you for your interest in our position. We were impressed with your \
                 background and would like to invite you for an interview.\n\n\
                 We believe your skills and experience align well with what we're looking for. \
                 Please let us know your availability for a call.\n\n\
                 Best regards,\n{manager}\n{company}"
            ),
        ),
        EmailType::Rejection => (
            format!("Update on Your Application to {company}"),
            format!(
                "Dear {name},\n\n\
                 Thank you for your interest in our position and for taking the time to apply.\n\n\
                 After careful consideration, we have decided to move forward with another \
                 candidate whose qualifications more closely match our current needs.\n\n\
                 We appreciate your interest and wish you success in your job search.\n\n\
                 Best regards,\n{manager}\n{company}"
            ),
        ),
    };

    ComposedEmail {
        subject,
        body,
        candidate_name: name.clone(),
        email_type,
        personalized_insights: None,
    }
}
