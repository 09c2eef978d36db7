//! Profile and result records for the matching pipeline.
//!
//! Every record is fully populated: absent data becomes the documented default,
//! never a missing field. Model output is read field-by-field through lenient
//! accessors, so a string where a number was expected (or the reverse) degrades
//! to the default instead of rejecting the whole object.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::llm_client::json::MalformedOutput;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const DEFAULT_REMARKS: &str = "Analysis completed.";
/// Upper bound on strengths/weaknesses carried in a result.
pub const MAX_PREVIEW_ITEMS: usize = 5;

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub certifications: Vec<String>,
    pub experience_years: u32,
    pub relevant_experience: String,
    pub companies: Vec<String>,
    pub roles: Vec<String>,
    pub education: String,
    pub university: String,
    pub graduation_year: String,
    pub summary: String,
    pub strengths: Vec<String>,
}

impl Default for ResumeProfile {
    fn default() -> Self {
        Self {
            name: not_specified(),
            email: not_specified(),
            phone: not_specified(),
            location: not_specified(),
            technical_skills: vec![],
            soft_skills: vec![],
            certifications: vec![],
            experience_years: 0,
            relevant_experience: String::new(),
            companies: vec![],
            roles: vec![],
            education: not_specified(),
            university: not_specified(),
            graduation_year: not_specified(),
            summary: String::new(),
            strengths: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobProfile {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub required_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    pub experience_years: u32,
    pub responsibilities: Vec<String>,
    pub required_qualifications: Vec<String>,
    pub preferred_qualifications: Vec<String>,
}

impl Default for JobProfile {
    fn default() -> Self {
        Self {
            job_title: not_specified(),
            company: not_specified(),
            location: not_specified(),
            employment_type: not_specified(),
            required_skills: vec![],
            nice_to_have_skills: vec![],
            experience_years: 0,
            responsibilities: vec![],
            required_qualifications: vec![],
            preferred_qualifications: vec![],
        }
    }
}

/// Outcome of scoring one resume against one job. `score` is always within [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: f64,
    #[serde(default)]
    pub matching_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub remarks: String,
}

/// One ranked row of a batch, handed unmodified to persistence and email composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMatchEntry {
    pub filename: String,
    #[serde(flatten)]
    pub result: MatchResult,
    /// Preview of the source text, at most `EXTRACTED_TEXT_PREVIEW_CHARS` characters.
    pub extracted_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_profile: Option<ResumeProfile>,
    /// Position of the resume in the request. Ranking leaves it unchanged.
    #[serde(skip)]
    pub input_index: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Mapping from model JSON
// ────────────────────────────────────────────────────────────────────────────

impl ResumeProfile {
    /// Maps the nested extraction shape (personal_info / experience / skills /
    /// education) onto the flat profile.
    pub fn from_model_json(root: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let personal = root.get("personal_info");
        let experience = root.get("experience");
        let skills = root.get("skills");
        let education = root.get("education");

        Self {
            name: text_at(personal, "name").unwrap_or(defaults.name),
            email: text_at(personal, "email").unwrap_or(defaults.email),
            phone: text_at(personal, "phone").unwrap_or(defaults.phone),
            location: text_at(personal, "location").unwrap_or(defaults.location),
            technical_skills: list_at(skills, "technical_skills"),
            soft_skills: list_at(skills, "soft_skills"),
            certifications: list_at(skills, "certifications"),
            experience_years: years_at(experience, "total_years"),
            relevant_experience: text_at(experience, "relevant_experience").unwrap_or_default(),
            companies: list_at(experience, "companies"),
            roles: list_at(experience, "roles"),
            education: text_at(education, "highest_degree").unwrap_or(defaults.education),
            university: text_at(education, "university").unwrap_or(defaults.university),
            graduation_year: text_at(education, "year").unwrap_or(defaults.graduation_year),
            summary: root
                .get("professional_summary")
                .and_then(as_text)
                .unwrap_or_default(),
            strengths: root.get("strengths").map(as_list).unwrap_or_default(),
        }
    }
}

impl JobProfile {
    pub fn from_model_json(root: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let requirements = root.get("requirements");
        let qualifications = root.get("qualifications");
        let company_info = root.get("company_info");

        Self {
            job_title: root
                .get("job_title")
                .and_then(as_text)
                .unwrap_or(defaults.job_title),
            company: text_at(company_info, "company_name").unwrap_or(defaults.company),
            location: text_at(company_info, "location").unwrap_or(defaults.location),
            employment_type: text_at(company_info, "employment_type")
                .unwrap_or(defaults.employment_type),
            required_skills: list_at(requirements, "required_skills"),
            nice_to_have_skills: list_at(requirements, "nice_to_have_skills"),
            experience_years: years_at(requirements, "years_of_experience"),
            responsibilities: root.get("responsibilities").map(as_list).unwrap_or_default(),
            required_qualifications: list_at(qualifications, "required"),
            preferred_qualifications: list_at(qualifications, "preferred"),
        }
    }
}

impl MatchResult {
    /// Reads a scoring response. A missing or non-numeric `score` makes the object
    /// unusable; an out-of-range score is clamped to [0, 100].
    pub fn from_model_json(root: &Map<String, Value>) -> Result<Self, MalformedOutput> {
        let raw_score = root.get("score").and_then(as_number).ok_or_else(|| {
            MalformedOutput::new(
                "score missing or not numeric",
                &Value::Object(root.clone()).to_string(),
            )
        })?;

        let mut strengths = root.get("strengths").map(as_list).unwrap_or_default();
        strengths.truncate(MAX_PREVIEW_ITEMS);
        let mut weaknesses = root.get("weaknesses").map(as_list).unwrap_or_default();
        weaknesses.truncate(MAX_PREVIEW_ITEMS);

        Ok(Self {
            score: clamp_score(raw_score),
            matching_skills: root.get("matching_skills").map(as_list).unwrap_or_default(),
            missing_skills: root.get("missing_skills").map(as_list).unwrap_or_default(),
            strengths,
            weaknesses,
            remarks: root
                .get("remarks")
                .and_then(as_text)
                .unwrap_or_else(|| DEFAULT_REMARKS.to_string()),
        })
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Lenient accessors
// ────────────────────────────────────────────────────────────────────────────

fn text_at(parent: Option<&Value>, key: &str) -> Option<String> {
    parent.and_then(|p| p.get(key)).and_then(as_text)
}

fn list_at(parent: Option<&Value>, key: &str) -> Vec<String> {
    parent
        .and_then(|p| p.get(key))
        .map(as_list)
        .unwrap_or_default()
}

fn years_at(parent: Option<&Value>, key: &str) -> u32 {
    parent
        .and_then(|p| p.get(key))
        .and_then(as_number)
        .filter(|n| *n >= 0.0)
        .map(|n| n.floor().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

/// Non-empty trimmed string; numbers are rendered (e.g. a graduation year of 2018).
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Array of strings; a comma-separated string is split; non-text items are dropped.
fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

/// A JSON number, or a string whose leading token is numeric ("85", "5+", "85/100").
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let numeric: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            numeric.parse().ok()
        }
        _ => None,
    }
}
