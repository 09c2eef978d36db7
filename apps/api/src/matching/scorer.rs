//! Match scoring: resume vs job description → bounded `MatchResult`.
//!
//! Same shape as extraction: an ordered chain of `ScoringStrategy` tiers.
//! `ModelScorer` asks the provider for a rubric-weighted judgment; `KeywordScorer`
//! is a pure-Rust overlap heuristic over the raw texts and cannot fail.
//!
//! Whatever tier produces the result, `score` is within [0, 100].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::llm_client::json::parse_json_object;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{GenerationOptions, Prompt, TextProvider};
use crate::matching::fallback;
use crate::matching::profiles::{clamp_score, JobProfile, MatchResult, ResumeProfile};
use crate::matching::prompts::MATCH_PROMPT_TEMPLATE;
use crate::matching::MatchError;

const SCORING_TEMPERATURE: f32 = 0.3;
/// Raw text sent alongside the profile summaries.
const RAW_TEXT_CHARS: usize = 1500;
const SUMMARY_SKILLS: usize = 10;
const SUMMARY_HISTORY: usize = 3;
const SUMMARY_NICE_TO_HAVE: usize = 5;
/// Matched/missing skills quoted in keyword remarks and strengths/weaknesses.
const KEYWORD_PREVIEW: usize = 3;

const EDUCATION_KEYWORDS: [&str; 7] = [
    "bachelor", "master", "phd", "degree", "b.tech", "m.tech", "mba",
];

/// Everything a scoring tier may look at for one resume/job pair.
pub struct ScoringInput<'a> {
    pub resume: &'a ResumeProfile,
    pub job: &'a JobProfile,
    pub resume_text: &'a str,
    pub job_text: &'a str,
    /// Skills the keyword tier checks for. Empty means "use the job profile's".
    pub required_skills: &'a [String],
}

impl ScoringInput<'_> {
    fn keyword_skills(&self) -> &[String] {
        if self.required_skills.is_empty() {
            &self.job.required_skills
        } else {
            self.required_skills
        }
    }
}

#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    fn label(&self) -> &'static str;

    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchResult, MatchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// ModelScorer
// ────────────────────────────────────────────────────────────────────────────

pub struct ModelScorer {
    provider: Arc<dyn TextProvider>,
}

impl ModelScorer {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ScoringStrategy for ModelScorer {
    fn label(&self) -> &'static str {
        "model"
    }

    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchResult, MatchError> {
        let prompt = MATCH_PROMPT_TEMPLATE
            .replace("{resume_summary}", &resume_summary(input.resume))
            .replace("{job_summary}", &job_summary(input.job))
            .replace("{resume_text}", &head(input.resume_text, RAW_TEXT_CHARS))
            .replace("{job_text}", &head(input.job_text, RAW_TEXT_CHARS));

        let raw = self
            .provider
            .generate(
                Prompt::with_system(JSON_ONLY_SYSTEM, prompt),
                GenerationOptions::with_temperature(SCORING_TEMPERATURE),
            )
            .await?;

        let root = parse_json_object(&raw)?;
        Ok(MatchResult::from_model_json(&root)?)
    }
}

fn head(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn preview(items: &[String], max: usize) -> String {
    items.iter().take(max).cloned().collect::<Vec<_>>().join(", ")
}

fn resume_summary(resume: &ResumeProfile) -> String {
    format!(
        "Name: {}\n\
         Experience: {} years\n\
         Technical Skills: {}\n\
         Soft Skills: {}\n\
         Education: {}\n\
         Previous Companies: {}\n\
         Roles: {}\n\
         Summary: {}",
        resume.name,
        resume.experience_years,
        preview(&resume.technical_skills, SUMMARY_SKILLS),
        preview(&resume.soft_skills, SUMMARY_HISTORY),
        resume.education,
        preview(&resume.companies, SUMMARY_HISTORY),
        preview(&resume.roles, SUMMARY_HISTORY),
        resume.summary,
    )
}

fn job_summary(job: &JobProfile) -> String {
    format!(
        "Title: {}\n\
         Required Experience: {} years\n\
         Required Skills: {}\n\
         Nice to Have: {}\n\
         Key Responsibilities: {}",
        job.job_title,
        job.experience_years,
        preview(&job.required_skills, SUMMARY_SKILLS),
        preview(&job.nice_to_have_skills, SUMMARY_NICE_TO_HAVE),
        preview(&job.responsibilities, SUMMARY_HISTORY),
    )
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordScorer
// ────────────────────────────────────────────────────────────────────────────

/// Substring overlap of required skills plus experience/education signals.
/// Deterministic, no network.
///
/// Points:
/// - skills: matched / required × 70, or a flat 50 with no required skills
/// - experience: 20 if resume years ≥ job years, 15 if ≥ 70% of them, else 10;
///   10 when either figure is missing
/// - education: 10 when a degree keyword appears in the resume, else 5
pub struct KeywordScorer;

#[async_trait]
impl ScoringStrategy for KeywordScorer {
    fn label(&self) -> &'static str {
        "keyword"
    }

    async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchResult, MatchError> {
        Ok(keyword_score(
            input.resume_text,
            input.job_text,
            input.keyword_skills(),
        ))
    }
}

/// Blank entries in `required_skills` are ignored; an empty string would match any resume.
pub fn keyword_score(resume_text: &str, job_text: &str, required_skills: &[String]) -> MatchResult {
    let resume_lower = resume_text.to_lowercase();
    let required_skills: Vec<&str> = required_skills
        .iter()
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .collect();

    let (matching, missing): (Vec<String>, Vec<String>) = required_skills
        .iter()
        .map(|skill| skill.to_string())
        .partition(|skill| resume_lower.contains(&skill.to_lowercase()));

    let skill_points = if required_skills.is_empty() {
        50.0
    } else {
        matching.len() as f64 / required_skills.len() as f64 * 70.0
    };

    let experience_points = match (
        fallback::experience_years(resume_text),
        fallback::experience_years(job_text),
    ) {
        (Some(have), Some(need)) if have >= need => 20.0,
        (Some(have), Some(need)) if f64::from(have) >= f64::from(need) * 0.7 => 15.0,
        _ => 10.0,
    };

    let education_points = if EDUCATION_KEYWORDS.iter().any(|k| resume_lower.contains(k)) {
        10.0
    } else {
        5.0
    };

    let total = clamp_score(skill_points + experience_points + education_points);

    let mut remarks = format!(
        "Basic matching: {} of {} required skills found.",
        matching.len(),
        required_skills.len()
    );
    if !matching.is_empty() {
        remarks.push_str(&format!(" Strong in: {}.", preview(&matching, KEYWORD_PREVIEW)));
    }
    if !missing.is_empty() {
        remarks.push_str(&format!(" Missing: {}.", preview(&missing, KEYWORD_PREVIEW)));
    }

    MatchResult {
        score: (total * 100.0).round() / 100.0,
        strengths: matching.iter().take(KEYWORD_PREVIEW).cloned().collect(),
        weaknesses: missing.iter().take(KEYWORD_PREVIEW).cloned().collect(),
        matching_skills: matching,
        missing_skills: missing,
        remarks,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Chain
// ────────────────────────────────────────────────────────────────────────────

pub struct ScoringChain {
    tiers: Vec<Arc<dyn ScoringStrategy>>,
}

impl ScoringChain {
    pub fn new(tiers: Vec<Arc<dyn ScoringStrategy>>) -> Self {
        Self { tiers }
    }

    /// Model tier when a provider is given, then keywords.
    pub fn standard(provider: Option<Arc<dyn TextProvider>>) -> Self {
        let mut tiers: Vec<Arc<dyn ScoringStrategy>> = Vec::with_capacity(2);
        if let Some(provider) = provider {
            tiers.push(Arc::new(ModelScorer::new(provider)));
        }
        tiers.push(Arc::new(KeywordScorer));
        Self { tiers }
    }

    pub async fn score(&self, input: &ScoringInput<'_>) -> Result<MatchResult, MatchError> {
        for tier in &self.tiers {
            match tier.score(input).await {
                Ok(mut result) => {
                    result.score = clamp_score(result.score);
                    debug!("Scored by {} tier: {:.2}", tier.label(), result.score);
                    return Ok(result);
                }
                Err(e) => warn!("Scoring via {} failed, falling back: {e}", tier.label()),
            }
        }
        Err(MatchError::Exhausted("scoring"))
    }
}

/// Scores one pair with the standard chain. Never fails.
pub async fn score(
    resume: &ResumeProfile,
    job: &JobProfile,
    resume_text: &str,
    job_text: &str,
    provider: Option<Arc<dyn TextProvider>>,
) -> MatchResult {
    let input = ScoringInput {
        resume,
        job,
        resume_text,
        job_text,
        required_skills: &[],
    };
    match ScoringChain::standard(provider).score(&input).await {
        Ok(result) => result,
        Err(_) => keyword_score(resume_text, job_text, &job.required_skills),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::llm_client::ProviderError;

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keyword_blank_skills_are_ignored() {
        let result = keyword_score(
            "Built services in python.",
            "",
            &skills(&["", "  ", "Python", " Kubernetes "]),
        );
        assert_eq!(result.matching_skills, skills(&["Python"]));
        assert_eq!(result.missing_skills, skills(&["Kubernetes"]));
        assert!(result.remarks.starts_with("Basic matching: 1 of 2 required skills found."));
    }

    #[test]
    fn test_keyword_partial_skill_overlap() {
        let result = keyword_score(
            "Built services in python on aws.",
            "Backend role.",
            &skills(&["Python", "AWS", "Kubernetes"]),
        );

        assert_eq!(result.matching_skills, vec!["Python", "AWS"]);
        assert_eq!(result.missing_skills, vec!["Kubernetes"]);
        // 46.67 skills + 10 unknown experience + 5 no degree keyword
        assert_eq!(result.score, 61.67);
        assert_eq!(
            result.remarks,
            "Basic matching: 2 of 3 required skills found. Strong in: Python, AWS. Missing: Kubernetes."
        );
        assert_eq!(result.strengths, vec!["Python", "AWS"]);
        assert_eq!(result.weaknesses, vec!["Kubernetes"]);
    }

    #[test]
    fn test_keyword_full_marks() {
        let result = keyword_score(
            "8 years of experience with Rust. Master of Science.",
            "Requires 5 years of experience.",
            &skills(&["Rust"]),
        );
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn test_keyword_experience_tiers() {
        let job = "Requires 10 years of experience.";
        let near = keyword_score("7 years of experience", job, &skills(&["Go"]));
        let far = keyword_score("2 years of experience", job, &skills(&["Go"]));
        // 0 skills + experience + 5 education
        assert_eq!(near.score, 20.0);
        assert_eq!(far.score, 15.0);
    }

    #[test]
    fn test_keyword_without_required_skills_is_flat_fifty() {
        let result = keyword_score("anything", "anything", &[]);
        assert_eq!(result.score, 65.0);
        assert_eq!(result.remarks, "Basic matching: 0 of 0 required skills found.");
        assert!(result.matching_skills.is_empty());
    }

    #[tokio::test]
    async fn test_model_score_is_clamped() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "```json\n{\"score\": 150, \"matching_skills\": [\"Python\"], \"remarks\": \"Great fit.\"}\n```"
                .to_string(),
        )]));

        let result = score(
            &ResumeProfile::default(),
            &JobProfile::default(),
            "resume",
            "job",
            Some(provider.clone()),
        )
        .await;

        assert_eq!(result.score, 100.0);
        assert_eq!(result.remarks, "Great fit.");
        let (_, options) = &provider.calls()[0];
        assert!((options.temperature - SCORING_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back_to_keywords() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Call(
            "503".to_string(),
        ))]));
        let job = JobProfile {
            required_skills: skills(&["Python", "SQL"]),
            ..JobProfile::default()
        };

        let result = score(
            &ResumeProfile::default(),
            &job,
            "Python developer",
            "job",
            Some(provider),
        )
        .await;

        assert!(result.remarks.starts_with("Basic matching: 1 of 2"));
    }

    #[tokio::test]
    async fn test_missing_score_falls_back_to_keywords() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "{\"remarks\": \"no number here\"}".to_string(),
        )]));
        let result = score(
            &ResumeProfile::default(),
            &JobProfile::default(),
            "resume",
            "job",
            Some(provider),
        )
        .await;
        assert!(result.remarks.starts_with("Basic matching"));
    }

    #[tokio::test]
    async fn test_explicit_required_skills_override_job_profile() {
        let job = JobProfile {
            required_skills: skills(&["Java"]),
            ..JobProfile::default()
        };
        let explicit = skills(&["Rust"]);
        let input = ScoringInput {
            resume: &ResumeProfile::default(),
            job: &job,
            resume_text: "Rust engineer",
            job_text: "",
            required_skills: &explicit,
        };

        let result = ScoringChain::standard(None).score(&input).await.unwrap();
        assert_eq!(result.matching_skills, vec!["Rust"]);
    }

    #[test]
    fn test_summary_caps_skill_preview() {
        let resume = ResumeProfile {
            technical_skills: (0..15).map(|i| format!("skill{i}")).collect(),
            ..ResumeProfile::default()
        };
        let summary = resume_summary(&resume);
        assert!(summary.contains("skill9"));
        assert!(!summary.contains("skill10"));
    }
}
