//! Batch matching: many resumes against one job description, ranked best first.
//!
//! The job profile is extracted exactly once and shared by every comparison in the
//! batch. Resumes are processed sequentially in input order; a failure on one resume
//! becomes a zero-score entry and never aborts the others.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm_client::TextProvider;
use crate::matching::extractor::ExtractionChain;
use crate::matching::profiles::{BatchMatchEntry, JobProfile, MatchResult, ResumeProfile};
use crate::matching::scorer::{ScoringChain, ScoringInput};
use crate::matching::MatchError;

/// Hard cap on resumes per batch. Larger batches are rejected, not truncated.
pub const MAX_BATCH_SIZE: usize = 10;
pub const EXTRACTED_TEXT_PREVIEW_CHARS: usize = 1000;

pub struct BatchMatcher {
    extraction: ExtractionChain,
    scoring: ScoringChain,
}

impl BatchMatcher {
    /// Standard chains. With `use_ai == false` the provider is ignored and only the
    /// deterministic tiers run.
    pub fn new(provider: Option<Arc<dyn TextProvider>>, use_ai: bool) -> Self {
        let provider = provider.filter(|_| use_ai);
        Self {
            extraction: ExtractionChain::standard(provider.clone()),
            scoring: ScoringChain::standard(provider),
        }
    }

    pub fn with_chains(extraction: ExtractionChain, scoring: ScoringChain) -> Self {
        Self {
            extraction,
            scoring,
        }
    }

    /// Returns one entry per resume, sorted by score descending. Ties keep input order.
    pub async fn run(
        &self,
        resume_texts: &[String],
        filenames: &[String],
        job_text: &str,
        required_skills: Option<&[String]>,
    ) -> Result<Vec<BatchMatchEntry>, MatchError> {
        validate_batch(resume_texts, filenames)?;

        let job = match self.extraction.extract_job(job_text).await {
            Ok(job) => job,
            Err(e) => {
                warn!("Job description extraction failed, continuing with defaults: {e}");
                JobProfile::default()
            }
        };
        let required_skills = required_skills.unwrap_or(&[]);

        let mut entries = Vec::with_capacity(resume_texts.len());
        for (index, (text, filename)) in resume_texts.iter().zip(filenames).enumerate() {
            info!(
                "Processing resume {}/{}: {filename}",
                index + 1,
                resume_texts.len()
            );

            let entry = match self.match_one(text, &job, job_text, required_skills).await {
                Ok((profile, result)) => BatchMatchEntry {
                    filename: filename.clone(),
                    result,
                    extracted_text: preview_text(text),
                    resume_profile: Some(profile),
                    input_index: index,
                },
                Err(e) => {
                    warn!("Failed to process resume {filename}: {e}");
                    failed_entry(index, filename, text, &e)
                }
            };
            entries.push(entry);
        }

        rank_entries(&mut entries);
        Ok(entries)
    }

    async fn match_one(
        &self,
        text: &str,
        job: &JobProfile,
        job_text: &str,
        required_skills: &[String],
    ) -> Result<(ResumeProfile, MatchResult), MatchError> {
        let resume = self.extraction.extract_resume(text).await?;
        let input = ScoringInput {
            resume: &resume,
            job,
            resume_text: text,
            job_text,
            required_skills,
        };
        let result = self.scoring.score(&input).await?;
        Ok((resume, result))
    }
}

/// Matches up to `MAX_BATCH_SIZE` resumes against one job description.
///
/// `required_skills`, when non-empty, replaces the job profile's required skills in
/// keyword scoring.
pub async fn match_batch(
    resume_texts: &[String],
    filenames: &[String],
    job_text: &str,
    provider: Option<Arc<dyn TextProvider>>,
    use_ai: bool,
    required_skills: Option<&[String]>,
) -> Result<Vec<BatchMatchEntry>, MatchError> {
    BatchMatcher::new(provider, use_ai)
        .run(resume_texts, filenames, job_text, required_skills)
        .await
}

fn validate_batch(resume_texts: &[String], filenames: &[String]) -> Result<(), MatchError> {
    if resume_texts.len() != filenames.len() {
        return Err(MatchError::InputValidation(format!(
            "Got {} resumes but {} filenames",
            resume_texts.len(),
            filenames.len()
        )));
    }
    if resume_texts.len() > MAX_BATCH_SIZE {
        return Err(MatchError::InputValidation(format!(
            "Maximum {MAX_BATCH_SIZE} resumes allowed per batch, got {}",
            resume_texts.len()
        )));
    }
    Ok(())
}

fn preview_text(text: &str) -> String {
    text.chars().take(EXTRACTED_TEXT_PREVIEW_CHARS).collect()
}

fn failed_entry(index: usize, filename: &str, text: &str, error: &MatchError) -> BatchMatchEntry {
    BatchMatchEntry {
        filename: filename.to_string(),
        result: MatchResult {
            score: 0.0,
            matching_skills: vec![],
            missing_skills: vec![],
            strengths: vec![],
            weaknesses: vec![],
            remarks: format!("Error processing resume: {error}"),
        },
        extracted_text: preview_text(text),
        resume_profile: None,
        input_index: index,
    }
}

/// Score descending. `sort_by` is stable, so equal scores keep input order.
pub fn rank_entries(entries: &mut [BatchMatchEntry]) {
    entries.sort_by(|a, b| b.result.score.total_cmp(&a.result.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::matching::extractor::{ModelExtractor, PatternExtractor, ProfileExtractor};
    use crate::matching::scorer::{ModelScorer, ScoringStrategy};

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("resume_{i}.pdf")).collect()
    }

    #[tokio::test]
    async fn test_eleven_resumes_rejected() {
        let resumes = vec!["text".to_string(); 11];
        let result = match_batch(&resumes, &names(11), "job", None, false, None).await;
        assert!(matches!(result, Err(MatchError::InputValidation(_))));
    }

    #[tokio::test]
    async fn test_ten_resumes_accepted() {
        let resumes = vec!["text".to_string(); 10];
        let entries = match_batch(&resumes, &names(10), "job", None, false, None)
            .await
            .unwrap();
        assert_eq!(entries.len(), 10);
    }

    #[tokio::test]
    async fn test_mismatched_lengths_rejected() {
        let result = match_batch(&texts(&["a", "b"]), &names(1), "job", None, false, None).await;
        assert!(matches!(result, Err(MatchError::InputValidation(_))));
    }

    #[tokio::test]
    async fn test_sorted_descending_with_stable_ties() {
        let required = texts(&["Python", "AWS"]);
        let resumes = texts(&[
            "Python only",    // 35 + 15
            "Python and AWS", // 70 + 15
            "Python again",   // 35 + 15
            "nothing",        // 0 + 15
        ]);
        let filenames = texts(&["a.pdf", "b.pdf", "c.pdf", "d.pdf"]);

        let entries = match_batch(&resumes, &filenames, "job", None, false, Some(&required))
            .await
            .unwrap();

        let order: Vec<&str> = entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(order, vec!["b.pdf", "a.pdf", "c.pdf", "d.pdf"]);
        assert_eq!(entries[1].result.score, entries[2].result.score);

        let positions: Vec<usize> = entries.iter().map(|e| e.input_index).collect();
        assert_eq!(positions, vec![1, 0, 2, 3]);
    }

    #[tokio::test]
    async fn test_failing_provider_degrades_every_entry_to_keywords() {
        let provider: Arc<dyn TextProvider> = Arc::new(ScriptedProvider::failing());
        let required = texts(&["Rust"]);
        let resumes = texts(&["Rust dev", "Go dev", "Java dev"]);

        let entries = match_batch(&resumes, &names(3), "job", Some(provider), true, Some(&required))
            .await
            .unwrap();

        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert!(entry.result.remarks.starts_with("Basic matching"));
            assert!(entry.resume_profile.is_some());
        }
        assert_eq!(entries[0].filename, "resume_0.pdf");
    }

    #[tokio::test]
    async fn test_job_extracted_once_per_batch() {
        let provider = Arc::new(ScriptedProvider::failing());
        let resumes = texts(&["one", "two", "three"]);

        match_batch(&resumes, &names(3), "job", Some(provider.clone()), true, None)
            .await
            .unwrap();

        // 1 job extraction, then per resume: 1 extraction + 1 scoring
        assert_eq!(provider.calls().len(), 1 + 3 * 2);
    }

    #[tokio::test]
    async fn test_use_ai_false_never_calls_provider() {
        let provider = Arc::new(ScriptedProvider::failing());
        match_batch(&texts(&["x"]), &names(1), "job", Some(provider.clone()), false, None)
            .await
            .unwrap();
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_resume_becomes_zero_score_entry() {
        let provider: Arc<dyn TextProvider> = Arc::new(ScriptedProvider::failing());
        let extraction: Vec<Arc<dyn ProfileExtractor>> = vec![Arc::new(PatternExtractor)];
        let scoring: Vec<Arc<dyn ScoringStrategy>> = vec![Arc::new(ModelScorer::new(provider))];
        let matcher =
            BatchMatcher::with_chains(ExtractionChain::new(extraction), ScoringChain::new(scoring));

        let entries = matcher
            .run(&texts(&["resume body"]), &names(1), "job", None)
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result.score, 0.0);
        assert!(entries[0].result.remarks.starts_with("Error processing resume:"));
        assert!(entries[0].resume_profile.is_none());
        assert_eq!(entries[0].extracted_text, "resume body");
    }

    #[tokio::test]
    async fn test_job_extraction_failure_uses_default_profile() {
        let provider: Arc<dyn TextProvider> = Arc::new(ScriptedProvider::failing());
        let extraction: Vec<Arc<dyn ProfileExtractor>> =
            vec![Arc::new(ModelExtractor::new(provider))];
        let matcher =
            BatchMatcher::with_chains(ExtractionChain::new(extraction), ScoringChain::standard(None));

        let entries = matcher
            .run(&texts(&["resume"]), &names(1), "job", None)
            .await
            .unwrap();

        // job falls back to defaults; the resume itself cannot be extracted
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result.score, 0.0);
    }

    #[test]
    fn test_extracted_text_preview_is_bounded() {
        let long = "x".repeat(5000);
        assert_eq!(preview_text(&long).chars().count(), EXTRACTED_TEXT_PREVIEW_CHARS);
    }
}
