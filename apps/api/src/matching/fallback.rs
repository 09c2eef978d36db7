//! Deterministic pattern extraction. No network, no model, cannot fail.
//!
//! Used as the last extraction tier and by the keyword scorer for "N years" figures.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::profiles::{JobProfile, ResumeProfile};

/// Max skills kept from a heading-anchored skills line.
const MAX_PATTERN_SKILLS: usize = 10;
/// Fragments shorter than this are dropped, which also drops "Go" and "C".
const MIN_SKILL_CHARS: usize = 3;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern}: {e}"))
}

static EMAIL: Lazy<Regex> =
    Lazy::new(|| compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"));

static PHONE: Lazy<Regex> =
    Lazy::new(|| compile(r"[+]?[(]?[0-9]{3}[)]?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}"));

static SKILL_HEADINGS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)SKILLS[:.]?\s*([^\n]+)",
        r"(?i)TECHNICAL SKILLS[:.]?\s*([^\n]+)",
        r"(?i)CORE COMPETENCIES[:.]?\s*([^\n]+)",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static EXPERIENCE_YEARS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(\d+)\s*\+?\s*(?:years?|yrs?)\s*(?:of\s*)?(?:experience|exp)",
        r"(?i)experience[:.]?\s*(\d+)\s*\+?\s*(?:years?|yrs?)",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static EDUCATION: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:Bachelor|Master|PhD|B\.?Tech|M\.?Tech|B\.?Sc|M\.?Sc|MBA)[^\n]*",
        r"(?i)\b(?:BE|ME|MS|BS)\s+(?:in\s+)?[^\n]+",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static JOB_TITLE: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^([A-Z][^\n]{10,60})"));

static REQUIRED_SKILLS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:required|must have|essential)[\s:]?(?:skills?|qualifications?)[:.]?\s*([^\n]+)",
        r"(?i)requirements?[:.]?\s*([^\n]+)",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

static NICE_TO_HAVE_SKILLS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:nice to have|preferred|bonus)[\s:]?(?:skills?|qualifications?)[:.]?\s*([^\n]+)",
        r"(?i)preferred?[:.]?\s*([^\n]+)",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

/// First capture of the first pattern that matches, in pattern order.
fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Splits a skills line on `,` `;` `|`, dropping short fragments, capped at 10.
pub fn split_skill_line(line: &str) -> Vec<String> {
    line.split([',', ';', '|'])
        .map(str::trim)
        .filter(|s| s.chars().count() >= MIN_SKILL_CHARS)
        .take(MAX_PATTERN_SKILLS)
        .map(str::to_string)
        .collect()
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL.find(text).map(|m| m.as_str().to_string())
}

pub fn find_phone(text: &str) -> Option<String> {
    PHONE.find(text).map(|m| m.as_str().to_string())
}

pub fn find_skills(text: &str) -> Vec<String> {
    first_capture(&SKILL_HEADINGS, text)
        .map(split_skill_line)
        .unwrap_or_default()
}

/// "N years of experience" / "experience: N years". First match wins.
pub fn experience_years(text: &str) -> Option<u32> {
    first_capture(&EXPERIENCE_YEARS, text).and_then(|n| n.parse().ok())
}

pub fn find_education(text: &str) -> Option<String> {
    EDUCATION
        .iter()
        .find_map(|p| p.find(text))
        .map(|m| m.as_str().trim().to_string())
}

pub fn extract_resume(text: &str) -> ResumeProfile {
    let defaults = ResumeProfile::default();
    ResumeProfile {
        email: find_email(text).unwrap_or(defaults.email),
        phone: find_phone(text).unwrap_or(defaults.phone),
        technical_skills: find_skills(text),
        experience_years: experience_years(text).unwrap_or(0),
        education: find_education(text).unwrap_or(defaults.education),
        ..ResumeProfile::default()
    }
}

pub fn extract_job(text: &str) -> JobProfile {
    let defaults = JobProfile::default();
    JobProfile {
        job_title: JOB_TITLE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or(defaults.job_title),
        required_skills: first_capture(&REQUIRED_SKILLS, text)
            .map(split_skill_line)
            .unwrap_or_default(),
        nice_to_have_skills: first_capture(&NICE_TO_HAVE_SKILLS, text)
            .map(split_skill_line)
            .unwrap_or_default(),
        experience_years: experience_years(text).unwrap_or(0),
        ..JobProfile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::profiles::NOT_SPECIFIED;

    const RESUME: &str = "Jane Doe\n\
        jane.doe@example.com | (415) 555-0199\n\
        Senior engineer with 7 years of experience building data platforms.\n\
        TECHNICAL SKILLS: Python, AWS; Kubernetes | Go, SQL\n\
        EDUCATION\n\
        Master of Science in Computer Science, Stanford\n";

    #[test]
    fn test_extracts_contact_details() {
        assert_eq!(find_email(RESUME).as_deref(), Some("jane.doe@example.com"));
        assert_eq!(find_phone(RESUME).as_deref(), Some("(415) 555-0199"));
    }

    #[test]
    fn test_skills_split_and_short_entries_dropped() {
        assert_eq!(find_skills(RESUME), vec!["Python", "AWS", "Kubernetes", "SQL"]);
    }

    #[test]
    fn test_skills_capped_at_ten() {
        let text = "SKILLS: aaa, bbb, ccc, ddd, eee, fff, ggg, hhh, iii, jjj, kkk, lll";
        assert_eq!(find_skills(text).len(), 10);
    }

    #[test]
    fn test_skills_on_next_line_after_heading() {
        assert_eq!(find_skills("Skills:\nRust, Tokio"), vec!["Rust", "Tokio"]);
    }

    #[test]
    fn test_experience_years_patterns() {
        assert_eq!(experience_years("5+ years of experience in Java"), Some(5));
        assert_eq!(experience_years("Experience: 3 yrs"), Some(3));
        assert_eq!(experience_years("worked 3 years in Python"), None);
    }

    #[test]
    fn test_education_keywords() {
        assert_eq!(
            find_education(RESUME).as_deref(),
            Some("Master of Science in Computer Science, Stanford")
        );
        assert_eq!(
            find_education("BS in Mathematics").as_deref(),
            Some("BS in Mathematics")
        );
        assert!(find_education("Self-taught developer").is_none());
    }

    #[test]
    fn test_degree_abbreviations_ignore_case() {
        assert_eq!(
            find_education("Bs in Physics, MIT").as_deref(),
            Some("Bs in Physics, MIT")
        );
        assert_eq!(
            find_education("ms Computer Engineering").as_deref(),
            Some("ms Computer Engineering")
        );
    }

    #[test]
    fn test_empty_resume_yields_defaults() {
        assert_eq!(extract_resume(""), ResumeProfile::default());
    }

    #[test]
    fn test_resume_profile_from_patterns() {
        let profile = extract_resume(RESUME);
        assert_eq!(profile.email, "jane.doe@example.com");
        assert_eq!(profile.experience_years, 7);
        assert_eq!(profile.name, NOT_SPECIFIED);
        assert_eq!(profile.technical_skills.len(), 4);
    }

    #[test]
    fn test_job_profile_from_patterns() {
        let jd = "Senior Backend Engineer - Payments\n\
            We are hiring.\n\
            Required skills: Python, AWS, Kubernetes\n\
            Nice to have skills: Kafka, Terraform\n\
            5 years of experience with distributed systems.";

        let job = extract_job(jd);
        assert_eq!(job.job_title, "Senior Backend Engineer - Payments");
        assert_eq!(job.required_skills, vec!["Python", "AWS", "Kubernetes"]);
        assert_eq!(job.nice_to_have_skills, vec!["Kafka", "Terraform"]);
        assert_eq!(job.experience_years, 5);
        assert_eq!(job.company, NOT_SPECIFIED);
    }

    #[test]
    fn test_empty_job_yields_defaults() {
        assert_eq!(extract_job(""), JobProfile::default());
    }
}
