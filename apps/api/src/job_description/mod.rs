//! Job description intake and generation.
//!
//! Generation asks the provider for free text. Without a provider, or when the
//! call fails, a sectioned template is filled from the request.

pub mod handlers;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::llm_client::{GenerationOptions, Prompt, TextProvider};

use self::prompts::GENERATE_JOB_DESCRIPTION_PROMPT;

const GENERATION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::PartTime => "Part-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Internship => "Internship",
            EmploymentType::Temporary => "Temporary",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateJobDescriptionRequest {
    pub job_title: String,
    pub years_of_experience: u32,
    /// Comma-separated.
    pub must_have_skills: String,
    pub company_name: String,
    pub employment_type: EmploymentType,
    pub industry: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Model,
    Template,
}

pub struct GeneratedJobDescription {
    pub text: String,
    pub source: GenerationSource,
}

pub async fn generate_job_description(
    request: &GenerateJobDescriptionRequest,
    provider: Option<Arc<dyn TextProvider>>,
) -> GeneratedJobDescription {
    info!("Generating job description for {}", request.job_title);

    if let Some(provider) = provider {
        let prompt = GENERATE_JOB_DESCRIPTION_PROMPT
            .replace("{job_title}", &request.job_title)
            .replace("{years_of_experience}", &request.years_of_experience.to_string())
            .replace("{must_have_skills}", &request.must_have_skills)
            .replace("{company_name}", &request.company_name)
            .replace("{employment_type}", request.employment_type.as_str())
            .replace("{industry}", &request.industry)
            .replace("{location}", &request.location);

        match provider
            .generate(
                Prompt::from(prompt),
                GenerationOptions::with_temperature(GENERATION_TEMPERATURE),
            )
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                return GeneratedJobDescription {
                    text: text.trim().to_string(),
                    source: GenerationSource::Model,
                }
            }
            Ok(_) => warn!("{} returned an empty job description, using template", provider.name()),
            Err(e) => warn!("Job description generation via {} failed, using template: {e}", provider.name()),
        }
    }

    GeneratedJobDescription {
        text: template_job_description(request),
        source: GenerationSource::Template,
    }
}

fn template_job_description(request: &GenerateJobDescriptionRequest) -> String {
    let skills: Vec<&str> = request
        .must_have_skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let skill_lines = skills
        .iter()
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{title}\n\
         {company} | {location} | {employment}\n\n\
         Job Overview\n\
         {company} is looking for a {title} to join our {industry} team.\n\n\
         Key Responsibilities\n\
         - Design, build and maintain high-quality solutions as a {title}\n\
         - Collaborate with cross-functional teams to deliver on the roadmap\n\
         - Review work from peers and share knowledge across the team\n\
         - Take ownership of features from design through production\n\n\
         Required Skills and Qualifications\n\
         - {years}+ years of relevant professional experience\n\
         {skill_lines}\n\n\
         Work Environment\n\
         {employment} position based in {location}.\n\n\
         How to Apply\n\
         Send your resume to the {company} hiring team.",
        title = request.job_title,
        company = request.company_name,
        location = request.location,
        employment = request.employment_type.as_str(),
        industry = request.industry,
        years = request.years_of_experience,
        skill_lines = skill_lines,
    )
}
